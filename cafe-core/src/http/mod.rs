pub mod header;

pub use axum::{body, extract, response, routing};
pub use axum::{serve, Json, Router};
pub use bytes::Bytes;
pub use self::extract::{FromRef, FromRequestParts, Path, Request, State};
pub use self::header::{
    HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
    // Common header constants
    AUTHORIZATION, CONTENT_TYPE,
};
pub use self::response::{IntoResponse, Response};
pub use self::body::Body;
