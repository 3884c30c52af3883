pub use axum::http::header::{
    HeaderName, HeaderValue,
    // Common header constants
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN,
};
pub use axum::http::request::Parts;
pub use axum::http::{HeaderMap, Method, StatusCode};
