mod app;
mod jwks;
mod jwt;

pub use app::{PathToken, TestApp, TestRequest, TestResponse, resolve_path, tokenize_path};
pub use jwks::JwksServer;
pub use jwt::{TestJwt, TokenBuilder, RSA_KID};
