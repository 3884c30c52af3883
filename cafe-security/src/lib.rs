pub mod claims;
pub mod config;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod guard;
pub mod jwks;
pub mod validator;

pub use claims::ClaimSet;
pub use config::SecurityConfig;
pub use decoder::{decode, DecodedToken, TokenHeader};
pub use error::{AuthError, DecodeError, ValidationError};
pub use extractor::{extract_bearer_token, Authorized, Permission};
pub use guard::{AuthGuard, Guarded, PermissionGuard};
pub use jwks::{JwksCache, TrustedKey};
pub use validator::ClaimValidator;

// Re-exported so callers can build keys and allow-lists without a direct dependency.
pub use jsonwebtoken::{Algorithm, DecodingKey};

pub mod prelude {
    //! Re-exports of the most commonly used security types.
    pub use crate::{AuthGuard, Authorized, ClaimSet, Permission, SecurityConfig};
}
