use cafe_core::http::response::{IntoResponse, Response};
use cafe_core::http::{Json, StatusCode};

/// The credential could not be structurally decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The token string is empty.
    Empty,
    /// The token does not have exactly three dot-separated segments.
    SegmentCount(usize),
    /// A segment is not valid unpadded base64url.
    Encoding(&'static str),
    /// A segment decoded to bytes that are not the expected JSON object.
    Json(&'static str, String),
    /// The header carries no `alg` field.
    MissingAlgorithm,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Empty => write!(f, "token is empty"),
            DecodeError::SegmentCount(n) => write!(f, "expected 3 segments, found {n}"),
            DecodeError::Encoding(segment) => write!(f, "{segment} is not valid base64url"),
            DecodeError::Json(segment, msg) => write!(f, "{segment} is not a JSON object: {msg}"),
            DecodeError::MissingAlgorithm => write!(f, "header has no 'alg'"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// A decoded credential failed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The signature does not match the selected key.
    InvalidSignature,
    /// No trusted key matches the token's key identifier.
    UntrustedKey(String),
    /// The header names an algorithm that is not on the allow-list.
    DisallowedAlgorithm(String),
    /// Issuer, audience, not-before, or a required registered claim is wrong.
    InvalidClaims(String),
    /// The `exp` claim is at or before the current time.
    Expired,
    /// A permission was required but the token carries no permission set.
    MissingPermissions,
    /// The permission set does not contain the required permission.
    InsufficientPermission(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidSignature => write!(f, "Invalid signature"),
            ValidationError::UntrustedKey(kid) => write!(f, "Untrusted signing key: {kid}"),
            ValidationError::DisallowedAlgorithm(alg) => write!(f, "Disallowed algorithm: {alg}"),
            ValidationError::InvalidClaims(msg) => write!(f, "Invalid claims: {msg}"),
            ValidationError::Expired => write!(f, "Token expired"),
            ValidationError::MissingPermissions => write!(f, "Permissions not included in token"),
            ValidationError::InsufficientPermission(p) => write!(f, "Permission not granted: {p}"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Authorization failure surfaced by the guard.
///
/// Every variant maps to a status, a stable machine code, and a client-facing
/// description; see [`AuthError::status`], [`AuthError::code`] and
/// [`AuthError::description`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable `Authorization: Bearer <token>` header.
    MissingCredential(&'static str),
    /// The token could not be decoded.
    Decode(DecodeError),
    /// The token was decoded but failed verification.
    Validation(ValidationError),
    /// The trusted key set could not be fetched.
    KeyRetrieval(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential(_) | AuthError::Decode(_) => StatusCode::UNAUTHORIZED,
            AuthError::Validation(
                ValidationError::MissingPermissions | ValidationError::InsufficientPermission(_),
            ) => StatusCode::FORBIDDEN,
            AuthError::Validation(_) => StatusCode::UNAUTHORIZED,
            AuthError::KeyRetrieval(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential(_) => "authorization_header_missing",
            AuthError::Decode(_) => "malformed_token",
            AuthError::Validation(v) => match v {
                ValidationError::InvalidSignature => "invalid_signature",
                ValidationError::UntrustedKey(_) => "untrusted_key",
                ValidationError::DisallowedAlgorithm(_) => "disallowed_algorithm",
                ValidationError::InvalidClaims(_) => "invalid_claims",
                ValidationError::Expired => "token_expired",
                ValidationError::MissingPermissions => "missing_permissions",
                ValidationError::InsufficientPermission(_) => "insufficient_permission",
            },
            AuthError::KeyRetrieval(_) => "key_retrieval_failed",
        }
    }

    /// Client-facing description. Internal detail (key ids, transport
    /// errors) stays in the `Display` output used for logs.
    pub fn description(&self) -> &'static str {
        match self {
            AuthError::MissingCredential(reason) => *reason,
            AuthError::Decode(_) => "Unable to parse authentication token.",
            AuthError::Validation(v) => match v {
                ValidationError::InvalidSignature => "Token signature is invalid.",
                ValidationError::UntrustedKey(_) => "Unable to find the appropriate key.",
                ValidationError::DisallowedAlgorithm(_) => "Token signing algorithm is not allowed.",
                ValidationError::InvalidClaims(_) => {
                    "Incorrect claims. Please, check the audience and issuer."
                }
                ValidationError::Expired => "Token expired.",
                ValidationError::MissingPermissions => "Permissions not included in JWT.",
                ValidationError::InsufficientPermission(_) => "Permission not found.",
            },
            AuthError::KeyRetrieval(_) => "Unable to retrieve signing keys.",
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredential(reason) => write!(f, "Missing credential: {reason}"),
            AuthError::Decode(e) => write!(f, "Malformed token: {e}"),
            AuthError::Validation(e) => write!(f, "{e}"),
            AuthError::KeyRetrieval(msg) => write!(f, "Key retrieval failed: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Decode(e) => Some(e),
            AuthError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for AuthError {
    fn from(err: DecodeError) -> Self {
        AuthError::Decode(err)
    }
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        AuthError::Validation(err)
    }
}

fn error_body(err: &AuthError) -> serde_json::Value {
    let status = err.status();
    serde_json::json!({
        "success": false,
        "error": status.as_u16(),
        "code": err.code(),
        "message": err.description(),
    })
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status(), Json(error_body(&self))).into_response()
    }
}

