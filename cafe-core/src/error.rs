use crate::http::response::{IntoResponse, Response};
use crate::http::{Json, StatusCode};

/// Helper to create a JSON error response with the standard
/// `{ "success": false, "error": <status>, "message": <message> }` body.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({
        "success": false,
        "error": status.as_u16(),
        "message": message.into(),
    });
    (status, Json(body)).into_response()
}

/// Errors raised by request handlers, rendered by [`IntoResponse`] into the
/// standard error body.
pub enum HttpError {
    BadRequest(String),
    NotFound(String),
    MethodNotAllowed(String),
    Conflict(String),
    /// The detail is logged, never sent to the client.
    Internal(String),
    Validation(crate::validation::ValidationErrorResponse),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::BadRequest(_) | HttpError::Validation(_) => StatusCode::BAD_REQUEST,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            HttpError::Conflict(_) => StatusCode::CONFLICT,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            HttpError::Validation(resp) => {
                let body = serde_json::json!({
                    "success": false,
                    "error": status.as_u16(),
                    "message": "Validation failed",
                    "details": resp.errors,
                });
                (status, Json(body)).into_response()
            }
            HttpError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal server error");
                error_response(status, "Internal Server Error")
            }
            HttpError::BadRequest(msg)
            | HttpError::NotFound(msg)
            | HttpError::MethodNotAllowed(msg)
            | HttpError::Conflict(msg) => error_response(status, msg),
        }
    }
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            HttpError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            HttpError::MethodNotAllowed(msg) => write!(f, "Method Not Allowed: {msg}"),
            HttpError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            HttpError::Internal(msg) => write!(f, "Internal Error: {msg}"),
            HttpError::Validation(resp) => write!(f, "Validation Error: {} errors", resp.errors.len()),
        }
    }
}

impl std::fmt::Debug for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        <Self as std::fmt::Display>::fmt(self, f)
    }
}

impl std::error::Error for HttpError {}

impl From<std::io::Error> for HttpError {
    fn from(err: std::io::Error) -> Self {
        HttpError::Internal(err.to_string())
    }
}

/// Fallback for unmatched routes.
pub async fn not_found() -> HttpError {
    HttpError::NotFound("Resource Not Found".into())
}

/// Fallback for a matched route called with an unsupported method.
pub async fn method_not_allowed() -> HttpError {
    HttpError::MethodNotAllowed("Method Not Allowed".into())
}
