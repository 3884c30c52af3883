//! Health reporting for the `/health` endpoint.
//!
//! The endpoint answers 200 with `{"status": "UP"}` when every check passes
//! and 503 with the failing checks otherwise.

use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::http::{Json, StatusCode};

/// Result of a single health check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Aggregated health report.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub checks: Vec<HealthCheck>,
}

impl HealthReport {
    pub fn new() -> Self {
        Self {
            status: HealthStatus::Up,
            checks: Vec::new(),
        }
    }

    /// Record the outcome of a named check. Any failure marks the report down.
    pub fn check(mut self, name: &str, outcome: Result<(), String>) -> Self {
        let (status, reason) = match outcome {
            Ok(()) => (HealthStatus::Up, None),
            Err(reason) => {
                self.status = HealthStatus::Down;
                (HealthStatus::Down, Some(reason))
            }
        };
        self.checks.push(HealthCheck {
            name: name.to_string(),
            status,
            reason,
        });
        self
    }
}

impl Default for HealthReport {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        let status = match self.status {
            HealthStatus::Up => StatusCode::OK,
            HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_check_marks_report_down() {
        let report = HealthReport::new()
            .check("db", Ok(()))
            .check("jwks", Err("unreachable".into()));
        assert_eq!(report.status, HealthStatus::Down);
        assert_eq!(report.checks[1].reason.as_deref(), Some("unreachable"));
    }

    #[test]
    fn down_report_is_503() {
        let resp = HealthReport::new().check("db", Err("x".into())).into_response();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
