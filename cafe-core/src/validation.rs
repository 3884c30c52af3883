use serde::Serialize;

use crate::error::HttpError;

/// A field-level validation error.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: String,
}

/// Container for validation errors, used as the payload of `HttpError::Validation`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorResponse {
    pub errors: Vec<FieldError>,
}

/// Run `garde` validation on a request body, converting a failed report into
/// `HttpError::Validation`.
pub fn validate_body<T>(value: &T) -> Result<(), HttpError>
where
    T: garde::Validate,
    T::Context: Default,
{
    value
        .validate()
        .map_err(|report| HttpError::Validation(convert_garde_report(&report)))
}

fn convert_garde_report(report: &garde::Report) -> ValidationErrorResponse {
    let mut errors = Vec::new();

    for (path, error) in report.iter() {
        let field = {
            let s = path.to_string();
            if s.is_empty() { "value".to_string() } else { s }
        };
        errors.push(FieldError {
            field,
            message: error.message().to_string(),
            code: "validation".to_string(),
        });
    }

    ValidationErrorResponse { errors }
}

// Re-export garde::Validate for convenience.
pub use garde::Validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(garde::Validate)]
    struct Named {
        #[garde(length(min = 1))]
        name: String,
    }

    #[test]
    fn valid_body_passes() {
        assert!(validate_body(&Named { name: "mocha".into() }).is_ok());
    }

    #[test]
    fn invalid_body_reports_field() {
        let err = validate_body(&Named { name: String::new() }).unwrap_err();
        match err {
            HttpError::Validation(resp) => {
                assert_eq!(resp.errors.len(), 1);
                assert_eq!(resp.errors[0].field, "name");
            }
            other => panic!("expected Validation, got {other}"),
        }
    }
}
