/// Errors that can occur in the data layer.
#[derive(Debug)]
pub enum DataError {
    NotFound(String),
    /// A uniqueness constraint was violated.
    Conflict(String),
    Database(Box<dyn std::error::Error + Send + Sync>),
    Other(String),
}

impl DataError {
    /// Wrap a driver error.
    pub fn database(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        DataError::Database(Box::new(err))
    }
}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::NotFound(msg) => write!(f, "Not found: {msg}"),
            DataError::Conflict(msg) => write!(f, "Conflict: {msg}"),
            DataError::Database(err) => write!(f, "Database error: {err}"),
            DataError::Other(msg) => write!(f, "Data error: {msg}"),
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Database(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<DataError> for cafe_core::HttpError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::NotFound(msg) => cafe_core::HttpError::NotFound(msg),
            DataError::Conflict(msg) => cafe_core::HttpError::Conflict(msg),
            DataError::Database(e) => cafe_core::HttpError::Internal(e.to_string()),
            DataError::Other(msg) => cafe_core::HttpError::Internal(msg),
        }
    }
}

/// Extension trait for converting `sqlx::Error` into `DataError`.
///
/// `From<sqlx::Error>` is not implemented so that call sites pick the mapping
/// explicitly with `.into_data_error()`.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match &self {
            sqlx::Error::RowNotFound => DataError::NotFound("Row not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DataError::Conflict(db.message().to_string())
            }
            _ => DataError::database(self),
        }
    }
}

pub type DataResult<T> = Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_core::http::StatusCode;
    use cafe_core::HttpError;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err = sqlx::Error::RowNotFound.into_data_error();
        assert!(matches!(err, DataError::NotFound(_)));
    }

    #[test]
    fn http_mapping() {
        assert_eq!(
            HttpError::from(DataError::Conflict("dup".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            HttpError::from(DataError::Other("bad row".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
