pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod layers;
pub mod validation;

pub use config::{CafeConfig, ConfigError, ConfigValue, FromConfigValue};
pub use error::{error_response, HttpError};
pub use health::{HealthReport, HealthStatus};
pub use layers::{catch_panic_layer, default_cors, default_trace, init_tracing};
pub use validation::{validate_body, FieldError, ValidationErrorResponse};
