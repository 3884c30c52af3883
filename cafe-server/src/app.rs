use std::sync::Arc;

use cafe_core::config::{CafeConfig, ConfigError};
use cafe_core::http::routing::{get, patch};
use cafe_core::http::Router;
use cafe_core::{catch_panic_layer, default_cors, default_trace};
use cafe_data::{DataError, DrinkRepository};
use cafe_security::{
    Algorithm, AuthError, AuthGuard, ClaimValidator, DecodingKey, JwksCache, SecurityConfig,
};
use tracing::{info, warn};

use crate::routes;
use crate::state::AppState;

/// Startup failure.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Data(DataError),
    Auth(AuthError),
    Io(std::io::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "configuration: {e}"),
            AppError::Data(e) => write!(f, "database: {e}"),
            AppError::Auth(e) => write!(f, "security: {e}"),
            AppError::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Data(e) => Some(e),
            AppError::Auth(e) => Some(e),
            AppError::Io(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<DataError> for AppError {
    fn from(err: DataError) -> Self {
        AppError::Data(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

/// Open the database and build the authorization guard from configuration.
///
/// With `database.reset: true` the drinks table is dropped, recreated and
/// seeded; otherwise the schema is created if missing.
pub async fn build_state(config: &CafeConfig) -> Result<AppState, AppError> {
    let url: String = config.get_or("database.url", "sqlite::memory:".to_string())?;
    let pool = cafe_data::connect(&url).await?;
    if config.get_or("database.reset", false)? {
        cafe_data::reset_and_seed(&pool).await?;
    } else {
        cafe_data::migrate(&pool).await?;
    }

    let guard = build_guard(config).await?;
    Ok(AppState::new(DrinkRepository::new(pool), guard))
}

/// Build the guard from `security.*`.
///
/// A `security.secret` selects a static HS256 key for local runs. Otherwise
/// keys come from `security.jwks.url`; the key set is prefetched, and a
/// failed prefetch is retried on the first request.
pub async fn build_guard(config: &CafeConfig) -> Result<AuthGuard, AppError> {
    let mut security = SecurityConfig::from_config(config)?;

    let secret: Option<String> = config.get_or("security.secret", None)?;
    let validator = match secret {
        Some(secret) => {
            if !config.contains_key("security.algorithms") {
                security = security.with_allowed_algorithm(Algorithm::HS256);
            }
            warn!("Using a static token secret; do not use in production");
            ClaimValidator::with_static_key(DecodingKey::from_secret(secret.as_bytes()), security)
        }
        None => {
            if security.jwks_url.is_empty() {
                return Err(ConfigError::NotFound("security.jwks.url".into()).into());
            }
            let cache = JwksCache::empty(security.clone())?;
            if let Err(err) = cache.refresh().await {
                warn!(error = %err, "Initial JWKS fetch failed");
            }
            ClaimValidator::new(Arc::new(cache), security)
        }
    };

    info!(
        issuer = %validator.config().issuer,
        audience = %validator.config().audience,
        "Authorization configured"
    );
    Ok(AuthGuard::new(Arc::new(validator)))
}

/// Assemble the HTTP application.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/drinks", get(routes::list_drinks).post(routes::create_drink))
        .route("/drinks-detail", get(routes::list_drinks_detail))
        .route(
            "/drinks/{id}",
            patch(routes::update_drink).delete(routes::delete_drink),
        )
        .fallback(cafe_core::error::not_found)
        .method_not_allowed_fallback(cafe_core::error::method_not_allowed)
        .with_state(state)
        .layer(catch_panic_layer())
        .layer(default_trace())
        .layer(default_cors())
}
