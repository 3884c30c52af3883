use std::str::FromStr;
use std::time::Duration;

use cafe_core::config::{CafeConfig, ConfigError};
use jsonwebtoken::Algorithm;

/// Security configuration for token validation and the JWKS cache.
#[derive(Clone, Debug)]
pub struct SecurityConfig {
    /// URL of the JWKS endpoint (e.g., https://tenant.auth0.com/.well-known/jwks.json)
    pub jwks_url: String,

    /// Expected issuer in the "iss" claim
    pub issuer: String,

    /// Expected audience in the "aud" claim
    pub audience: String,

    /// JWKS cache TTL in seconds (default: 3600)
    pub jwks_cache_ttl_secs: u64,

    /// Minimum interval between JWKS refresh attempts in seconds (default: 10)
    pub jwks_min_refresh_interval_secs: u64,

    /// Timeout for a single JWKS fetch (default: 5s)
    pub jwks_fetch_timeout: Duration,

    /// Allowed JWT algorithms. Tokens using other algorithms are rejected.
    /// Default: RS256 only.
    pub allowed_algorithms: Vec<Algorithm>,

    /// Claim holding the permission array (default: "permissions")
    pub permissions_claim: String,

    /// Clock skew tolerance in seconds for `exp` and `nbf` (default: 0)
    pub leeway_secs: u64,
}

impl SecurityConfig {
    /// Create a new SecurityConfig with the given parameters and defaults for the rest.
    pub fn new(jwks_url: impl Into<String>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            jwks_cache_ttl_secs: 3600,
            jwks_min_refresh_interval_secs: 10,
            jwks_fetch_timeout: Duration::from_secs(5),
            allowed_algorithms: vec![Algorithm::RS256],
            permissions_claim: "permissions".to_string(),
            leeway_secs: 0,
        }
    }

    /// Read the `security.*` section of the application config.
    ///
    /// `security.issuer` and `security.audience` are required. `security.jwks.url`
    /// may be omitted when a static `security.secret` is used instead.
    pub fn from_config(config: &CafeConfig) -> Result<Self, ConfigError> {
        let issuer: String = config.get("security.issuer")?;
        let audience: String = config.get("security.audience")?;
        let jwks_url: String = config.get_or("security.jwks.url", String::new())?;

        let names: Vec<String> = config.get_or("security.algorithms", vec!["RS256".to_string()])?;
        let algorithms = names
            .iter()
            .map(|name| {
                Algorithm::from_str(name).map_err(|_| ConfigError::Invalid {
                    key: "security.algorithms".into(),
                    message: format!("unknown algorithm '{name}'"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(jwks_url, issuer, audience)
            .with_allowed_algorithms(algorithms)
            .with_cache_ttl(config.get_or("security.jwks.ttl", 3600)?)
            .with_min_refresh_interval(config.get_or("security.jwks.interval", 10)?)
            .with_fetch_timeout(Duration::from_millis(config.get_or("security.jwks.timeout", 5000)?))
            .with_permissions_claim(config.get_or("security.permissions", "permissions".to_string())?)
            .with_leeway(config.get_or("security.leeway", 0)?))
    }

    /// Set the JWKS cache TTL in seconds.
    pub fn with_cache_ttl(mut self, ttl_secs: u64) -> Self {
        self.jwks_cache_ttl_secs = ttl_secs;
        self
    }

    /// Set the minimum interval between JWKS refresh attempts.
    pub fn with_min_refresh_interval(mut self, interval_secs: u64) -> Self {
        self.jwks_min_refresh_interval_secs = interval_secs;
        self
    }

    /// Set the timeout applied to each JWKS fetch.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.jwks_fetch_timeout = timeout;
        self
    }

    /// Set the allowed JWT algorithms. Empty lists will cause validation to fail.
    pub fn with_allowed_algorithms(
        mut self,
        algorithms: impl IntoIterator<Item = Algorithm>,
    ) -> Self {
        self.allowed_algorithms = algorithms.into_iter().collect();
        self
    }

    /// Convenience method to allow a single algorithm.
    pub fn with_allowed_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.allowed_algorithms = vec![algorithm];
        self
    }

    pub fn with_permissions_claim(mut self, claim: impl Into<String>) -> Self {
        self.permissions_claim = claim.into();
        self
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }
}
