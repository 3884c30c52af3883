use std::str::FromStr;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{get_current_timestamp, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::claims::ClaimSet;
use crate::config::SecurityConfig;
use crate::decoder::{self, DecodedToken};
use crate::error::{AuthError, ValidationError};
use crate::jwks::{JwksCache, TrustedKey};

/// Source of verification keys: either a JWKS cache or a static key.
enum KeySource {
    Jwks(Arc<JwksCache>),
    Static(DecodingKey),
}

/// Verifies decoded credentials and produces a [`ClaimSet`].
///
/// Checks run in this order, and the first failure is returned:
/// 1. algorithm allow-list
/// 2. key selection (JWKS by `kid`, or the static key)
/// 3. signature
/// 4. issuer, audience, not-before, required registered claims
/// 5. expiry, with `exp <= now` treated as expired
/// 6. the required permission, if any
pub struct ClaimValidator {
    key_source: KeySource,
    config: SecurityConfig,
}

impl ClaimValidator {
    /// Create a validator backed by a JWKS cache.
    pub fn new(jwks: Arc<JwksCache>, config: SecurityConfig) -> Self {
        Self {
            key_source: KeySource::Jwks(jwks),
            config,
        }
    }

    /// Create a validator with a single static key (shared secret or PEM).
    pub fn with_static_key(key: DecodingKey, config: SecurityConfig) -> Self {
        Self {
            key_source: KeySource::Static(key),
            config,
        }
    }

    pub fn config(&self) -> &SecurityConfig {
        &self.config
    }

    /// Decode and validate a raw bearer credential.
    pub async fn validate_token(
        &self,
        token: &str,
        required_permission: Option<&str>,
    ) -> Result<ClaimSet, AuthError> {
        let decoded = decoder::decode(token)?;
        self.validate(&decoded, required_permission).await
    }

    /// Validate a decoded credential, optionally requiring a permission.
    pub async fn validate(
        &self,
        token: &DecodedToken,
        required_permission: Option<&str>,
    ) -> Result<ClaimSet, AuthError> {
        debug!(alg = token.algorithm(), kid = ?token.key_id(), "Validating token");

        let algorithm = self.allowed_algorithm(token.algorithm())?;
        let key = self.select_key(token, algorithm).await?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = self.config.leeway_secs;
        validation.validate_exp = false;
        validation.validate_nbf = true;
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let data = jsonwebtoken::decode::<Map<String, Value>>(token.raw(), &key, &validation)
            .map_err(|e| {
                let err = map_jwt_error(e.kind(), token.key_id());
                warn!(error = %err, "Token verification failed");
                err
            })?;

        check_expiry(&data.claims, get_current_timestamp(), self.config.leeway_secs)?;

        let claims = ClaimSet::new(data.claims, &self.config.permissions_claim);
        if let Some(permission) = required_permission {
            check_permission(&claims, permission)?;
        }

        debug!(sub = claims.subject().unwrap_or("unknown"), "Token validated");
        Ok(claims)
    }

    fn allowed_algorithm(&self, name: &str) -> Result<Algorithm, ValidationError> {
        match Algorithm::from_str(name) {
            Ok(alg) if self.config.allowed_algorithms.contains(&alg) => Ok(alg),
            _ => {
                warn!(alg = name, "Rejected token algorithm");
                Err(ValidationError::DisallowedAlgorithm(name.to_string()))
            }
        }
    }

    async fn select_key(
        &self,
        token: &DecodedToken,
        algorithm: Algorithm,
    ) -> Result<DecodingKey, AuthError> {
        match &self.key_source {
            KeySource::Static(key) => Ok(key.clone()),
            KeySource::Jwks(jwks) => {
                let kid = token
                    .key_id()
                    .ok_or_else(|| ValidationError::UntrustedKey("<none>".into()))?;
                let TrustedKey {
                    key,
                    algorithm: pinned,
                } = jwks.get(kid).await?;
                match pinned {
                    Some(pinned) if pinned != algorithm => {
                        warn!(kid, ?pinned, ?algorithm, "Key is pinned to another algorithm");
                        Err(ValidationError::UntrustedKey(kid.to_string()).into())
                    }
                    _ => Ok(key),
                }
            }
        }
    }
}

fn map_jwt_error(kind: &ErrorKind, kid: Option<&str>) -> ValidationError {
    match kind {
        ErrorKind::InvalidSignature => ValidationError::InvalidSignature,
        ErrorKind::InvalidAlgorithm => ValidationError::DisallowedAlgorithm("key family mismatch".into()),
        ErrorKind::ExpiredSignature => ValidationError::Expired,
        ErrorKind::InvalidIssuer => ValidationError::InvalidClaims("issuer".into()),
        ErrorKind::InvalidAudience => ValidationError::InvalidClaims("audience".into()),
        ErrorKind::ImmatureSignature => ValidationError::InvalidClaims("token not yet valid".into()),
        ErrorKind::MissingRequiredClaim(claim) => {
            ValidationError::InvalidClaims(format!("missing '{claim}'"))
        }
        ErrorKind::InvalidKeyFormat => {
            ValidationError::UntrustedKey(kid.unwrap_or("<static>").to_string())
        }
        other => ValidationError::InvalidClaims(format!("{other:?}")),
    }
}

/// `exp` must be numeric. A token is expired once `exp + leeway <= now`.
fn check_expiry(claims: &Map<String, Value>, now: u64, leeway: u64) -> Result<(), ValidationError> {
    let exp = match claims.get("exp") {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .ok_or_else(|| ValidationError::InvalidClaims("'exp' is negative".into()))?,
        Some(_) => return Err(ValidationError::InvalidClaims("'exp' is not a number".into())),
        None => return Err(ValidationError::InvalidClaims("missing 'exp'".into())),
    };
    if is_expired(exp, now, leeway) {
        return Err(ValidationError::Expired);
    }
    Ok(())
}

fn is_expired(exp: u64, now: u64, leeway: u64) -> bool {
    exp.saturating_add(leeway) <= now
}

fn check_permission(claims: &ClaimSet, permission: &str) -> Result<(), ValidationError> {
    match claims.permissions() {
        None => Err(ValidationError::MissingPermissions),
        Some(set) if set.contains(permission) => Ok(()),
        Some(_) => {
            debug!(permission, "Permission not granted");
            Err(ValidationError::InsufficientPermission(permission.to_string()))
        }
    }
}
