use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::SecurityConfig;
use crate::error::{AuthError, ValidationError};

/// Raw JWK structure as returned by a JWKS endpoint.
/// Only the fields needed to build a verification key are captured.
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    #[serde(default)]
    alg: Option<String>,
    #[serde(default, rename = "use")]
    key_use: Option<String>,
    // RSA
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
    // EC
    #[serde(default)]
    x: Option<String>,
    #[serde(default)]
    y: Option<String>,
}

/// JWKS response envelope.
#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<Jwk>,
}

/// A verification key from the trusted key set.
#[derive(Clone)]
pub struct TrustedKey {
    pub key: DecodingKey,
    /// Algorithm pinned by the JWK's `alg` member, if it has one.
    pub algorithm: Option<Algorithm>,
}

impl Jwk {
    fn to_trusted_key(&self) -> Result<TrustedKey, String> {
        fn component<'a>(
            value: &'a Option<String>,
            kty: &str,
            name: &str,
        ) -> Result<&'a str, String> {
            value
                .as_deref()
                .ok_or_else(|| format!("{kty} key missing '{name}' component"))
        }

        let kty = self.kty.as_str();
        let key = match kty {
            "RSA" => DecodingKey::from_rsa_components(
                component(&self.n, kty, "n")?,
                component(&self.e, kty, "e")?,
            )
            .map_err(|err| format!("invalid RSA components: {err}"))?,
            "EC" => DecodingKey::from_ec_components(
                component(&self.x, kty, "x")?,
                component(&self.y, kty, "y")?,
            )
            .map_err(|err| format!("invalid EC components: {err}"))?,
            other => return Err(format!("unsupported key type: {other}")),
        };
        let algorithm = match self.alg.as_deref() {
            Some(name) => Some(
                Algorithm::from_str(name).map_err(|_| format!("unknown algorithm: {name}"))?,
            ),
            None => None,
        };
        Ok(TrustedKey { key, algorithm })
    }
}

/// Cached state behind the lock.
struct CacheInner {
    keys: HashMap<String, TrustedKey>,
    last_refresh: Option<Instant>,
    last_refresh_attempt: Option<Instant>,
    /// Reason the most recent fetch failed; cleared by a successful fetch.
    last_error: Option<String>,
}

/// JWKS cache that stores public keys fetched from a JWKS endpoint.
///
/// Keys are indexed by `kid` (Key ID). When a requested `kid` is not found,
/// the cache refreshes from the JWKS endpoint before failing. Concurrent
/// misses queue on one refresh lock, so a single fetch serves all of them.
/// Misses arriving within the minimum refresh interval of the previous
/// attempt do not refetch; while the last fetch failed they report
/// `KeyRetrieval` rather than an untrusted key.
pub struct JwksCache {
    inner: Arc<RwLock<CacheInner>>,
    config: SecurityConfig,
    client: reqwest::Client,
    refresh_lock: Mutex<()>,
}

impl JwksCache {
    /// Create a JWKS cache and perform an initial fetch of keys.
    pub async fn new(config: SecurityConfig) -> Result<Self, AuthError> {
        let cache = Self::empty(config)?;
        cache.refresh().await?;
        Ok(cache)
    }

    /// Create a JWKS cache without fetching; the first lookup fills it.
    pub fn empty(config: SecurityConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(config.jwks_fetch_timeout)
            .build()
            .map_err(|e| AuthError::KeyRetrieval(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            inner: Arc::new(RwLock::new(CacheInner {
                keys: HashMap::new(),
                last_refresh: None,
                last_refresh_attempt: None,
                last_error: None,
            })),
            config,
            client,
            refresh_lock: Mutex::new(()),
        })
    }

    /// Retrieve the verification key for the given `kid`.
    ///
    /// A missing `kid` forces a refresh (subject to the minimum interval). A
    /// present but stale entry triggers a refresh too; if that refresh fails the
    /// cached key is still served.
    pub async fn get(&self, kid: &str) -> Result<TrustedKey, AuthError> {
        let ttl = Duration::from_secs(self.config.jwks_cache_ttl_secs);

        let cached = {
            let cache = self.inner.read().await;
            match cache.keys.get(kid) {
                Some(key) if !is_stale(cache.last_refresh, ttl) => return Ok(key.clone()),
                Some(key) => Some(key.clone()),
                None => None,
            }
        };

        match cached {
            Some(key) => {
                if let Err(err) = self.refresh_stale().await {
                    warn!(error = %err, kid, "JWKS refresh failed, serving cached key");
                }
                Ok(self.lookup(kid).await.unwrap_or(key))
            }
            None => self.refresh_for_miss(kid).await,
        }
    }

    /// Fetch the key set from the remote endpoint and replace the cached keys.
    ///
    /// A failure leaves the cached keys in place and is remembered until the
    /// next successful fetch.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        match self.fetch_keys().await {
            Ok(keys) => {
                info!(url = %self.config.jwks_url, keys = keys.len(), "JWKS refreshed");
                let now = Instant::now();
                let mut cache = self.inner.write().await;
                cache.keys = keys;
                cache.last_refresh = Some(now);
                cache.last_refresh_attempt = Some(now);
                cache.last_error = None;
                Ok(())
            }
            Err(err) => {
                let reason = match &err {
                    AuthError::KeyRetrieval(reason) => reason.clone(),
                    other => other.to_string(),
                };
                self.inner.write().await.last_error = Some(reason);
                Err(err)
            }
        }
    }

    async fn fetch_keys(&self) -> Result<HashMap<String, TrustedKey>, AuthError> {
        let response = self
            .client
            .get(&self.config.jwks_url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthError::KeyRetrieval(format!(
                        "timed out after {:?}",
                        self.config.jwks_fetch_timeout
                    ))
                } else {
                    AuthError::KeyRetrieval(e.to_string())
                }
            })?
            .error_for_status()
            .map_err(|e| AuthError::KeyRetrieval(e.to_string()))?;

        let jwks: JwksResponse = response
            .json()
            .await
            .map_err(|e| AuthError::KeyRetrieval(format!("failed to parse JWKS: {e}")))?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            let Some(kid) = jwk.kid.clone() else {
                debug!(kty = %jwk.kty, "Skipping JWK without 'kid'");
                continue;
            };
            if jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
                debug!(kid = %kid, "Skipping non-signing JWK");
                continue;
            }
            match jwk.to_trusted_key() {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(reason) => warn!(kid = %kid, %reason, "Skipping unusable JWK"),
            }
        }

        Ok(keys)
    }

    /// Number of keys currently cached.
    pub async fn len(&self) -> usize {
        self.inner.read().await.keys.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn lookup(&self, kid: &str) -> Option<TrustedKey> {
        self.inner.read().await.keys.get(kid).cloned()
    }

    /// Resolve a `kid` that is not cached, fetching the key set at most once
    /// per minimum interval.
    async fn refresh_for_miss(&self, kid: &str) -> Result<TrustedKey, AuthError> {
        let min_interval = Duration::from_secs(self.config.jwks_min_refresh_interval_secs);
        let _guard = self.refresh_lock.lock().await;

        {
            let mut cache = self.inner.write().await;
            // A fetch that finished while this request waited may have the key.
            if let Some(key) = cache.keys.get(kid) {
                return Ok(key.clone());
            }
            if !can_attempt(cache.last_refresh_attempt, min_interval) {
                return Err(match &cache.last_error {
                    Some(reason) => AuthError::KeyRetrieval(reason.clone()),
                    None => untrusted(kid),
                });
            }
            cache.last_refresh_attempt = Some(Instant::now());
        }

        self.refresh().await?;
        self.lookup(kid).await.ok_or_else(|| untrusted(kid))
    }

    async fn refresh_stale(&self) -> Result<(), AuthError> {
        if !self.should_refresh().await {
            return Ok(());
        }

        let _guard = self.refresh_lock.lock().await;

        // Another request may have refreshed while this one waited on the lock.
        if !self.should_refresh().await {
            return Ok(());
        }

        {
            let mut cache = self.inner.write().await;
            cache.last_refresh_attempt = Some(Instant::now());
        }

        self.refresh().await
    }

    async fn should_refresh(&self) -> bool {
        let ttl = Duration::from_secs(self.config.jwks_cache_ttl_secs);
        let min_interval = Duration::from_secs(self.config.jwks_min_refresh_interval_secs);

        let cache = self.inner.read().await;
        if !is_stale(cache.last_refresh, ttl) {
            return false;
        }
        can_attempt(cache.last_refresh_attempt, min_interval)
    }
}

fn untrusted(kid: &str) -> AuthError {
    warn!(kid, "Unknown signing key after JWKS refresh");
    ValidationError::UntrustedKey(kid.to_string()).into()
}

fn is_stale(last_refresh: Option<Instant>, ttl: Duration) -> bool {
    match last_refresh {
        None => true,
        Some(ts) => ts.elapsed() >= ttl,
    }
}

fn can_attempt(last_attempt: Option<Instant>, min_interval: Duration) -> bool {
    match last_attempt {
        None => true,
        Some(ts) => ts.elapsed() >= min_interval,
    }
}
