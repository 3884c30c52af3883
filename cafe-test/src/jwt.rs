use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cafe_security::{Algorithm, AuthGuard, ClaimValidator, DecodingKey, SecurityConfig};
use jsonwebtoken::{encode, get_current_timestamp, EncodingKey, Header};
use serde_json::{Map, Value};

/// Key id published for the RSA fixture key.
pub const RSA_KID: &str = "cafe-test-key";

const RSA_PRIVATE_PEM: &[u8] = include_bytes!("fixtures/rsa_private.pem");
const RSA_MODULUS: &str = include_str!("fixtures/rsa_modulus.txt");
const RSA_EXPONENT: &str = "AQAB";

/// Issues tokens for tests and builds matching validators.
///
/// HS256 tokens use a shared secret; RS256 tokens use a fixed 2048-bit key
/// whose public half is available as a JWK via [`TestJwt::rsa_jwk`].
#[derive(Clone)]
pub struct TestJwt {
    secret: Vec<u8>,
    issuer: String,
    audience: String,
}

impl TestJwt {
    pub fn new() -> Self {
        Self {
            secret: b"cafe-test-secret-do-not-use-in-production".to_vec(),
            issuer: "https://cafe.test/".into(),
            audience: "drinks".into(),
        }
    }

    pub fn with_secret(mut self, secret: impl Into<Vec<u8>>) -> Self {
        self.secret = secret.into();
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    /// Config accepting HS256 tokens from this issuer.
    pub fn config(&self) -> SecurityConfig {
        SecurityConfig::new("unused", &self.issuer, &self.audience)
            .with_allowed_algorithm(Algorithm::HS256)
    }

    /// Validator keyed with the shared secret.
    pub fn validator(&self) -> ClaimValidator {
        ClaimValidator::with_static_key(DecodingKey::from_secret(&self.secret), self.config())
    }

    /// Guard keyed with the shared secret.
    pub fn guard(&self) -> AuthGuard {
        AuthGuard::new(Arc::new(self.validator()))
    }

    /// A valid HS256 token carrying the given permissions.
    pub fn token(&self, permissions: &[&str]) -> String {
        self.builder().permissions(permissions).build()
    }

    /// Start building a token with `iss`, `aud`, `sub` and a one hour expiry.
    pub fn builder(&self) -> TokenBuilder {
        let mut claims = Map::new();
        claims.insert("iss".into(), Value::from(self.issuer.clone()));
        claims.insert("aud".into(), Value::from(self.audience.clone()));
        claims.insert("sub".into(), Value::from("auth0|barista"));
        claims.insert("exp".into(), Value::from(get_current_timestamp() + 3600));
        TokenBuilder {
            claims,
            signer: Signer::Hmac(self.secret.clone()),
            kid: None,
        }
    }

    /// The public half of the RSA fixture key as a JWKS entry.
    pub fn rsa_jwk() -> Value {
        serde_json::json!({
            "kty": "RSA",
            "kid": RSA_KID,
            "alg": "RS256",
            "use": "sig",
            "n": RSA_MODULUS.trim(),
            "e": RSA_EXPONENT,
        })
    }

    /// The RSA fixture key under another key id, for rotation tests.
    pub fn rsa_jwk_with_kid(kid: &str) -> Value {
        let mut jwk = Self::rsa_jwk();
        jwk["kid"] = Value::from(kid);
        jwk
    }
}

impl Default for TestJwt {
    fn default() -> Self {
        Self::new()
    }
}

enum Signer {
    Hmac(Vec<u8>),
    Rsa,
    Unsigned,
}

/// Builder for a single test token.
pub struct TokenBuilder {
    claims: Map<String, Value>,
    signer: Signer,
    kid: Option<String>,
}

impl TokenBuilder {
    pub fn subject(self, sub: &str) -> Self {
        self.claim("sub", sub)
    }

    pub fn permissions(self, permissions: &[&str]) -> Self {
        self.claim("permissions", permissions.to_vec())
    }

    pub fn issuer(self, iss: &str) -> Self {
        self.claim("iss", iss)
    }

    pub fn audience(self, aud: &str) -> Self {
        self.claim("aud", aud)
    }

    /// Set `exp` relative to now. Negative offsets produce expired tokens.
    pub fn expires_in(self, secs: i64) -> Self {
        let exp = get_current_timestamp().saturating_add_signed(secs);
        self.claim("exp", exp)
    }

    pub fn claim(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.claims.insert(name.to_string(), value.into());
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    pub fn secret(mut self, secret: &[u8]) -> Self {
        self.signer = Signer::Hmac(secret.to_vec());
        self
    }

    /// Sign with the RSA fixture key, advertising [`RSA_KID`] unless another
    /// key id is set.
    pub fn rs256(mut self) -> Self {
        self.signer = Signer::Rsa;
        if self.kid.is_none() {
            self.kid = Some(RSA_KID.into());
        }
        self
    }

    /// Produce an `alg: none` token with an empty signature segment.
    pub fn unsigned(mut self) -> Self {
        self.signer = Signer::Unsigned;
        self
    }

    pub fn kid(mut self, kid: &str) -> Self {
        self.kid = Some(kid.into());
        self
    }

    pub fn without_kid(mut self) -> Self {
        self.kid = None;
        self
    }

    pub fn build(self) -> String {
        match self.signer {
            Signer::Hmac(secret) => {
                let mut header = Header::new(Algorithm::HS256);
                header.kid = self.kid;
                encode(&header, &self.claims, &EncodingKey::from_secret(&secret)).unwrap()
            }
            Signer::Rsa => {
                let mut header = Header::new(Algorithm::RS256);
                header.kid = self.kid;
                let key = EncodingKey::from_rsa_pem(RSA_PRIVATE_PEM).unwrap();
                encode(&header, &self.claims, &key).unwrap()
            }
            Signer::Unsigned => {
                let mut header = serde_json::json!({ "alg": "none", "typ": "JWT" });
                if let Some(kid) = self.kid {
                    header["kid"] = Value::from(kid);
                }
                format!(
                    "{}.{}.",
                    URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).unwrap()),
                    URL_SAFE_NO_PAD.encode(serde_json::to_vec(&self.claims).unwrap()),
                )
            }
        }
    }
}
