use std::future::Future;
use std::sync::Arc;

use cafe_core::http::HeaderMap;
use tracing::warn;

use crate::claims::ClaimSet;
use crate::error::AuthError;
use crate::extractor::extract_bearer_token;
use crate::validator::ClaimValidator;

/// Request authorization entry point.
///
/// Runs header extraction, decoding and validation against one shared
/// [`ClaimValidator`]. Cloning is cheap.
#[derive(Clone)]
pub struct AuthGuard {
    validator: Arc<ClaimValidator>,
}

impl AuthGuard {
    pub fn new(validator: Arc<ClaimValidator>) -> Self {
        Self { validator }
    }

    pub fn validator(&self) -> &ClaimValidator {
        &self.validator
    }

    /// Authorize a request from its headers, optionally requiring a permission.
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        required_permission: Option<&str>,
    ) -> Result<ClaimSet, AuthError> {
        let token = extract_bearer_token(headers)?;
        self.validator
            .validate_token(token, required_permission)
            .await
            .inspect_err(|e| warn!(error = %e, "Authorization failed"))
    }

    /// Bind a required permission, producing a reusable guard.
    pub fn require(&self, permission: impl Into<String>) -> PermissionGuard {
        PermissionGuard {
            guard: self.clone(),
            permission: permission.into(),
        }
    }
}

/// An [`AuthGuard`] bound to one required permission.
#[derive(Clone)]
pub struct PermissionGuard {
    guard: AuthGuard,
    permission: String,
}

impl PermissionGuard {
    pub fn permission(&self) -> &str {
        &self.permission
    }

    pub async fn check(&self, headers: &HeaderMap) -> Result<ClaimSet, AuthError> {
        self.guard.authorize(headers, Some(&self.permission)).await
    }

    /// Wrap an operation so it only runs after authorization succeeds.
    ///
    /// The operation receives the validated claims followed by its own
    /// arguments. On failure it is not invoked and the error is returned.
    pub fn wrap<F>(&self, op: F) -> Guarded<F> {
        Guarded {
            guard: self.clone(),
            op,
        }
    }
}

/// An operation protected by a [`PermissionGuard`].
#[derive(Clone)]
pub struct Guarded<F> {
    guard: PermissionGuard,
    op: F,
}

impl<F> Guarded<F> {
    pub fn permission(&self) -> &str {
        self.guard.permission()
    }

    pub async fn call<A, Fut>(&self, headers: &HeaderMap, args: A) -> Result<Fut::Output, AuthError>
    where
        F: Fn(ClaimSet, A) -> Fut,
        Fut: Future,
    {
        let claims = self.guard.check(headers).await?;
        Ok((self.op)(claims, args).await)
    }
}
