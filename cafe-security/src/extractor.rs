use std::marker::PhantomData;

use cafe_core::http::extract::{FromRef, FromRequestParts};
use cafe_core::http::header::{HeaderMap, Parts, AUTHORIZATION};
use tracing::debug;

use crate::claims::ClaimSet;
use crate::error::AuthError;
use crate::guard::AuthGuard;

/// Extract the bearer credential from the `Authorization` header.
///
/// The header must be exactly two whitespace-separated parts, the first being
/// `Bearer` (case-insensitive). The credential itself is not inspected.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential("Authorization header is expected."))?;
    let value = value
        .to_str()
        .map_err(|_| AuthError::MissingCredential("Authorization header must be bearer token."))?;

    let parts: Vec<&str> = value.split_whitespace().collect();
    match parts[..] {
        [] => Err(AuthError::MissingCredential("Authorization header is expected.")),
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => Err(
            AuthError::MissingCredential("Authorization header must start with \"Bearer\"."),
        ),
        [_] => Err(AuthError::MissingCredential("Token not found.")),
        [_, token] => Ok(token),
        _ => Err(AuthError::MissingCredential(
            "Authorization header must be bearer token.",
        )),
    }
}

/// A named permission, used as the type parameter of [`Authorized`].
///
/// ```ignore
/// pub struct PostDrinks;
/// impl Permission for PostDrinks {
///     const NAME: &'static str = "post:drinks";
/// }
///
/// async fn create(auth: Authorized<PostDrinks>, ...) { ... }
/// ```
pub trait Permission: Send + Sync + 'static {
    const NAME: &'static str;
}

/// Extractor that authorizes the request for permission `P`.
///
/// The handler body only runs when extraction succeeds; otherwise the
/// [`AuthError`] is rendered as the response. The application state must
/// provide an [`AuthGuard`] via `FromRef`.
pub struct Authorized<P: Permission> {
    claims: ClaimSet,
    _permission: PhantomData<P>,
}

impl<P: Permission> Authorized<P> {
    pub fn claims(&self) -> &ClaimSet {
        &self.claims
    }

    pub fn into_claims(self) -> ClaimSet {
        self.claims
    }
}

impl<P: Permission> std::fmt::Debug for Authorized<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorized")
            .field("permission", &P::NAME)
            .field("sub", &self.claims.subject())
            .finish()
    }
}

impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: Permission,
    AuthGuard: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let guard = AuthGuard::from_ref(state);
        let claims = guard
            .authorize(&parts.headers, Some(P::NAME))
            .await
            .map_err(|e| {
                debug!(uri = %parts.uri, permission = P::NAME, code = e.code(), "Request rejected");
                e
            })?;

        debug!(uri = %parts.uri, permission = P::NAME, "Request authorized");
        Ok(Self {
            claims,
            _permission: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cafe_core::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        map
    }

    fn reason(result: Result<&str, AuthError>) -> &'static str {
        match result {
            Err(AuthError::MissingCredential(reason)) => reason,
            other => panic!("expected MissingCredential, got {other:?}"),
        }
    }

    #[test]
    fn bearer_token_is_returned() {
        let map = headers("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&map).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let map = headers("bearer abc");
        assert_eq!(extract_bearer_token(&map).unwrap(), "abc");
    }

    #[test]
    fn missing_header() {
        assert_eq!(
            reason(extract_bearer_token(&HeaderMap::new())),
            "Authorization header is expected."
        );
    }

    #[test]
    fn wrong_scheme() {
        let map = headers("Basic dXNlcjpwYXNz");
        assert_eq!(
            reason(extract_bearer_token(&map)),
            "Authorization header must start with \"Bearer\"."
        );
    }

    #[test]
    fn scheme_without_token() {
        let map = headers("Bearer ");
        assert_eq!(reason(extract_bearer_token(&map)), "Token not found.");
    }

    #[test]
    fn too_many_parts() {
        let map = headers("Bearer a b");
        assert_eq!(
            reason(extract_bearer_token(&map)),
            "Authorization header must be bearer token."
        );
    }

    #[test]
    fn empty_header_value() {
        let map = headers("");
        assert_eq!(
            reason(extract_bearer_token(&map)),
            "Authorization header is expected."
        );
    }
}
