use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cafe_core::http::{HeaderMap, HeaderValue, StatusCode, AUTHORIZATION};
use cafe_security::{AuthError, ClaimSet, ValidationError};
use cafe_test::TestJwt;

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );
    headers
}

#[tokio::test]
async fn authorize_without_permission_accepts_any_valid_token() {
    let jwt = TestJwt::new();
    let claims = jwt
        .guard()
        .authorize(&bearer(&jwt.token(&[])), None)
        .await
        .unwrap();
    assert_eq!(claims.subject(), Some("auth0|barista"));
}

#[tokio::test]
async fn guarded_operation_runs_once_with_claims() {
    let jwt = TestJwt::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let create = jwt.guard().require("post:drinks").wrap(move |claims: ClaimSet, title: String| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            format!("{} made {title}", claims.subject().unwrap_or("?"))
        }
    });

    let out = create
        .call(&bearer(&jwt.token(&["post:drinks"])), "latte".to_string())
        .await
        .unwrap();

    assert_eq!(out, "auth0|barista made latte");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(create.permission(), "post:drinks");
}

#[tokio::test]
async fn guarded_operation_not_invoked_on_failure() {
    let jwt = TestJwt::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let delete = jwt.guard().require("delete:drinks").wrap(move |_claims: ClaimSet, id: i64| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            id
        }
    });

    let err = delete
        .call(&bearer(&jwt.token(&["get:drinks-detail"])), 1)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AuthError::Validation(ValidationError::InsufficientPermission("delete:drinks".into()))
    );

    let err = delete.call(&HeaderMap::new(), 1).await.unwrap_err();
    assert_eq!(err.code(), "authorization_header_missing");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_header_is_401() {
    let err = TestJwt::new()
        .guard()
        .require("post:drinks")
        .check(&HeaderMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(err.description(), "Authorization header is expected.");
}

#[tokio::test]
async fn empty_credential_is_missing_not_malformed() {
    let jwt = TestJwt::new();
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));

    let err = jwt.guard().authorize(&headers, None).await.unwrap_err();
    assert_eq!(err, AuthError::MissingCredential("Token not found."));
}

#[tokio::test]
async fn non_bearer_scheme_is_401() {
    let jwt = TestJwt::new();
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic YmFyaXN0YTpwYXNz"));

    let err = jwt.guard().authorize(&headers, None).await.unwrap_err();
    assert_eq!(err.code(), "authorization_header_missing");
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn one_token_checked_against_different_permissions() {
    let jwt = TestJwt::new();
    let guard = jwt.guard();
    let headers = bearer(&jwt.token(&["get:drinks-detail"]));

    assert!(guard.require("get:drinks-detail").check(&headers).await.is_ok());
    let err = guard.require("patch:drinks").check(&headers).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
    assert_eq!(err.code(), "insufficient_permission");
}

#[tokio::test]
async fn token_without_permission_set_is_403() {
    let jwt = TestJwt::new();
    let headers = bearer(&jwt.builder().build());
    let err = jwt.guard().require("post:drinks").check(&headers).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
    assert_eq!(err.code(), "missing_permissions");
}
