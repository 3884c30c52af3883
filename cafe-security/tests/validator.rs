use cafe_security::{
    decode, Algorithm, AuthError, ClaimValidator, DecodingKey, ValidationError,
};
use cafe_test::TestJwt;

fn validation_error(result: Result<cafe_security::ClaimSet, AuthError>) -> ValidationError {
    match result {
        Err(AuthError::Validation(err)) => err,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn valid_token_yields_claims() {
    let jwt = TestJwt::new();
    let token = jwt.token(&["get:drinks-detail", "post:drinks"]);

    let claims = jwt
        .validator()
        .validate_token(&token, Some("post:drinks"))
        .await
        .unwrap();

    assert_eq!(claims.subject(), Some("auth0|barista"));
    assert_eq!(claims.issuer(), Some(jwt.issuer()));
    assert!(claims.has_permission("get:drinks-detail"));
    assert!(claims.expires_at().is_some());
}

#[tokio::test]
async fn no_required_permission_skips_permission_check() {
    let jwt = TestJwt::new();
    let token = jwt.builder().build();
    let claims = jwt.validator().validate_token(&token, None).await.unwrap();
    assert!(claims.permissions().is_none());
}

#[tokio::test]
async fn validate_accepts_decoded_token() {
    let jwt = TestJwt::new();
    let decoded = decode(&jwt.token(&["patch:drinks"])).unwrap();
    let claims = jwt
        .validator()
        .validate(&decoded, Some("patch:drinks"))
        .await
        .unwrap();
    assert_eq!(claims.as_map(), decoded.unverified_claims());
}

#[tokio::test]
async fn wrong_secret_is_invalid_signature() {
    let jwt = TestJwt::new();
    let token = jwt.builder().secret(b"someone-else").build();
    let err = validation_error(jwt.validator().validate_token(&token, None).await);
    assert_eq!(err, ValidationError::InvalidSignature);
}

#[tokio::test]
async fn tampered_payload_is_invalid_signature() {
    let jwt = TestJwt::new();
    let good = jwt.token(&["get:drinks-detail"]);
    let forged = jwt.builder().permissions(&["delete:drinks"]).build();

    let good: Vec<&str> = good.split('.').collect();
    let forged: Vec<&str> = forged.split('.').collect();
    let spliced = format!("{}.{}.{}", good[0], forged[1], good[2]);

    let err = validation_error(jwt.validator().validate_token(&spliced, None).await);
    assert_eq!(err, ValidationError::InvalidSignature);
}

#[tokio::test]
async fn wrong_issuer_is_invalid_claims() {
    let jwt = TestJwt::new();
    let token = jwt.builder().issuer("https://evil.test/").build();
    let err = validation_error(jwt.validator().validate_token(&token, None).await);
    assert!(matches!(err, ValidationError::InvalidClaims(_)), "{err}");
}

#[tokio::test]
async fn wrong_audience_is_invalid_claims() {
    let jwt = TestJwt::new();
    let token = jwt.builder().audience("espresso").build();
    let err = validation_error(jwt.validator().validate_token(&token, None).await);
    assert!(matches!(err, ValidationError::InvalidClaims(_)), "{err}");
}

#[tokio::test]
async fn missing_exp_is_invalid_claims() {
    let jwt = TestJwt::new();
    let token = jwt.builder().without("exp").build();
    let err = validation_error(jwt.validator().validate_token(&token, None).await);
    assert!(matches!(err, ValidationError::InvalidClaims(_)), "{err}");
}

#[tokio::test]
async fn token_expired_one_second_ago() {
    let jwt = TestJwt::new();
    let token = jwt.builder().expires_in(-1).build();
    let err = validation_error(jwt.validator().validate_token(&token, None).await);
    assert_eq!(err, ValidationError::Expired);
}

#[tokio::test]
async fn token_expiring_in_a_minute_is_accepted() {
    let jwt = TestJwt::new();
    let token = jwt.builder().expires_in(60).build();
    assert!(jwt.validator().validate_token(&token, None).await.is_ok());
}

#[tokio::test]
async fn leeway_tolerates_recent_expiry() {
    let jwt = TestJwt::new();
    let validator = ClaimValidator::with_static_key(
        DecodingKey::from_secret(jwt.secret()),
        jwt.config().with_leeway(120),
    );
    let token = jwt.builder().expires_in(-30).build();
    assert!(validator.validate_token(&token, None).await.is_ok());
}

#[tokio::test]
async fn unsigned_token_is_disallowed() {
    let jwt = TestJwt::new();
    let token = jwt.builder().permissions(&["delete:drinks"]).unsigned().build();
    let err = validation_error(jwt.validator().validate_token(&token, Some("delete:drinks")).await);
    assert_eq!(err, ValidationError::DisallowedAlgorithm("none".into()));
}

#[tokio::test]
async fn algorithm_outside_allow_list_is_disallowed() {
    let jwt = TestJwt::new();
    let validator = ClaimValidator::with_static_key(
        DecodingKey::from_secret(jwt.secret()),
        jwt.config().with_allowed_algorithm(Algorithm::RS256),
    );
    let err = validation_error(validator.validate_token(&jwt.token(&[]), None).await);
    assert_eq!(err, ValidationError::DisallowedAlgorithm("HS256".into()));
}

#[tokio::test]
async fn empty_allow_list_rejects_everything() {
    let jwt = TestJwt::new();
    let validator = ClaimValidator::with_static_key(
        DecodingKey::from_secret(jwt.secret()),
        jwt.config().with_allowed_algorithms(Vec::<Algorithm>::new()),
    );
    let err = validation_error(validator.validate_token(&jwt.token(&[]), None).await);
    assert!(matches!(err, ValidationError::DisallowedAlgorithm(_)));
}

#[tokio::test]
async fn missing_permission_set() {
    let jwt = TestJwt::new();
    let token = jwt.builder().build();
    let err = validation_error(jwt.validator().validate_token(&token, Some("post:drinks")).await);
    assert_eq!(err, ValidationError::MissingPermissions);
}

#[tokio::test]
async fn permission_not_in_set() {
    let jwt = TestJwt::new();
    let token = jwt.token(&["get:drinks-detail"]);
    let err = validation_error(jwt.validator().validate_token(&token, Some("delete:drinks")).await);
    assert_eq!(
        err,
        ValidationError::InsufficientPermission("delete:drinks".into())
    );
}

#[tokio::test]
async fn expiry_is_checked_before_permissions() {
    let jwt = TestJwt::new();
    let token = jwt.builder().expires_in(-10).build();
    let err = validation_error(jwt.validator().validate_token(&token, Some("post:drinks")).await);
    assert_eq!(err, ValidationError::Expired);
}

#[tokio::test]
async fn custom_permissions_claim() {
    let jwt = TestJwt::new();
    let validator = ClaimValidator::with_static_key(
        DecodingKey::from_secret(jwt.secret()),
        jwt.config().with_permissions_claim("https://cafe.test/perms"),
    );
    let token = jwt
        .builder()
        .claim("https://cafe.test/perms", vec!["post:drinks"])
        .build();
    assert!(validator
        .validate_token(&token, Some("post:drinks"))
        .await
        .is_ok());
}

#[tokio::test]
async fn rs256_with_static_public_key() {
    let jwt = TestJwt::new();
    let jwk = TestJwt::rsa_jwk();
    let key = DecodingKey::from_rsa_components(
        jwk["n"].as_str().unwrap(),
        jwk["e"].as_str().unwrap(),
    )
    .unwrap();
    let validator = ClaimValidator::with_static_key(
        key,
        jwt.config().with_allowed_algorithm(Algorithm::RS256),
    );

    let token = jwt.builder().permissions(&["get:drinks-detail"]).rs256().build();
    let claims = validator
        .validate_token(&token, Some("get:drinks-detail"))
        .await
        .unwrap();
    assert_eq!(claims.subject(), Some("auth0|barista"));
}

#[tokio::test]
async fn malformed_token_is_decode_error() {
    let err = TestJwt::new()
        .validator()
        .validate_token("abc.def", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Decode(_)), "{err}");
}
