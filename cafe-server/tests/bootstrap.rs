use cafe_core::config::{CafeConfig, ConfigError};
use cafe_core::http::StatusCode;
use cafe_server::{build_router, build_state, AppError};
use cafe_test::{JwksServer, TestApp, TestJwt};

fn secret_config(jwt: &TestJwt) -> CafeConfig {
    let yaml = format!(
        r#"
database:
  url: "sqlite::memory:"
  reset: true
security:
  issuer: "{}"
  audience: "{}"
  secret: "{}"
"#,
        jwt.issuer(),
        jwt.audience(),
        String::from_utf8_lossy(jwt.secret()),
    );
    CafeConfig::from_yaml_str(&yaml, "test").unwrap()
}

#[tokio::test]
async fn static_secret_accepts_hs256_tokens() {
    let jwt = TestJwt::new();
    let state = build_state(&secret_config(&jwt)).await.unwrap();
    let app = TestApp::new(build_router(state));

    app.get("/drinks-detail")
        .bearer(&jwt.token(&["get:drinks-detail"]))
        .send()
        .await
        .assert_ok()
        .assert_json_path("drinks[0].title", "water");
}

#[tokio::test]
async fn jwks_configuration_accepts_rs256_tokens() {
    let server = JwksServer::start(vec![TestJwt::rsa_jwk()]).await;
    let jwt = TestJwt::new();
    let yaml = format!(
        "database:\n  reset: true\nsecurity:\n  issuer: \"{}\"\n  audience: \"{}\"\n  jwks:\n    url: \"{}\"\n",
        jwt.issuer(),
        jwt.audience(),
        server.url(),
    );
    let config = CafeConfig::from_yaml_str(&yaml, "test").unwrap();

    let app = TestApp::new(build_router(build_state(&config).await.unwrap()));
    assert_eq!(server.hits(), 1);

    let token = jwt.builder().permissions(&["delete:drinks"]).rs256().build();
    app.delete("/drinks/1")
        .bearer(&token)
        .send()
        .await
        .assert_ok()
        .assert_json_path("deleted", 1);

    // HS256 is not on the default allow-list.
    app.delete("/drinks/1")
        .bearer(&jwt.token(&["delete:drinks"]))
        .send()
        .await
        .assert_auth_error(StatusCode::UNAUTHORIZED, "disallowed_algorithm");
}

#[tokio::test]
async fn unreachable_jwks_fails_requests_not_startup() {
    let server = JwksServer::start(vec![]).await;
    server.set_failing(true);
    let jwt = TestJwt::new();
    let yaml = format!(
        "security:\n  issuer: \"{}\"\n  audience: \"{}\"\n  jwks:\n    url: \"{}\"\n",
        jwt.issuer(),
        jwt.audience(),
        server.url(),
    );
    let config = CafeConfig::from_yaml_str(&yaml, "test").unwrap();
    let app = TestApp::new(build_router(build_state(&config).await.unwrap()));

    let token = jwt.builder().permissions(&["get:drinks-detail"]).rs256().build();
    for _ in 0..3 {
        app.get("/drinks-detail")
            .bearer(&token)
            .send()
            .await
            .assert_auth_error(StatusCode::SERVICE_UNAVAILABLE, "key_retrieval_failed");
    }
    // Startup prefetch plus one retry; the rest fall inside the refresh interval.
    assert_eq!(server.hits(), 2);
}

#[tokio::test]
async fn missing_key_source_is_config_error() {
    let config = CafeConfig::from_yaml_str(
        "security:\n  issuer: \"https://cafe.test/\"\n  audience: drinks\n",
        "test",
    )
    .unwrap();
    match build_state(&config).await {
        Err(AppError::Config(ConfigError::NotFound(key))) => assert_eq!(key, "security.jwks.url"),
        Err(other) => panic!("expected missing jwks url, got {other}"),
        Ok(_) => panic!("expected missing jwks url"),
    }
}
