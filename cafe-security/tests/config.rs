use std::time::Duration;

use cafe_core::config::{CafeConfig, ConfigError};
use cafe_security::{Algorithm, SecurityConfig};

#[test]
fn defaults_apply_for_optional_keys() {
    let config = CafeConfig::from_yaml_str(
        r#"
security:
  issuer: "https://cafe.eu.auth0.com/"
  audience: "drinks"
  jwks:
    url: "https://cafe.eu.auth0.com/.well-known/jwks.json"
"#,
        "test",
    )
    .unwrap();

    let security = SecurityConfig::from_config(&config).unwrap();
    assert_eq!(security.issuer, "https://cafe.eu.auth0.com/");
    assert_eq!(security.audience, "drinks");
    assert_eq!(security.allowed_algorithms, vec![Algorithm::RS256]);
    assert_eq!(security.jwks_cache_ttl_secs, 3600);
    assert_eq!(security.jwks_min_refresh_interval_secs, 10);
    assert_eq!(security.jwks_fetch_timeout, Duration::from_secs(5));
    assert_eq!(security.permissions_claim, "permissions");
    assert_eq!(security.leeway_secs, 0);
}

#[test]
fn overrides_are_read() {
    let config = CafeConfig::from_yaml_str(
        r#"
security:
  issuer: "iss"
  audience: "aud"
  algorithms: [RS256, ES256]
  leeway: 30
  permissions: "scopes"
  jwks:
    url: "http://localhost/jwks"
    ttl: 60
    interval: 1
    timeout: 250
"#,
        "test",
    )
    .unwrap();

    let security = SecurityConfig::from_config(&config).unwrap();
    assert_eq!(
        security.allowed_algorithms,
        vec![Algorithm::RS256, Algorithm::ES256]
    );
    assert_eq!(security.leeway_secs, 30);
    assert_eq!(security.permissions_claim, "scopes");
    assert_eq!(security.jwks_cache_ttl_secs, 60);
    assert_eq!(security.jwks_min_refresh_interval_secs, 1);
    assert_eq!(security.jwks_fetch_timeout, Duration::from_millis(250));
}

#[test]
fn issuer_is_required() {
    let config = CafeConfig::from_yaml_str("security:\n  audience: drinks\n", "test").unwrap();
    assert!(matches!(
        SecurityConfig::from_config(&config),
        Err(ConfigError::NotFound(_))
    ));
}

#[test]
fn unknown_algorithm_is_rejected() {
    let config = CafeConfig::from_yaml_str(
        "security:\n  issuer: i\n  audience: a\n  algorithms: [RS256, XX999]\n",
        "test",
    )
    .unwrap();
    match SecurityConfig::from_config(&config) {
        Err(ConfigError::Invalid { key, message }) => {
            assert_eq!(key, "security.algorithms");
            assert!(message.contains("XX999"));
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
}
