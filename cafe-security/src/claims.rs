use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

/// Validated token claims.
///
/// Only [`ClaimValidator`](crate::ClaimValidator) constructs this type, so a
/// handler holding a `ClaimSet` knows signature, issuer, audience and expiry
/// were checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimSet {
    #[serde(flatten)]
    claims: Map<String, Value>,
    #[serde(skip)]
    permissions: Option<BTreeSet<String>>,
}

impl ClaimSet {
    pub(crate) fn new(claims: Map<String, Value>, permissions_claim: &str) -> Self {
        let permissions = read_permissions(&claims, permissions_claim);
        Self {
            claims,
            permissions,
        }
    }

    /// Raw claim lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.get("iss").and_then(Value::as_str)
    }

    /// The `exp` claim as seconds since the Unix epoch.
    pub fn expires_at(&self) -> Option<u64> {
        self.get("exp").and_then(Value::as_u64)
    }

    /// The permission set, if the token carries one.
    pub fn permissions(&self) -> Option<&BTreeSet<String>> {
        self.permissions.as_ref()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|set| set.contains(permission))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.claims
    }
}

/// Read permissions from the configured claim (an array of strings), falling
/// back to an OAuth2 space-delimited `scope` string.
fn read_permissions(claims: &Map<String, Value>, permissions_claim: &str) -> Option<BTreeSet<String>> {
    if let Some(Value::Array(items)) = claims.get(permissions_claim) {
        return Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        );
    }
    match claims.get("scope") {
        Some(Value::String(scope)) => {
            Some(scope.split_whitespace().map(str::to_string).collect())
        }
        _ => None,
    }
}
