use std::collections::HashMap;
use std::path::Path;

use super::value::ConfigValue;
use super::ConfigError;

/// Read a YAML file if it exists and merge its flattened keys into `values`.
///
/// A missing file is not an error; every layer is optional.
pub(crate) fn merge_yaml_file(
    path: &Path,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    if !path.exists() {
        return Ok(());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
    merge_yaml_str(&content, values)
        .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))
}

/// Parse a YAML document and merge its flattened keys into `values`.
pub(crate) fn merge_yaml_str(
    content: &str,
    values: &mut HashMap<String, ConfigValue>,
) -> Result<(), ConfigError> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    flatten("", &yaml, values);
    Ok(())
}

/// Overlay environment variables: `SECURITY_JWKS_URL` becomes `security.jwks.url`.
pub(crate) fn merge_env(
    vars: impl Iterator<Item = (String, String)>,
    values: &mut HashMap<String, ConfigValue>,
) {
    for (name, value) in vars {
        let key = name.to_lowercase().replace('_', ".");
        values.insert(key, ConfigValue::String(value));
    }
}

fn flatten(prefix: &str, value: &serde_yaml::Value, out: &mut HashMap<String, ConfigValue>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let segment = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => format!("{other:?}"),
                };
                let key = if prefix.is_empty() {
                    segment
                } else {
                    format!("{prefix}.{segment}")
                };
                flatten(&key, v, out);
            }
        }
        // Lists are kept whole so `Vec<T>` lookups see every element.
        serde_yaml::Value::Sequence(_) if !prefix.is_empty() => {
            out.insert(prefix.to_string(), ConfigValue::from_yaml(value));
        }
        leaf if !prefix.is_empty() => {
            out.insert(prefix.to_string(), ConfigValue::from_yaml(leaf));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_keys_are_dot_joined() {
        let mut values = HashMap::new();
        merge_yaml_str("security:\n  jwks:\n    url: http://idp/jwks\n", &mut values).unwrap();
        assert!(matches!(
            values.get("security.jwks.url"),
            Some(ConfigValue::String(s)) if s == "http://idp/jwks"
        ));
    }

    #[test]
    fn sequences_stay_whole() {
        let mut values = HashMap::new();
        merge_yaml_str("security:\n  algorithms: [RS256, ES256]\n", &mut values).unwrap();
        match values.get("security.algorithms") {
            Some(ConfigValue::List(items)) => assert_eq!(items.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn env_names_map_to_dotted_keys() {
        let mut values = HashMap::new();
        merge_env(
            vec![("DATABASE_URL".to_string(), "sqlite://cafe.db".to_string())].into_iter(),
            &mut values,
        );
        assert!(values.contains_key("database.url"));
    }
}
