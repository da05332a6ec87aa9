//! Flat key-value configuration sources.
//!
//! Beans receive configuration values through the container's configuration
//! store; this module provides the loaders that populate it. Keys are flat
//! dotted strings (`database.url`), values are strings. Nested YAML documents
//! are flattened into dotted keys; environment variables are mapped by
//! stripping a prefix and lowering `FOO_BAR` to `foo.bar`.

use std::collections::HashMap;

use serde_json::Value as JsonValue;
use serde_yaml::Value as YamlValue;

use crate::errors::CoreResult;

/// An ordered-insensitive flat configuration map.
///
/// Merging is last-write-wins per key, so sources can be layered
/// (defaults, then file, then environment).
#[derive(Debug, Clone, Default)]
pub struct ConfigMap {
    entries: HashMap<String, String>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from process environment variables carrying the given prefix.
    ///
    /// `LARIAT_DATABASE_URL` with prefix `LARIAT_` becomes `database.url`.
    pub fn from_env(prefix: &str) -> Self {
        let mut map = Self::new();
        for (key, value) in std::env::vars() {
            if let Some(rest) = key.strip_prefix(prefix) {
                if rest.is_empty() {
                    continue;
                }
                map.set(rest.to_lowercase().replace('_', "."), value);
            }
        }
        map
    }

    /// Load from a YAML document, flattening nested mappings into dotted keys.
    pub fn from_yaml_str(document: &str) -> CoreResult<Self> {
        let root: YamlValue = serde_yaml::from_str(document)?;
        let mut map = Self::new();
        flatten_yaml(&mut map, "", &root);
        Ok(map)
    }

    /// Load from a JSON document, flattening nested objects into dotted keys.
    pub fn from_json_str(document: &str) -> CoreResult<Self> {
        let root: JsonValue = serde_json::from_str(document)?;
        let mut map = Self::new();
        flatten_json(&mut map, "", &root);
        Ok(map)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Overlay another map onto this one; the other map's entries win.
    pub fn merge(&mut self, other: ConfigMap) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn flatten_yaml(map: &mut ConfigMap, path: &str, value: &YamlValue) {
    match value {
        YamlValue::Mapping(mapping) => {
            for (key, child) in mapping {
                let segment = match key {
                    YamlValue::String(s) => s.clone(),
                    other => yaml_scalar_to_string(other),
                };
                let child_path = if path.is_empty() {
                    segment
                } else {
                    format!("{}.{}", path, segment)
                };
                flatten_yaml(map, &child_path, child);
            }
        }
        YamlValue::Null => {}
        other => {
            if !path.is_empty() {
                map.set(path, yaml_scalar_to_string(other));
            }
        }
    }
}

fn flatten_json(map: &mut ConfigMap, path: &str, value: &JsonValue) {
    match value {
        JsonValue::Object(object) => {
            for (key, child) in object {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                flatten_json(map, &child_path, child);
            }
        }
        JsonValue::Null => {}
        other => {
            if !path.is_empty() {
                map.set(path, json_scalar_to_string(other));
            }
        }
    }
}

fn json_scalar_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(items) => items
            .iter()
            .map(json_scalar_to_string)
            .collect::<Vec<_>>()
            .join(","),
        _ => String::new(),
    }
}

fn yaml_scalar_to_string(value: &YamlValue) -> String {
    match value {
        YamlValue::String(s) => s.clone(),
        YamlValue::Bool(b) => b.to_string(),
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Sequence(seq) => seq
            .iter()
            .map(yaml_scalar_to_string)
            .collect::<Vec<_>>()
            .join(","),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_nested_mappings_flatten_to_dotted_keys() {
        let map = ConfigMap::from_yaml_str(
            r#"
database:
  url: "sqlite::memory:"
  pool:
    max: 8
app_name: demo
"#,
        )
        .unwrap();

        assert_eq!(map.get("database.url"), Some("sqlite::memory:"));
        assert_eq!(map.get("database.pool.max"), Some("8"));
        assert_eq!(map.get("app_name"), Some("demo"));
        assert_eq!(map.get("missing"), None);
    }

    #[test]
    fn env_prefix_is_stripped_and_lowered() {
        std::env::set_var("LARIAT_CFG_TEST__SERVER_PORT", "8080");
        let map = ConfigMap::from_env("LARIAT_CFG_TEST__");
        assert_eq!(map.get("server.port"), Some("8080"));
        std::env::remove_var("LARIAT_CFG_TEST__SERVER_PORT");
    }

    #[test]
    fn json_nested_objects_flatten_to_dotted_keys() {
        let map = ConfigMap::from_json_str(
            r#"{"report": {"label": "quarterly", "pages": 12}, "debug": false}"#,
        )
        .unwrap();

        assert_eq!(map.get("report.label"), Some("quarterly"));
        assert_eq!(map.get("report.pages"), Some("12"));
        assert_eq!(map.get("debug"), Some("false"));
    }

    #[test]
    fn merge_is_last_write_wins() {
        let mut base = ConfigMap::new();
        base.set("a", "1");
        base.set("b", "2");

        let mut overlay = ConfigMap::new();
        overlay.set("b", "3");

        base.merge(overlay);
        assert_eq!(base.get("a"), Some("1"));
        assert_eq!(base.get("b"), Some("3"));
    }
}
