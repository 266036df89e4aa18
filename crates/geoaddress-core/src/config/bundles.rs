//! Configuration bundle source
//!
//! Loads provider configuration from JSON, YAML or TOML files. Nested tables
//! are flattened into the upper-case key names providers declare:
//!
//! ```yaml
//! nominatim:
//!   user_agent: my-app/1.0
//! MAPBOX_ACCESS_TOKEN: pk.abc
//! ```
//!
//! yields `NOMINATIM_USER_AGENT` and `MAPBOX_ACCESS_TOKEN`.

use super::traits::{ConfigSource, ConfigSourceError, SourceResult};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supported bundle formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleFormat {
    Json,
    Yaml,
    Toml,
}

impl BundleFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path) -> SourceResult<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match extension.as_str() {
            "json" => Ok(BundleFormat::Json),
            "yaml" | "yml" => Ok(BundleFormat::Yaml),
            "toml" => Ok(BundleFormat::Toml),
            _ => Err(ConfigSourceError::Parse(format!(
                "Unsupported bundle format '{}'. Supported formats: json, yaml, yml, toml",
                extension
            ))),
        }
    }
}

/// Read-only source over a parsed configuration file
#[derive(Debug, Clone)]
pub struct BundleSource {
    path: Option<PathBuf>,
    values: HashMap<String, String>,
}

impl BundleSource {
    /// Load and flatten a bundle file, detecting the format from its extension
    pub fn from_file(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let format = BundleFormat::from_path(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigSourceError::Io(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let mut source = Self::from_string(&content, format)?;
        source.path = Some(path.to_path_buf());
        Ok(source)
    }

    /// Parse bundle content in the given format
    pub fn from_string(content: &str, format: BundleFormat) -> SourceResult<Self> {
        let value = parse_bundle(content, format)?;
        let mut values = HashMap::new();
        if let JsonValue::Object(root) = &value {
            flatten_object(root, "", &mut values);
        } else {
            return Err(ConfigSourceError::Parse(
                "Bundle root must be a mapping".to_string(),
            ));
        }
        Ok(Self { path: None, values })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Flattened key names, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl ConfigSource for BundleSource {
    fn name(&self) -> &str {
        "bundle"
    }

    fn get(&self, key: &str) -> SourceResult<Option<String>> {
        Ok(self.values.get(&key.to_uppercase()).cloned())
    }
}

fn parse_bundle(content: &str, format: BundleFormat) -> SourceResult<JsonValue> {
    match format {
        BundleFormat::Json => serde_json::from_str(content)
            .map_err(|e| ConfigSourceError::Parse(format!("Invalid JSON: {}", e))),
        BundleFormat::Yaml => serde_yaml::from_str(content)
            .map_err(|e| ConfigSourceError::Parse(format!("Invalid YAML: {}", e))),
        BundleFormat::Toml => {
            let value: toml::Value = toml::from_str(content)
                .map_err(|e| ConfigSourceError::Parse(format!("Invalid TOML: {}", e)))?;
            Ok(toml_to_json(value))
        }
    }
}

/// Flatten nested tables into `PARENT_CHILD` upper-case keys
fn flatten_object(
    obj: &serde_json::Map<String, JsonValue>,
    prefix: &str,
    result: &mut HashMap<String, String>,
) {
    for (key, value) in obj {
        let segment = key.replace(['-', '.'], "_").to_uppercase();
        let full_key = if prefix.is_empty() {
            segment
        } else {
            format!("{}_{}", prefix, segment)
        };

        match value {
            JsonValue::Object(nested) => flatten_object(nested, &full_key, result),
            JsonValue::String(s) => {
                result.insert(full_key, s.clone());
            }
            JsonValue::Number(n) => {
                result.insert(full_key, n.to_string());
            }
            JsonValue::Bool(b) => {
                result.insert(full_key, b.to_string());
            }
            // Lists and nulls carry no usable scalar configuration
            JsonValue::Array(_) | JsonValue::Null => {}
        }
    }
}

fn toml_to_json(toml: toml::Value) -> JsonValue {
    match toml {
        toml::Value::String(s) => JsonValue::String(s),
        toml::Value::Integer(i) => JsonValue::Number(serde_json::Number::from(i)),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        toml::Value::Boolean(b) => JsonValue::Bool(b),
        toml::Value::Array(arr) => JsonValue::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => JsonValue::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
        toml::Value::Datetime(dt) => JsonValue::String(dt.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_bundle_flattens_nested_tables() {
        let source = BundleSource::from_string(
            "nominatim:\n  user_agent: my-app/1.0\n  base-url: http://localhost:8080\nMAPBOX_ACCESS_TOKEN: pk.abc\n",
            BundleFormat::Yaml,
        )
        .unwrap();

        assert_eq!(source.get("NOMINATIM_USER_AGENT").unwrap().as_deref(), Some("my-app/1.0"));
        assert_eq!(
            source.get("NOMINATIM_BASE_URL").unwrap().as_deref(),
            Some("http://localhost:8080")
        );
        assert_eq!(source.get("MAPBOX_ACCESS_TOKEN").unwrap().as_deref(), Some("pk.abc"));
    }

    #[test]
    fn test_toml_bundle() {
        let source = BundleSource::from_string(
            "[here]\napp_id = \"id\"\napp_code = \"code\"\n\n[limits]\nmax = 3\nenabled = true\n",
            BundleFormat::Toml,
        )
        .unwrap();
        assert_eq!(source.get("HERE_APP_ID").unwrap().as_deref(), Some("id"));
        assert_eq!(source.get("LIMITS_MAX").unwrap().as_deref(), Some("3"));
        assert_eq!(source.get("LIMITS_ENABLED").unwrap().as_deref(), Some("true"));
    }

    #[test]
    fn test_json_bundle_skips_lists_and_nulls() {
        let source = BundleSource::from_string(
            r#"{"google": {"api_key": null, "hosts": ["a", "b"]}, "opencage_api_key": "k"}"#,
            BundleFormat::Json,
        )
        .unwrap();
        assert_eq!(source.get("GOOGLE_API_KEY").unwrap(), None);
        assert_eq!(source.get("GOOGLE_HOSTS").unwrap(), None);
        assert_eq!(source.get("OPENCAGE_API_KEY").unwrap().as_deref(), Some("k"));
        assert_eq!(source.keys(), vec!["OPENCAGE_API_KEY"]);
    }

    #[test]
    fn test_bundle_root_must_be_mapping() {
        let result = BundleSource::from_string("[1, 2]", BundleFormat::Json);
        assert!(matches!(result, Err(ConfigSourceError::Parse(_))));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(BundleFormat::from_path(Path::new("a.yml")).unwrap(), BundleFormat::Yaml);
        assert_eq!(BundleFormat::from_path(Path::new("a.TOML")).unwrap(), BundleFormat::Toml);
        assert!(BundleFormat::from_path(Path::new("a.ini")).is_err());
    }

    #[test]
    fn test_bundle_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geoaddress.json");
        std::fs::write(&path, r#"{"geoapify": {"api_key": "g"}}"#).unwrap();

        let source = BundleSource::from_file(&path).unwrap();
        assert_eq!(source.path(), Some(path.as_path()));
        assert_eq!(source.get("GEOAPIFY_API_KEY").unwrap().as_deref(), Some("g"));
    }
}
