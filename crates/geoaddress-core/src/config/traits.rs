//! Core trait for configuration sources
//!
//! A configuration source is any key/value lookup. The validator has no
//! opinion on where values come from; sources can be layered with
//! [`LayeredSource`](super::LayeredSource).

use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Errors raised by a configuration source while looking up a key
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigSourceError {
    /// The backing file could not be read
    #[error("I/O error: {0}")]
    Io(String),

    /// The backing file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// The value exists but cannot be used as text
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Internal cache lock was poisoned
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<std::io::Error> for ConfigSourceError {
    fn from(err: std::io::Error) -> Self {
        ConfigSourceError::Io(err.to_string())
    }
}

/// Result type for configuration source lookups
pub type SourceResult<T> = Result<T, ConfigSourceError>;

/// A key/value configuration lookup
///
/// `Ok(None)` means the key is not set in this source, which lets a layered
/// source fall through to the next one.
pub trait ConfigSource: Send + Sync + fmt::Debug {
    /// Short name for diagnostics
    fn name(&self) -> &str;

    /// Look up a single key
    fn get(&self, key: &str) -> SourceResult<Option<String>>;
}

/// In-memory source, mostly for tests and embedding
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for MapSource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl ConfigSource for MapSource {
    fn name(&self) -> &str {
        "map"
    }

    fn get(&self, key: &str) -> SourceResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_source_lookup() {
        let source = MapSource::new().with("GOOGLE_API_KEY", "abc");
        assert_eq!(source.get("GOOGLE_API_KEY").unwrap(), Some("abc".to_string()));
        assert_eq!(source.get("MAPBOX_ACCESS_TOKEN").unwrap(), None);
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_map_source_from_iter() {
        let source: MapSource = [("A", "1"), ("B", "2")].into_iter().collect();
        assert_eq!(source.get("B").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_source_error_display() {
        let err = ConfigSourceError::InvalidValue {
            key: "HERE_APP_ID".into(),
            message: "not UTF-8".into(),
        };
        assert_eq!(err.to_string(), "Invalid value for HERE_APP_ID: not UTF-8");
    }
}
