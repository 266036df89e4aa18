//! Environment variable configuration sources
//!
//! This module provides sources for:
//! - Raw process environment variables, optionally prefixed
//! - `.env` files, parsed once and cached
//!
//! # Example
//!
//! ```rust,ignore
//! use geoaddress_core::config::{DotEnvSource, EnvSource};
//!
//! // GEO_MAPBOX_ACCESS_TOKEN satisfies MAPBOX_ACCESS_TOKEN
//! let env = EnvSource::with_prefix("GEO");
//! let dotenv = DotEnvSource::from_file(".env")?;
//! ```

use super::traits::{ConfigSource, ConfigSourceError, SourceResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Source backed by the process environment
///
/// Reflects the environment at lookup time.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    prefix: Option<String>,
}

impl EnvSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only variables named `{PREFIX}_{KEY}` are considered
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    /// Environment variable name consulted for a configuration key
    pub fn variable_name(&self, key: &str) -> String {
        let key = key.replace(['-', '.'], "_").to_uppercase();
        match &self.prefix {
            Some(prefix) => format!("{}_{}", prefix.to_uppercase(), key),
            None => key,
        }
    }
}

impl ConfigSource for EnvSource {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> SourceResult<Option<String>> {
        let var_name = self.variable_name(key);
        match std::env::var(&var_name) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigSourceError::InvalidValue {
                key: var_name,
                message: "contains invalid UTF-8".to_string(),
            }),
        }
    }
}

/// Source backed by a `.env` file
///
/// # File Format
///
/// ```text
/// # Comment
/// NOMINATIM_USER_AGENT=my-app/1.0
/// export MAPBOX_ACCESS_TOKEN="pk.abc"
/// HERE_APP_CODE='quoted value'
/// ```
#[derive(Debug)]
pub struct DotEnvSource {
    path: PathBuf,
    cache: RwLock<Option<HashMap<String, String>>>,
}

impl DotEnvSource {
    /// Create a source for an existing `.env` file; it is read lazily
    pub fn from_file(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(ConfigSourceError::Io(format!(
                ".env file not found: {}",
                path.display()
            )));
        }
        Ok(Self {
            path,
            cache: RwLock::new(None),
        })
    }

    /// Parse `.env` content directly
    pub fn from_string(content: &str) -> Self {
        Self {
            path: PathBuf::new(),
            cache: RwLock::new(Some(parse_dotenv(content))),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the backing file
    pub fn refresh(&self) -> SourceResult<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(());
        }
        let content = std::fs::read_to_string(&self.path)?;
        let parsed = parse_dotenv(&content);
        *self
            .cache
            .write()
            .map_err(|e| ConfigSourceError::Lock(e.to_string()))? = Some(parsed);
        Ok(())
    }

    fn ensure_loaded(&self) -> SourceResult<()> {
        let loaded = self
            .cache
            .read()
            .map_err(|e| ConfigSourceError::Lock(e.to_string()))?
            .is_some();
        if !loaded {
            self.refresh()?;
        }
        Ok(())
    }
}

impl ConfigSource for DotEnvSource {
    fn name(&self) -> &str {
        "dotenv"
    }

    fn get(&self, key: &str) -> SourceResult<Option<String>> {
        self.ensure_loaded()?;
        let cache = self
            .cache
            .read()
            .map_err(|e| ConfigSourceError::Lock(e.to_string()))?;
        Ok(cache.as_ref().and_then(|values| values.get(key).cloned()))
    }
}

fn parse_dotenv(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let mut value = value.trim().to_string();
        let quoted = value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')));
        if quoted {
            value = value[1..value.len() - 1].to_string();
        }

        value = value
            .replace("\\n", "\n")
            .replace("\\t", "\t")
            .replace("\\r", "\r");

        values.insert(key.to_string(), value);
    }

    values
}
