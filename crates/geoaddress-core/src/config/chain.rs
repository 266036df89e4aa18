//! Layered configuration sources
//!
//! Combines several sources into a priority-ordered chain. When resolving a
//! key, sources are tried in order until one returns a value.
//!
//! # Example
//!
//! ```rust,ignore
//! use geoaddress_core::config::LayeredSource;
//!
//! // Environment over .env over bundle file
//! let source = LayeredSource::builder()
//!     .with_env()
//!     .with_dotenv_if_exists(".env")
//!     .with_bundle_if_exists("geoaddress.yaml")?
//!     .build();
//! ```

use super::bundles::BundleSource;
use super::env::{DotEnvSource, EnvSource};
use super::traits::{ConfigSource, ConfigSourceError, MapSource, SourceResult};
use std::path::Path;
use std::sync::Arc;

/// A chain of configuration sources with priority ordering
///
/// Sources added first have higher priority. A failing source is logged and
/// skipped; its error is returned only if no other source had the key.
#[derive(Default, Clone)]
pub struct LayeredSource {
    sources: Vec<Arc<dyn ConfigSource>>,
}

impl std::fmt::Debug for LayeredSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredSource")
            .field("sources", &self.source_names())
            .finish()
    }
}

impl LayeredSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> LayeredSourceBuilder {
        LayeredSourceBuilder::new()
    }

    /// Add a source with lower priority than those already present
    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Arc::new(source));
        self
    }

    pub fn push(&mut self, source: Arc<dyn ConfigSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Source names in priority order
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

impl ConfigSource for LayeredSource {
    fn name(&self) -> &str {
        "layered"
    }

    fn get(&self, key: &str) -> SourceResult<Option<String>> {
        let mut last_error: Option<ConfigSourceError> = None;

        for source in &self.sources {
            match source.get(key) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => continue,
                Err(e) => {
                    tracing::debug!(
                        source = source.name(),
                        key = key,
                        error = %e,
                        "Configuration source returned error, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(None),
        }
    }
}

/// Builder for [`LayeredSource`] with convenience methods for common sources
#[derive(Default)]
pub struct LayeredSourceBuilder {
    chain: LayeredSource,
}

impl LayeredSourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the process environment
    pub fn with_env(mut self) -> Self {
        self.chain = self.chain.with_source(EnvSource::new());
        self
    }

    /// Add the process environment, reading `{PREFIX}_{KEY}` variables
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.chain = self.chain.with_source(EnvSource::with_prefix(prefix));
        self
    }

    /// Add a `.env` file (fails if it does not exist)
    pub fn with_dotenv(mut self, path: impl AsRef<Path>) -> SourceResult<Self> {
        self.chain = self.chain.with_source(DotEnvSource::from_file(path)?);
        Ok(self)
    }

    /// Add a `.env` file only if it exists
    pub fn with_dotenv_if_exists(mut self, path: impl AsRef<Path>) -> Self {
        if let Ok(source) = DotEnvSource::from_file(path) {
            self.chain = self.chain.with_source(source);
        }
        self
    }

    /// Add a JSON/YAML/TOML bundle (fails if it cannot be read or parsed)
    pub fn with_bundle(mut self, path: impl AsRef<Path>) -> SourceResult<Self> {
        self.chain = self.chain.with_source(BundleSource::from_file(path)?);
        Ok(self)
    }

    /// Add a bundle only if the file exists; a present but invalid file is an error
    pub fn with_bundle_if_exists(self, path: impl AsRef<Path>) -> SourceResult<Self> {
        if path.as_ref().exists() {
            self.with_bundle(path)
        } else {
            Ok(self)
        }
    }

    pub fn with_map(mut self, source: MapSource) -> Self {
        self.chain = self.chain.with_source(source);
        self
    }

    pub fn with_source<S: ConfigSource + 'static>(mut self, source: S) -> Self {
        self.chain = self.chain.with_source(source);
        self
    }

    pub fn build(self) -> LayeredSource {
        self.chain
    }
}
