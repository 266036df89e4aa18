//! Resolution of a provider's configuration against a source
//!
//! Validation runs before any network work: a provider that fails here is
//! never invoked.

use super::traits::ConfigSource;
use crate::descriptor::ProviderDescriptor;
use crate::error::ConfigurationError;
use std::fmt;

const SECRET_MARKERS: [&str; 5] = ["KEY", "TOKEN", "SECRET", "CODE", "PASSWORD"];

/// Configuration values for one provider, in `config_keys` order
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    provider: String,
    values: Vec<(String, Option<String>)>,
}

impl ResolvedConfig {
    /// Name of the provider this configuration was resolved for
    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Value of a declared key, or `None` if it resolved to nothing
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Value of a key the provider requires
    ///
    /// Validation guarantees required keys are set, so this only fails for
    /// keys that are optional or undeclared.
    pub fn require(&self, key: &str) -> Result<&str, ConfigurationError> {
        self.get(key).ok_or_else(|| ConfigurationError::MissingKeys {
            provider: self.provider.clone(),
            missing: vec![key.to_string()],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn is_secret(key: &str) -> bool {
    let key = key.to_uppercase();
    SECRET_MARKERS.iter().any(|marker| key.contains(marker))
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.values {
            match value {
                Some(_) if is_secret(key) => map.entry(key, &"<redacted>"),
                Some(v) => map.entry(key, v),
                None => map.entry(key, &Option::<&str>::None),
            };
        }
        map.finish()?;
        write!(f, " for {}", self.provider)
    }
}

/// Checks a descriptor's required configuration against a source
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Resolve every declared key: source value, else default, else null
    ///
    /// Values are trimmed and whitespace-only values count as unset. Fails
    /// with every missing required key named, in declaration order.
    pub fn validate(
        descriptor: &ProviderDescriptor,
        source: &dyn ConfigSource,
    ) -> Result<ResolvedConfig, ConfigurationError> {
        let mut values = Vec::with_capacity(descriptor.config_keys().len());
        let mut missing = Vec::new();

        for key in descriptor.config_keys() {
            let from_source = source.get(key).map_err(|e| ConfigurationError::SourceFailed {
                provider: descriptor.name().to_string(),
                key: key.clone(),
                message: e.to_string(),
            })?;

            let value = non_empty(from_source.as_deref())
                .or_else(|| non_empty(descriptor.default_for(key)));

            if value.is_none() && descriptor.is_required(key) {
                missing.push(key.clone());
            }
            values.push((key.clone(), value));
        }

        if !missing.is_empty() {
            return Err(ConfigurationError::MissingKeys {
                provider: descriptor.name().to_string(),
                missing,
            });
        }

        Ok(ResolvedConfig {
            provider: descriptor.name().to_string(),
            values,
        })
    }

    /// Required keys that would be reported missing, without failing
    ///
    /// Source errors are reported as missing keys here.
    pub fn missing_keys(descriptor: &ProviderDescriptor, source: &dyn ConfigSource) -> Vec<String> {
        match Self::validate(descriptor, source) {
            Ok(_) => Vec::new(),
            Err(ConfigurationError::MissingKeys { missing, .. }) => missing,
            Err(ConfigurationError::SourceFailed { key, .. }) => vec![key],
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
