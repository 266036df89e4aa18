//! Static provider metadata
//!
//! A [`ProviderDescriptor`] is built once at registration time and shared
//! read-only across requests. It names the provider, lists the configuration
//! keys it consumes and declares which logical operations it supports.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// One of the four logical operations a provider may support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    SearchAddresses,
    GetAddressByReference,
    ReverseGeocode,
    GetAddressByOsm,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::SearchAddresses,
        Capability::GetAddressByReference,
        Capability::ReverseGeocode,
        Capability::GetAddressByOsm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::SearchAddresses => "search_addresses",
            Capability::GetAddressByReference => "get_address_by_reference",
            Capability::ReverseGeocode => "reverse_geocode",
            Capability::GetAddressByOsm => "get_address_by_osm",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "search_addresses" | "search" => Ok(Capability::SearchAddresses),
            "get_address_by_reference" | "reference" => Ok(Capability::GetAddressByReference),
            "reverse_geocode" | "reverse" => Ok(Capability::ReverseGeocode),
            "get_address_by_osm" | "osm" => Ok(Capability::GetAddressByOsm),
            _ => Err(format!("Unknown operation: {}", s)),
        }
    }
}

/// Identity, configuration needs and capabilities of one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDescriptor {
    name: String,
    display_name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    documentation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    site_url: Option<String>,
    capabilities: BTreeSet<Capability>,
    config_keys: Vec<String>,
    config_defaults: BTreeMap<String, String>,
    config_required: BTreeSet<String>,
}

impl ProviderDescriptor {
    /// Start describing a provider
    pub fn builder(name: impl Into<String>, display_name: impl Into<String>) -> DescriptorBuilder {
        DescriptorBuilder::new(name, display_name)
    }

    /// Stable identifier, used as `backend_name` and in `geoaddress_id`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name, used as `backend`
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn documentation_url(&self) -> Option<&str> {
        self.documentation_url.as_deref()
    }

    pub fn site_url(&self) -> Option<&str> {
        self.site_url.as_deref()
    }

    pub fn capabilities(&self) -> &BTreeSet<Capability> {
        &self.capabilities
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Configuration keys in declaration order
    pub fn config_keys(&self) -> &[String] {
        &self.config_keys
    }

    pub fn config_defaults(&self) -> &BTreeMap<String, String> {
        &self.config_defaults
    }

    pub fn default_for(&self, key: &str) -> Option<&str> {
        self.config_defaults.get(key).map(String::as_str)
    }

    pub fn config_required(&self) -> &BTreeSet<String> {
        &self.config_required
    }

    pub fn is_required(&self, key: &str) -> bool {
        self.config_required.contains(key)
    }
}

/// Builder for [`ProviderDescriptor`]
///
/// Declaring a default or a requirement for a key also declares the key, so a
/// built descriptor always has `config_required ⊆ config_keys`.
#[derive(Debug)]
pub struct DescriptorBuilder {
    descriptor: ProviderDescriptor,
}

impl DescriptorBuilder {
    fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            descriptor: ProviderDescriptor {
                name: name.into(),
                description: format!("{} provider", display_name),
                display_name,
                documentation_url: None,
                site_url: None,
                capabilities: BTreeSet::new(),
                config_keys: Vec::new(),
                config_defaults: BTreeMap::new(),
                config_required: BTreeSet::new(),
            },
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.descriptor.description = description.into();
        self
    }

    pub fn documentation_url(mut self, url: impl Into<String>) -> Self {
        self.descriptor.documentation_url = Some(url.into());
        self
    }

    pub fn site_url(mut self, url: impl Into<String>) -> Self {
        self.descriptor.site_url = Some(url.into());
        self
    }

    pub fn capability(mut self, capability: Capability) -> Self {
        self.descriptor.capabilities.insert(capability);
        self
    }

    pub fn capabilities<I>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = Capability>,
    {
        self.descriptor.capabilities.extend(capabilities);
        self
    }

    /// Declare a configuration key (idempotent, keeps first position)
    pub fn config_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.descriptor.config_keys.contains(&key) {
            self.descriptor.config_keys.push(key);
        }
        self
    }

    pub fn config_default(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let mut builder = self.config_key(key.clone());
        builder.descriptor.config_defaults.insert(key, value.into());
        builder
    }

    pub fn required(self, key: impl Into<String>) -> Self {
        let key = key.into();
        let mut builder = self.config_key(key.clone());
        builder.descriptor.config_required.insert(key);
        builder
    }

    pub fn build(self) -> ProviderDescriptor {
        self.descriptor
    }
}
