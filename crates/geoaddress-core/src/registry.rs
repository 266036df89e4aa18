//! Provider registry
//!
//! An explicit name → descriptor + mapping + adapter table, built once at
//! startup and shared read-only. How it gets populated is up to the caller;
//! [`ProviderRegistry::with_builtin_providers`] binds the built-in catalogue
//! to whatever adapters the caller has.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::ProviderAdapter;
use crate::descriptor::ProviderDescriptor;
use crate::error::RegistryError;
use crate::normalize::{FieldMapping, Normalizer};
use crate::providers;

/// A provider ready for dispatch
#[derive(Clone)]
pub struct RegisteredProvider {
    pub descriptor: Arc<ProviderDescriptor>,
    pub mapping: Arc<dyn FieldMapping>,
    pub adapter: Arc<dyn ProviderAdapter>,
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.descriptor.name())
            .field("capabilities", self.descriptor.capabilities())
            .finish()
    }
}

impl RegisteredProvider {
    pub fn new(
        descriptor: ProviderDescriptor,
        mapping: Arc<dyn FieldMapping>,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            mapping,
            adapter,
        }
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(
            self.descriptor.name(),
            self.descriptor.display_name(),
            Arc::clone(&self.mapping),
        )
    }
}

/// Registered providers plus their default priority order
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<RegisteredProvider>>,
    order: Vec<String>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind built-in providers to adapters
    ///
    /// `adapter_for` is asked once per built-in descriptor, in default order;
    /// providers it returns `None` for are left out.
    pub fn with_builtin_providers<F>(mut adapter_for: F) -> Self
    where
        F: FnMut(&ProviderDescriptor) -> Option<Arc<dyn ProviderAdapter>>,
    {
        let mut registry = Self::new();
        for builtin in providers::catalogue() {
            if let Some(adapter) = adapter_for(&builtin.descriptor) {
                let provider = RegisteredProvider::new(builtin.descriptor, builtin.mapping, adapter);
                // Built-in names are unique, so registration cannot collide
                if let Err(e) = registry.register(provider) {
                    tracing::warn!(error = %e, "Skipping built-in provider");
                }
            }
        }
        registry
    }

    /// Register a provider at the end of the default order
    pub fn register(&mut self, provider: RegisteredProvider) -> Result<(), RegistryError> {
        let name = provider.name().to_string();
        if self.providers.contains_key(&name) {
            return Err(RegistryError::DuplicateProvider(name));
        }
        tracing::debug!(provider = %name, "Registered provider");
        self.order.push(name.clone());
        self.providers.insert(name, Arc::new(provider));
        Ok(())
    }

    /// Builder-style [`register`](Self::register)
    pub fn with_provider(mut self, provider: RegisteredProvider) -> Result<Self, RegistryError> {
        self.register(provider)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<RegisteredProvider>> {
        self.providers.get(name).cloned()
    }

    /// All providers in default order
    pub fn list(&self) -> Vec<Arc<RegisteredProvider>> {
        self.order
            .iter()
            .filter_map(|name| self.providers.get(name).cloned())
            .collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn default_order(&self) -> Vec<Arc<RegisteredProvider>> {
        self.list()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Replace the default order; every registered provider must appear once
    pub fn set_default_order<I, S>(&mut self, names: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut order: Vec<String> = Vec::with_capacity(self.order.len());
        for name in names {
            let name = name.into();
            if !self.providers.contains_key(&name) {
                return Err(RegistryError::UnknownProvider(name));
            }
            if order.contains(&name) {
                return Err(RegistryError::DuplicateProvider(name));
            }
            order.push(name);
        }
        // Unlisted providers keep their relative order at the end
        for name in &self.order {
            if !order.contains(name) {
                order.push(name.clone());
            }
        }
        self.order = order;
        Ok(())
    }

    /// Candidates for an explicit provider list, preserving its order
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<Arc<RegisteredProvider>>, RegistryError> {
        let mut seen: Vec<&str> = Vec::with_capacity(names.len());
        let mut resolved = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let provider = self
                .get(name)
                .ok_or_else(|| RegistryError::UnknownProvider(name.to_string()))?;
            if seen.contains(&name) {
                return Err(RegistryError::DuplicateProvider(name.to_string()));
            }
            seen.push(name);
            resolved.push(provider);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::FixtureAdapter;
    use crate::providers::nominatim::OsmPlaceMapping;

    fn provider(name: &str) -> RegisteredProvider {
        RegisteredProvider::new(
            ProviderDescriptor::builder(name, name.to_uppercase()).build(),
            Arc::new(OsmPlaceMapping),
            Arc::new(FixtureAdapter::new()),
        )
    }

    #[test]
    fn test_register_and_order() {
        let mut registry = ProviderRegistry::new();
        registry.register(provider("a")).unwrap();
        registry.register(provider("b")).unwrap();
        registry.register(provider("c")).unwrap();

        assert_eq!(registry.names(), vec!["a", "b", "c"]);
        assert_eq!(
            registry.register(provider("b")),
            Err(RegistryError::DuplicateProvider("b".into()))
        );

        registry.set_default_order(["c", "a"]).unwrap();
        assert_eq!(registry.names(), vec!["c", "a", "b"]);
        assert!(registry.set_default_order(["x"]).is_err());
        assert!(registry.set_default_order(["a", "a"]).is_err());
    }

    #[test]
    fn test_resolve_explicit_order() {
        let registry = ProviderRegistry::new()
            .with_provider(provider("a"))
            .unwrap()
            .with_provider(provider("b"))
            .unwrap();

        let resolved = registry.resolve(&["b", "a"]).unwrap();
        let names: Vec<&str> = resolved.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["b", "a"]);

        assert_eq!(
            registry.resolve(&["a", "zzz"]).unwrap_err(),
            RegistryError::UnknownProvider("zzz".into())
        );
        assert!(registry.resolve(&["a", "a"]).is_err());
    }

    #[test]
    fn test_builtin_binding() {
        let registry = ProviderRegistry::with_builtin_providers(|descriptor| {
            matches!(descriptor.name(), "photon" | "google")
                .then(|| Arc::new(FixtureAdapter::new()) as Arc<dyn ProviderAdapter>)
        });
        assert_eq!(registry.names(), vec!["photon", "google"]);
        let google = registry.get("google").unwrap();
        assert_eq!(google.normalizer().backend_name(), "google");
    }
}
