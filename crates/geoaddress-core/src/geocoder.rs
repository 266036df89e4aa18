//! Caller-facing geocoding operations
//!
//! [`Geocoder`] turns the four logical operations into [`Request`]s, picks
//! candidates from the registry and hands them to the [`Dispatcher`].

use std::sync::Arc;
use std::time::Duration;

use crate::config::ConfigSource;
use crate::dispatch::{DispatchPolicy, Dispatcher, RetryPolicy};
use crate::error::DispatchError;
use crate::model::{AddressRecord, RawResponse};
use crate::registry::{ProviderRegistry, RegisteredProvider};
use crate::request::{OsmLookup, Point, Request};
use crate::telemetry::DispatchMetrics;

/// Per-call options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupOptions {
    /// Explicit candidate list in priority order; registry default when unset
    pub providers: Option<Vec<String>>,
    pub timeout: Option<Duration>,
    pub retry: Option<RetryPolicy>,
    /// Bias point for search relevance
    pub proximity: Option<Point>,
    /// Keep only the first record of the winning provider
    pub first_only: bool,
}

impl LookupOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_providers<I, S>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.providers = Some(providers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn with_proximity(mut self, proximity: Point) -> Self {
        self.proximity = Some(proximity);
        self
    }

    pub fn first_only(mut self, first_only: bool) -> Self {
        self.first_only = first_only;
        self
    }
}

/// Unified geocoding facade
#[derive(Debug, Clone)]
pub struct Geocoder {
    registry: Arc<ProviderRegistry>,
    dispatcher: Dispatcher,
    defaults: DispatchPolicy,
}

impl Geocoder {
    pub fn new(registry: Arc<ProviderRegistry>, config: Arc<dyn ConfigSource>) -> Self {
        Self {
            registry,
            dispatcher: Dispatcher::new(config),
            defaults: DispatchPolicy::default(),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.dispatcher = self.dispatcher.with_metrics(metrics);
        self
    }

    /// Policy used when a call does not override retry or timeout
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.defaults = policy;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Free-text forward geocoding
    pub async fn search_addresses(
        &self,
        query: &str,
        options: &LookupOptions,
    ) -> Result<Vec<AddressRecord>, DispatchError> {
        let request = match options.proximity {
            Some(point) => Request::search_near(query, point),
            None => Request::search(query),
        };
        self.execute(&request, options).await
    }

    /// Lookup by a provider-native identifier
    pub async fn get_address_by_reference(
        &self,
        reference: &str,
        options: &LookupOptions,
    ) -> Result<Vec<AddressRecord>, DispatchError> {
        self.execute(&Request::reference(reference), options).await
    }

    pub async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
        options: &LookupOptions,
    ) -> Result<Vec<AddressRecord>, DispatchError> {
        self.execute(&Request::reverse(latitude, longitude), options)
            .await
    }

    /// Lookup by OSM element, e.g. `("9550582112", "node")`
    pub async fn get_address_by_osm(
        &self,
        osm_id: &str,
        osm_type: &str,
        options: &LookupOptions,
    ) -> Result<Vec<AddressRecord>, DispatchError> {
        let lookup = OsmLookup::element(osm_id, osm_type)?;
        self.execute(&Request::osm(lookup), options).await
    }

    /// Lookup by OSM tag filter, e.g. `[("amenity", "townhall")]`
    pub async fn get_address_by_osm_tags<I, K, V>(
        &self,
        tags: I,
        options: &LookupOptions,
    ) -> Result<Vec<AddressRecord>, DispatchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let lookup = OsmLookup::tags(tags)?;
        self.execute(&Request::osm(lookup), options).await
    }

    /// Dispatch an already-built request
    pub async fn execute(
        &self,
        request: &Request,
        options: &LookupOptions,
    ) -> Result<Vec<AddressRecord>, DispatchError> {
        let candidates = self.candidates(options)?;
        let mut records = self
            .dispatcher
            .execute(request, &candidates, &self.policy(options))
            .await?;
        if options.first_only {
            records.truncate(1);
        }
        Ok(records)
    }

    /// Dispatch with the same fallback, returning the winning provider's
    /// native response unnormalized
    ///
    /// `first_only` and `proximity` have no effect here.
    pub async fn execute_raw(
        &self,
        request: &Request,
        options: &LookupOptions,
    ) -> Result<RawResponse, DispatchError> {
        let candidates = self.candidates(options)?;
        self.dispatcher
            .execute_raw(request, &candidates, &self.policy(options))
            .await
    }

    fn policy(&self, options: &LookupOptions) -> DispatchPolicy {
        DispatchPolicy {
            retry: options
                .retry
                .clone()
                .unwrap_or_else(|| self.defaults.retry.clone()),
            timeout: options.timeout.or(self.defaults.timeout),
        }
    }

    fn candidates(
        &self,
        options: &LookupOptions,
    ) -> Result<Vec<Arc<RegisteredProvider>>, DispatchError> {
        match &options.providers {
            Some(names) => Ok(self.registry.resolve(names.as_slice())?),
            None => Ok(self.registry.default_order()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{FixtureAdapter, ProviderAdapter};
    use crate::config::MapSource;
    use crate::descriptor::Capability;
    use serde_json::json;

    fn geocoder() -> (Geocoder, Arc<FixtureAdapter>, Arc<FixtureAdapter>) {
        let nominatim = Arc::new(FixtureAdapter::new().respond(
            Capability::SearchAddresses,
            json!([{"place_id": 1, "display_name": "Paris, France", "lat": "48.85", "lon": "2.35"}]),
        ));
        let photon = Arc::new(FixtureAdapter::new().respond(
            Capability::SearchAddresses,
            json!({"type": "FeatureCollection", "features": []}),
        ));
        let (n, p) = (Arc::clone(&nominatim), Arc::clone(&photon));
        let registry = ProviderRegistry::with_builtin_providers(move |d| match d.name() {
            "nominatim" => Some(Arc::clone(&n) as Arc<dyn ProviderAdapter>),
            "photon" => Some(Arc::clone(&p) as Arc<dyn ProviderAdapter>),
            _ => None,
        });
        let geocoder = Geocoder::new(Arc::new(registry), Arc::new(MapSource::new()));
        (geocoder, nominatim, photon)
    }

    #[tokio::test]
    async fn test_default_order_is_used() {
        let (geocoder, nominatim, photon) = geocoder();
        let records = geocoder
            .search_addresses("Paris", &LookupOptions::new())
            .await
            .unwrap();
        assert_eq!(records[0].backend_name, "nominatim");
        assert_eq!(nominatim.calls(Capability::SearchAddresses), 1);
        assert_eq!(photon.calls(Capability::SearchAddresses), 0);
    }

    #[tokio::test]
    async fn test_explicit_providers_override_order() {
        let (geocoder, nominatim, _photon) = geocoder();
        let records = geocoder
            .search_addresses("Paris", &LookupOptions::new().with_providers(["photon", "nominatim"]))
            .await
            .unwrap();
        // photon answered with no results, which is a success
        assert!(records.is_empty());
        assert_eq!(nominatim.calls(Capability::SearchAddresses), 0);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_rejected() {
        let (geocoder, nominatim, _photon) = geocoder();
        let err = geocoder
            .search_addresses("Paris", &LookupOptions::new().with_providers(["nominatim", "bing"]))
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::UnknownProvider("bing".into()));
        assert!(err.is_user_error());
        assert_eq!(nominatim.calls(Capability::SearchAddresses), 0);
    }

    #[tokio::test]
    async fn test_first_only_keeps_one_record() {
        let many = Arc::new(FixtureAdapter::new().respond(
            Capability::SearchAddresses,
            json!([
                {"place_id": 1, "lat": "48.85", "lon": "2.35"},
                {"place_id": 2, "lat": "45.76", "lon": "4.83"}
            ]),
        ));
        let bound = Arc::clone(&many);
        let registry = ProviderRegistry::with_builtin_providers(move |d| {
            (d.name() == "nominatim").then(|| Arc::clone(&bound) as Arc<dyn ProviderAdapter>)
        });
        let geocoder = Geocoder::new(Arc::new(registry), Arc::new(MapSource::new()));

        let all = geocoder
            .search_addresses("Paris", &LookupOptions::new())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let first = geocoder
            .search_addresses("Paris", &LookupOptions::new().first_only(true))
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].reference.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_raw_returns_native_response_of_winner() {
        let (geocoder, nominatim, photon) = geocoder();
        let raw = geocoder
            .execute_raw(
                &Request::search("Paris"),
                &LookupOptions::new().with_providers(["photon", "nominatim"]),
            )
            .await
            .unwrap();

        assert_eq!(raw.provider, "photon");
        assert_eq!(raw.response, json!({"type": "FeatureCollection", "features": []}));
        assert_eq!(photon.calls(Capability::SearchAddresses), 1);
        assert_eq!(nominatim.calls(Capability::SearchAddresses), 0);
    }

    #[tokio::test]
    async fn test_bad_osm_arguments_fail_before_dispatch() {
        let (geocoder, _nominatim, _photon) = geocoder();
        let err = geocoder
            .get_address_by_osm("abc", "node", &LookupOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidRequest(_)));

        let err = geocoder
            .get_address_by_osm_tags(Vec::<(String, String)>::new(), &LookupOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidRequest(_)));

        let err = geocoder
            .reverse_geocode(95.0, 0.0, &LookupOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidRequest(_)));
    }
}
