//! Geoaddress Core
//!
//! A unified geocoding facade. A caller asks for one of four logical
//! operations (forward search, lookup by reference, reverse geocode, lookup by
//! OpenStreetMap element) and receives [`AddressRecord`]s in one fixed schema,
//! whichever third-party service actually answered.
//!
//! # Architecture
//!
//! 1. **Descriptors** (`descriptor`): static metadata per provider, covering
//!    identity, configuration keys and supported capabilities.
//! 2. **Configuration** (`config`): pluggable key/value sources (environment,
//!    `.env`, JSON/YAML/TOML bundles) and the validator that resolves a
//!    provider's configuration before any network work.
//! 3. **Adapters** (`adapter`): the per-provider call into the third-party
//!    service. Implemented outside this crate; a replaying
//!    [`FixtureAdapter`] is bundled for offline use.
//! 4. **Normalization** (`normalize`, `providers`): per-provider field mapping
//!    tables and the normalizer that produces canonical records.
//! 5. **Dispatch** (`dispatch`, `geocoder`): ordered, short-circuiting
//!    fallback across candidates with rate-limit retry and a whole-request
//!    deadline.
//!
//! # Example
//!
//! ```rust,ignore
//! use geoaddress_core::{Geocoder, LookupOptions, ProviderRegistry};
//! use geoaddress_core::config::EnvSource;
//! use std::sync::Arc;
//!
//! let registry = ProviderRegistry::with_builtin_providers(|descriptor| adapters.get(descriptor.name()).cloned());
//! let geocoder = Geocoder::new(Arc::new(registry), Arc::new(EnvSource::new()));
//!
//! let options = LookupOptions::new().with_providers(["nominatim", "photon"]);
//! let addresses = geocoder.search_addresses("10 Downing Street, London", &options).await?;
//! ```

pub mod adapter;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod geocoder;
pub mod model;
pub mod normalize;
pub mod providers;
pub mod registry;
pub mod request;
pub mod telemetry;

pub use adapter::{AdapterError, FixtureAdapter, ProviderAdapter};
pub use config::{ConfigSource, ConfigValidator, ResolvedConfig};
pub use descriptor::{Capability, ProviderDescriptor};
pub use dispatch::{DispatchPolicy, Dispatcher, RetryPolicy};
pub use error::{
    AttemptError, ConfigurationError, DispatchError, ErrorKind, FailedAttempt, NormalizationError,
    RegistryError,
};
pub use geocoder::{Geocoder, LookupOptions};
pub use model::{AddressFields, AddressRecord, RawResponse};
pub use normalize::{FieldMapping, Normalizer, ScoringContext};
pub use registry::{ProviderRegistry, RegisteredProvider};
pub use request::{OsmLookup, OsmType, Point, Request};
pub use telemetry::DispatchMetrics;

/// Crate version (from Cargo.toml)
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
