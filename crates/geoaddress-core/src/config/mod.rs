//! Provider configuration
//!
//! Configuration sources are simple key/value lookups:
//!
//! - [`EnvSource`]: process environment variables
//! - [`DotEnvSource`]: `.env` files
//! - [`BundleSource`]: JSON, YAML and TOML files
//! - [`MapSource`]: in-memory values
//! - [`LayeredSource`]: a priority chain of the above
//!
//! [`ConfigValidator`] resolves a provider's declared keys against any of them.

pub mod bundles;
pub mod chain;
pub mod env;
pub mod traits;
pub mod validator;

pub use bundles::{BundleFormat, BundleSource};
pub use chain::{LayeredSource, LayeredSourceBuilder};
pub use env::{DotEnvSource, EnvSource};
pub use traits::{ConfigSource, ConfigSourceError, MapSource, SourceResult};
pub use validator::{ConfigValidator, ResolvedConfig};
