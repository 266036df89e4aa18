//! Provider adapter interface
//!
//! An adapter performs the native call into one third-party service and
//! returns its raw response untouched. HTTP clients live outside this crate;
//! [`FixtureAdapter`] replays recorded responses for offline use and tests.

pub mod fixture;

pub use fixture::{FixtureAdapter, FixtureError};

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::ResolvedConfig;
use crate::request::Request;

/// Failure of a native provider call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdapterError {
    /// The provider signalled throttling; the only retryable failure
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        /// Provider hint for how long to wait before retrying
        retry_after: Option<Duration>,
    },

    /// Network, HTTP or provider-side data failure
    #[error("{0}")]
    Request(String),
}

impl AdapterError {
    pub fn rate_limited(message: impl Into<String>) -> Self {
        AdapterError::RateLimited {
            message: message.into(),
            retry_after: None,
        }
    }

    pub fn request(message: impl Into<String>) -> Self {
        AdapterError::Request(message.into())
    }

    /// Attach a retry hint; no effect on non-throttling errors
    pub fn with_retry_after(self, delay: Duration) -> Self {
        match self {
            AdapterError::RateLimited { message, .. } => AdapterError::RateLimited {
                message,
                retry_after: Some(delay),
            },
            other => other,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, AdapterError::RateLimited { .. })
    }
}

/// The native call into one provider
///
/// Implementations receive the provider's resolved configuration and one
/// [`Request`]. They are only invoked for capabilities the provider's
/// descriptor declares, after its configuration has validated.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Perform the call and return the provider's raw response
    async fn call(&self, config: &ResolvedConfig, request: &Request) -> Result<Value, AdapterError>;
}
