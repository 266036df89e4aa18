//! Error taxonomy for the dispatch and normalization engine
//!
//! Per-candidate failures ([`AttemptError`]) are caught and recorded by the
//! dispatcher. Only total exhaustion ([`DispatchError`]) reaches the caller,
//! carrying one [`FailedAttempt`] per candidate that was tried.

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::descriptor::Capability;

/// A provider's required configuration could not be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// One or more required keys resolved to nothing or to an empty string
    #[error("Provider '{provider}' is missing required configuration: {}", .missing.join(", "))]
    MissingKeys {
        provider: String,
        missing: Vec<String>,
    },

    /// The configuration source itself failed while resolving a key
    #[error("Provider '{provider}' could not read configuration key {key}: {message}")]
    SourceFailed {
        provider: String,
        key: String,
        message: String,
    },
}

impl ConfigurationError {
    /// Keys reported as missing (empty for source failures)
    pub fn missing_keys(&self) -> &[String] {
        match self {
            ConfigurationError::MissingKeys { missing, .. } => missing,
            ConfigurationError::SourceFailed { .. } => &[],
        }
    }
}

/// A provider response could not be projected onto the canonical schema
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizationError {
    /// A numeric field carried something that is not a number
    #[error("{field} is not numeric: {value}")]
    NonNumeric { field: &'static str, value: String },

    /// A coordinate was not finite or fell outside its valid range
    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    /// The response shape does not match what the provider mapping expects
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The response body is a provider-side refusal, e.g. `REQUEST_DENIED`
    #[error("Provider returned status {0}")]
    ProviderStatus(String),
}

impl NormalizationError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        NormalizationError::Malformed(msg.into())
    }

    pub fn provider_status(status: impl Into<String>) -> Self {
        NormalizationError::ProviderStatus(status.into())
    }
}

/// Stable classification of a per-candidate failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    CapabilityNotSupported,
    RateLimit,
    ProviderRequest,
    Normalization,
    Timeout,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::CapabilityNotSupported => "capability_not_supported",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ProviderRequest => "provider_request",
            ErrorKind::Normalization => "normalization",
            ErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single candidate provider failed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttemptError {
    /// The provider does not implement the requested operation
    #[error("Operation {operation} is not supported")]
    CapabilityNotSupported { operation: Capability },

    /// Required configuration is missing; no call was made
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The provider kept signalling throttling until the retry budget ran out
    #[error("Rate limited after {attempts} attempt(s): {message}")]
    RateLimited { attempts: u32, message: String },

    /// Network, HTTP or provider-side data failure
    #[error("Provider request failed: {0}")]
    Request(String),

    /// The response could not be normalized
    #[error("Normalization failed: {0}")]
    Normalization(#[source] NormalizationError),

    /// The request deadline expired while this candidate was in flight
    #[error("Timed out after {elapsed_ms}ms")]
    TimedOut { elapsed_ms: u64 },
}

impl From<NormalizationError> for AttemptError {
    /// A provider-reported status is a request failure, not bad data
    fn from(error: NormalizationError) -> Self {
        match error {
            NormalizationError::ProviderStatus(_) => AttemptError::Request(error.to_string()),
            other => AttemptError::Normalization(other),
        }
    }
}

impl AttemptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AttemptError::CapabilityNotSupported { .. } => ErrorKind::CapabilityNotSupported,
            AttemptError::Configuration(_) => ErrorKind::Configuration,
            AttemptError::RateLimited { .. } => ErrorKind::RateLimit,
            AttemptError::Request(_) => ErrorKind::ProviderRequest,
            AttemptError::Normalization(_) => ErrorKind::Normalization,
            AttemptError::TimedOut { .. } => ErrorKind::Timeout,
        }
    }

    /// Only throttling is eligible for automatic retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, AttemptError::RateLimited { .. })
    }
}

/// One entry of the diagnostic trail: which provider failed and why
#[derive(Debug, Clone, PartialEq)]
pub struct FailedAttempt {
    pub provider: String,
    pub error: AttemptError,
}

impl FailedAttempt {
    pub fn new(provider: impl Into<String>, error: AttemptError) -> Self {
        Self {
            provider: provider.into(),
            error,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl fmt::Display for FailedAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.provider, self.error.kind(), self.error)
    }
}

fn summarize(attempts: &[FailedAttempt]) -> String {
    if attempts.is_empty() {
        return "no candidate providers".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Terminal failure of one logical operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// Every candidate was tried and every one failed
    #[error("All providers failed for {operation}: {}", summarize(.attempts))]
    AllProvidersFailed {
        operation: Capability,
        attempts: Vec<FailedAttempt>,
    },

    /// The caller's deadline expired before any candidate succeeded
    #[error(
        "Deadline of {}ms exceeded for {operation}: {}",
        .timeout.as_millis(),
        summarize(.attempts)
    )]
    DeadlineExceeded {
        operation: Capability,
        timeout: Duration,
        attempts: Vec<FailedAttempt>,
    },

    /// An explicitly requested provider is not registered
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// The operation arguments were rejected before any provider was tried
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl DispatchError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        DispatchError::InvalidRequest(msg.into())
    }

    /// Per-candidate diagnostics, in the order candidates were tried
    pub fn attempts(&self) -> &[FailedAttempt] {
        match self {
            DispatchError::AllProvidersFailed { attempts, .. }
            | DispatchError::DeadlineExceeded { attempts, .. } => attempts,
            DispatchError::UnknownProvider(_) | DispatchError::InvalidRequest(_) => &[],
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, DispatchError::DeadlineExceeded { .. })
    }

    /// Errors the caller can fix by changing its arguments
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownProvider(_) | DispatchError::InvalidRequest(_)
        )
    }
}

/// Registry bookkeeping failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Provider already registered: {0}")]
    DuplicateProvider(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl From<RegistryError> for DispatchError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::UnknownProvider(name) => DispatchError::UnknownProvider(name),
            RegistryError::DuplicateProvider(name) => {
                DispatchError::InvalidRequest(format!("provider listed twice: {}", name))
            }
        }
    }
}
