//! Retry and deadline policy

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Rate-limit retry within a single candidate
///
/// Only [`AdapterError::RateLimited`](crate::AdapterError::RateLimited) is
/// retried. Fallback to the next candidate is a separate loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total calls per candidate, including the first
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    pub initial_backoff_ms: u64,

    /// Upper bound for any single delay in milliseconds
    pub max_backoff_ms: u64,

    /// Multiplier applied after each retry
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A single call, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn initial_backoff_ms(mut self, backoff: u64) -> Self {
        self.initial_backoff_ms = backoff;
        self
    }

    pub fn max_backoff_ms(mut self, backoff: u64) -> Self {
        self.max_backoff_ms = backoff;
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Delay before retry number `retry` (0-based)
    ///
    /// A provider `retry_after` hint replaces the computed delay but is still
    /// capped by `max_backoff_ms`.
    pub fn backoff_for(&self, retry: u32, hint: Option<Duration>) -> Duration {
        let cap = Duration::from_millis(self.max_backoff_ms);
        if let Some(hint) = hint {
            return hint.min(cap);
        }
        let multiplier = if self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0 {
            self.backoff_multiplier
        } else {
            1.0
        };
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let backoff_ms = (self.initial_backoff_ms as f64 * multiplier.powi(exponent))
            .min(self.max_backoff_ms as f64);
        Duration::from_millis(backoff_ms as u64)
    }
}

/// Per-request dispatch options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchPolicy {
    pub retry: RetryPolicy,
    /// Bound on the whole dispatch, across every candidate
    pub timeout: Option<Duration>,
}

impl DispatchPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff_ms, 200);
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let policy = RetryPolicy::default()
            .initial_backoff_ms(100)
            .max_backoff_ms(1000)
            .backoff_multiplier(3.0);
        assert_eq!(policy.backoff_for(0, None), Duration::from_millis(100));
        assert_eq!(policy.backoff_for(1, None), Duration::from_millis(300));
        assert_eq!(policy.backoff_for(2, None), Duration::from_millis(900));
        assert_eq!(policy.backoff_for(3, None), Duration::from_millis(1000));
        assert_eq!(policy.backoff_for(u32::MAX, None), Duration::from_millis(1000));
    }

    #[test]
    fn test_retry_after_hint_is_capped() {
        let policy = RetryPolicy::default().max_backoff_ms(2000);
        assert_eq!(
            policy.backoff_for(0, Some(Duration::from_millis(750))),
            Duration::from_millis(750)
        );
        assert_eq!(
            policy.backoff_for(0, Some(Duration::from_secs(60))),
            Duration::from_millis(2000)
        );
    }

    #[test]
    fn test_builder_clamps_attempts() {
        assert_eq!(RetryPolicy::default().max_attempts(0).max_attempts, 1);
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }
}
