//! Prometheus metrics for dispatch
//!
//! - `geoaddress_dispatch_requests_total` (counter) by operation and outcome
//! - `geoaddress_dispatch_attempts_total` (counter) by provider, operation and outcome
//! - `geoaddress_dispatch_retries_total` (counter) by provider
//! - `geoaddress_dispatch_duration_seconds` (histogram) by operation
//!
//! # Example
//!
//! ```rust,no_run
//! use geoaddress_core::DispatchMetrics;
//! use prometheus::Registry;
//!
//! let registry = Registry::new();
//! let metrics = DispatchMetrics::new(&registry).unwrap();
//! metrics.record_request("search_addresses", "success");
//! ```

use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "geoaddress";

/// Dispatch metrics, registered once and shared across requests
#[derive(Clone)]
pub struct DispatchMetrics {
    /// Logical operations by final outcome
    requests_total: CounterVec,

    /// Per-candidate attempts by outcome (`success` or an error kind)
    attempts_total: CounterVec,

    /// Rate-limit retries per provider
    retries_total: CounterVec,

    /// Wall time of whole dispatches
    duration_seconds: HistogramVec,
}

impl std::fmt::Debug for DispatchMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMetrics").finish_non_exhaustive()
    }
}

impl DispatchMetrics {
    /// Create the metrics and register them with `registry`
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let requests_total = CounterVec::new(
            Opts::new(
                "dispatch_requests_total",
                "Total number of geocoding operations by outcome",
            )
            .namespace(NAMESPACE),
            &["operation", "outcome"],
        )?;

        let attempts_total = CounterVec::new(
            Opts::new(
                "dispatch_attempts_total",
                "Total number of provider attempts by outcome",
            )
            .namespace(NAMESPACE),
            &["provider", "operation", "outcome"],
        )?;

        let retries_total = CounterVec::new(
            Opts::new(
                "dispatch_retries_total",
                "Total number of rate-limit retries",
            )
            .namespace(NAMESPACE),
            &["provider"],
        )?;

        let duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "dispatch_duration_seconds",
                "Geocoding operation duration in seconds",
            )
            .namespace(NAMESPACE)
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
            &["operation"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(attempts_total.clone()))?;
        registry.register(Box::new(retries_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;

        Ok(Self {
            requests_total,
            attempts_total,
            retries_total,
            duration_seconds,
        })
    }

    pub fn record_request(&self, operation: &str, outcome: &str) {
        self.requests_total
            .with_label_values(&[operation, outcome])
            .inc();
    }

    pub fn record_attempt(&self, provider: &str, operation: &str, outcome: &str) {
        self.attempts_total
            .with_label_values(&[provider, operation, outcome])
            .inc();
    }

    pub fn record_retry(&self, provider: &str) {
        self.retries_total.with_label_values(&[provider]).inc();
    }

    pub fn observe_duration(&self, operation: &str, duration_secs: f64) {
        self.duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }
}
