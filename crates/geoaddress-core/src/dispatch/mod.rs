//! Ordered fallback dispatch
//!
//! For one request the [`Dispatcher`] walks the candidate providers in
//! priority order. Each candidate is checked for the capability, has its
//! configuration validated, is called (retrying only on rate limits) and has
//! its response normalized. The first success is returned; remaining
//! candidates are never touched. If every candidate fails, the caller gets
//! one diagnostic entry per candidate tried.
//!
//! [`Dispatcher::execute_raw`] walks candidates the same way but hands back
//! the native response instead of normalized records.

pub mod policy;

pub use policy::{DispatchPolicy, RetryPolicy};

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::adapter::AdapterError;
use crate::config::{ConfigSource, ConfigValidator, ResolvedConfig};
use crate::error::{AttemptError, DispatchError, FailedAttempt};
use crate::model::{AddressRecord, RawResponse};
use crate::normalize::ScoringContext;
use crate::registry::RegisteredProvider;
use crate::request::Request;
use crate::telemetry::DispatchMetrics;

/// Executes requests against ordered candidate lists
///
/// Holds no per-request state; one dispatcher can serve concurrent requests.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<dyn ConfigSource>,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config.name())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl Dispatcher {
    pub fn new(config: Arc<dyn ConfigSource>) -> Self {
        Self {
            config,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run `request` against `candidates`, highest priority first
    pub async fn execute(
        &self,
        request: &Request,
        candidates: &[Arc<RegisteredProvider>],
        policy: &DispatchPolicy,
    ) -> Result<Vec<AddressRecord>, DispatchError> {
        self.dispatch(request, candidates, policy).await
    }

    /// Same fallback walk as [`execute`](Self::execute), but the winning
    /// provider's response is returned as-is, without normalization
    pub async fn execute_raw(
        &self,
        request: &Request,
        candidates: &[Arc<RegisteredProvider>],
        policy: &DispatchPolicy,
    ) -> Result<RawResponse, DispatchError> {
        self.dispatch(request, candidates, policy).await
    }

    async fn dispatch<T: Completion>(
        &self,
        request: &Request,
        candidates: &[Arc<RegisteredProvider>],
        policy: &DispatchPolicy,
    ) -> Result<T, DispatchError> {
        let operation = request.capability();
        let started = Instant::now();

        let result = match request.validate() {
            Ok(()) => {
                let span = tracing::info_span!(
                    "dispatch",
                    request_id = %Uuid::new_v4(),
                    operation = %operation,
                    candidates = candidates.len(),
                );
                self.run::<T>(request, candidates, policy, started)
                    .instrument(span)
                    .await
            }
            Err(e) => Err(e),
        };

        if let Some(metrics) = &self.metrics {
            let outcome = match &result {
                Ok(_) => "success",
                Err(DispatchError::AllProvidersFailed { .. }) => "all_providers_failed",
                Err(DispatchError::DeadlineExceeded { .. }) => "deadline_exceeded",
                Err(DispatchError::UnknownProvider(_)) => "unknown_provider",
                Err(DispatchError::InvalidRequest(_)) => "invalid_request",
            };
            metrics.record_request(operation.as_str(), outcome);
            metrics.observe_duration(operation.as_str(), started.elapsed().as_secs_f64());
        }

        result
    }

    async fn run<T: Completion>(
        &self,
        request: &Request,
        candidates: &[Arc<RegisteredProvider>],
        policy: &DispatchPolicy,
        started: Instant,
    ) -> Result<T, DispatchError> {
        let operation = request.capability();
        // A deadline past the clock's range means none
        let deadline = policy
            .timeout
            .and_then(|timeout| started.checked_add(timeout));
        let context = ScoringContext::from_request(request);
        let mut attempts: Vec<FailedAttempt> = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let provider = candidate.name();

            if deadline.map_or(false, |d| Instant::now() >= d) {
                tracing::warn!(provider = provider, "Deadline reached before provider was tried");
                return Err(DispatchError::DeadlineExceeded {
                    operation,
                    timeout: policy.timeout.unwrap_or_default(),
                    attempts,
                });
            }

            tracing::debug!(provider = provider, "Trying provider");

            match self
                .attempt::<T>(candidate, request, &context, policy, deadline)
                .await
            {
                Ok(outcome) => {
                    tracing::info!(
                        provider = provider,
                        results = outcome.results(),
                        "Provider succeeded"
                    );
                    self.record_attempt(provider, operation.as_str(), "success");
                    return Ok(outcome);
                }
                Err(error) => {
                    tracing::warn!(
                        provider = provider,
                        kind = %error.kind(),
                        error = %error,
                        "Provider failed, trying next"
                    );
                    self.record_attempt(provider, operation.as_str(), error.kind().as_str());

                    let timed_out = matches!(error, AttemptError::TimedOut { .. });
                    attempts.push(FailedAttempt::new(provider, error));
                    if timed_out {
                        return Err(DispatchError::DeadlineExceeded {
                            operation,
                            timeout: policy.timeout.unwrap_or_default(),
                            attempts,
                        });
                    }
                }
            }
        }

        Err(DispatchError::AllProvidersFailed {
            operation,
            attempts,
        })
    }

    /// One candidate, from capability check to finished result
    async fn attempt<T: Completion>(
        &self,
        candidate: &RegisteredProvider,
        request: &Request,
        context: &ScoringContext,
        policy: &DispatchPolicy,
        deadline: Option<Instant>,
    ) -> Result<T, AttemptError> {
        let operation = request.capability();
        if !candidate.descriptor.supports(operation) {
            return Err(AttemptError::CapabilityNotSupported { operation });
        }

        let config = ConfigValidator::validate(&candidate.descriptor, self.config.as_ref())?;
        let raw = self
            .call_with_retry(candidate, &config, request, &policy.retry, deadline)
            .await?;

        T::complete(candidate, raw, context)
    }

    async fn call_with_retry(
        &self,
        candidate: &RegisteredProvider,
        config: &ResolvedConfig,
        request: &Request,
        retry: &RetryPolicy,
        deadline: Option<Instant>,
    ) -> Result<Value, AttemptError> {
        let started = Instant::now();
        let timed_out = || AttemptError::TimedOut {
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        };
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let outcome = within(deadline, candidate.adapter.call(config, request))
                .await
                .ok_or_else(timed_out)?;

            match outcome {
                Ok(raw) => return Ok(raw),
                Err(AdapterError::Request(message)) => return Err(AttemptError::Request(message)),
                Err(AdapterError::RateLimited {
                    message,
                    retry_after,
                }) => {
                    if attempt >= retry.max_attempts {
                        return Err(AttemptError::RateLimited {
                            attempts: attempt,
                            message,
                        });
                    }

                    let backoff = retry.backoff_for(attempt - 1, retry_after);
                    tracing::debug!(
                        provider = candidate.name(),
                        attempt = attempt,
                        backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                        "Rate limited, retrying"
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.record_retry(candidate.name());
                    }
                    within(deadline, tokio::time::sleep(backoff))
                        .await
                        .ok_or_else(timed_out)?;
                }
            }
        }
    }

    fn record_attempt(&self, provider: &str, operation: &str, outcome: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_attempt(provider, operation, outcome);
        }
    }
}

/// What a successful provider call becomes
trait Completion: Sized {
    fn complete(
        candidate: &RegisteredProvider,
        raw: Value,
        context: &ScoringContext,
    ) -> Result<Self, AttemptError>;

    fn results(&self) -> usize;
}

impl Completion for Vec<AddressRecord> {
    fn complete(
        candidate: &RegisteredProvider,
        raw: Value,
        context: &ScoringContext,
    ) -> Result<Self, AttemptError> {
        Ok(candidate.normalizer().normalize(&raw, context)?)
    }

    fn results(&self) -> usize {
        self.len()
    }
}

impl Completion for RawResponse {
    fn complete(
        candidate: &RegisteredProvider,
        raw: Value,
        _context: &ScoringContext,
    ) -> Result<Self, AttemptError> {
        Ok(RawResponse {
            provider: candidate.name().to_string(),
            response: raw,
        })
    }

    fn results(&self) -> usize {
        match &self.response {
            Value::Array(items) => items.len(),
            _ => 1,
        }
    }
}

/// Await `future`, giving up at `deadline`
async fn within<F: Future>(deadline: Option<Instant>, future: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, future).await.ok(),
        None => Some(future.await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ProviderAdapter;
    use crate::config::MapSource;
    use crate::descriptor::{Capability, ProviderDescriptor};
    use crate::error::ErrorKind;
    use crate::providers::nominatim::OsmPlaceMapping;
    use async_trait::async_trait;
    use mockall::mock;
    use serde_json::json;
    use std::time::Duration;

    mock! {
        pub Adapter {}

        #[async_trait]
        impl ProviderAdapter for Adapter {
            async fn call(&self, config: &ResolvedConfig, request: &Request) -> Result<Value, AdapterError>;
        }
    }

    fn candidate(name: &str, adapter: impl ProviderAdapter + 'static) -> Arc<RegisteredProvider> {
        candidate_with(
            ProviderDescriptor::builder(name, name.to_uppercase())
                .capabilities(Capability::ALL)
                .build(),
            adapter,
        )
    }

    fn candidate_with(
        descriptor: ProviderDescriptor,
        adapter: impl ProviderAdapter + 'static,
    ) -> Arc<RegisteredProvider> {
        Arc::new(RegisteredProvider::new(
            descriptor,
            Arc::new(OsmPlaceMapping),
            Arc::new(adapter),
        ))
    }

    fn succeeding(place_id: u64) -> MockAdapter {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_call()
            .times(1)
            .returning(move |_, _| Ok(json!([{"place_id": place_id, "lat": "1.0", "lon": "2.0"}])));
        adapter
    }

    fn failing(message: &'static str) -> MockAdapter {
        let mut adapter = MockAdapter::new();
        adapter
            .expect_call()
            .times(1)
            .returning(move |_, _| Err(AdapterError::request(message)));
        adapter
    }

    fn never_called() -> MockAdapter {
        let mut adapter = MockAdapter::new();
        adapter.expect_call().times(0);
        adapter
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(MapSource::new()))
    }

    #[tokio::test]
    async fn test_fallback_stops_at_first_success() {
        let candidates = vec![
            candidate("a", failing("HTTP 503")),
            candidate("b", succeeding(42)),
            candidate("c", never_called()),
        ];

        let records = dispatcher()
            .execute(&Request::search("Paris"), &candidates, &DispatchPolicy::default())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].backend_name, "b");
        assert_eq!(records[0].geoaddress_id.as_deref(), Some("b-42"));
    }

    #[tokio::test]
    async fn test_exhaustion_lists_every_candidate_in_order() {
        let candidates = vec![
            candidate("a", failing("one")),
            candidate("b", failing("two")),
            candidate("c", failing("three")),
        ];

        let err = dispatcher()
            .execute(&Request::reference("abc"), &candidates, &DispatchPolicy::default())
            .await
            .unwrap_err();

        let providers: Vec<&str> = err.attempts().iter().map(|a| a.provider.as_str()).collect();
        assert_eq!(providers, vec!["a", "b", "c"]);
        assert!(err
            .attempts()
            .iter()
            .all(|a| a.kind() == ErrorKind::ProviderRequest));
        assert!(matches!(err, DispatchError::AllProvidersFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_configuration_never_calls_adapter() {
        let descriptor = ProviderDescriptor::builder("google", "Google")
            .required("GOOGLE_API_KEY")
            .capabilities(Capability::ALL)
            .build();
        let candidates = vec![candidate_with(descriptor, never_called())];

        let err = dispatcher()
            .execute(&Request::search("Paris"), &candidates, &DispatchPolicy::default())
            .await
            .unwrap_err();

        assert_eq!(err.attempts().len(), 1);
        assert_eq!(err.attempts()[0].kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[tokio::test]
    async fn test_unsupported_capability_never_calls_adapter() {
        let descriptor = ProviderDescriptor::builder("photon", "Photon")
            .capability(Capability::SearchAddresses)
            .build();
        let candidates = vec![
            candidate_with(descriptor, never_called()),
            candidate("b", succeeding(1)),
        ];

        let records = dispatcher()
            .execute(&Request::reference("x"), &candidates, &DispatchPolicy::default())
            .await
            .unwrap();
        assert_eq!(records[0].backend_name, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retries_then_succeeds() {
        let mut adapter = MockAdapter::new();
        let mut calls = 0;
        adapter.expect_call().times(3).returning(move |_, _| {
            calls += 1;
            if calls < 3 {
                Err(AdapterError::rate_limited("429 Too Many Requests"))
            } else {
                Ok(json!([{"place_id": 7}]))
            }
        });
        let candidates = vec![candidate("google", adapter), candidate("mapbox", never_called())];

        let started = Instant::now();
        let records = dispatcher()
            .execute(&Request::search("Paris"), &candidates, &DispatchPolicy::default())
            .await
            .unwrap();

        assert_eq!(records[0].backend_name, "google");
        // 200ms then 400ms of backoff
        assert_eq!(started.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_exhaustion_falls_back() {
        let mut limited = MockAdapter::new();
        limited
            .expect_call()
            .times(2)
            .returning(|_, _| Err(AdapterError::rate_limited("slow down")));
        let candidates = vec![candidate("a", limited), candidate("b", succeeding(9))];
        let policy = DispatchPolicy::new().with_retry(RetryPolicy::default().max_attempts(2));

        let records = dispatcher()
            .execute(&Request::search("Paris"), &candidates, &policy)
            .await
            .unwrap();
        assert_eq!(records[0].backend_name, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_attempt_count_is_reported() {
        let mut limited = MockAdapter::new();
        limited
            .expect_call()
            .times(3)
            .returning(|_, _| Err(AdapterError::rate_limited("slow down")));
        let candidates = vec![candidate("a", limited)];

        let err = dispatcher()
            .execute(&Request::search("Paris"), &candidates, &DispatchPolicy::default())
            .await
            .unwrap_err();
        assert_eq!(
            err.attempts()[0].error,
            AttemptError::RateLimited {
                attempts: 3,
                message: "slow down".into(),
            }
        );
    }

    struct SlowAdapter(Duration);

    #[async_trait]
    impl ProviderAdapter for SlowAdapter {
        async fn call(&self, _config: &ResolvedConfig, _request: &Request) -> Result<Value, AdapterError> {
            tokio::time::sleep(self.0).await;
            Ok(json!([]))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_bounds_whole_dispatch() {
        let candidates = vec![
            candidate("slow", SlowAdapter(Duration::from_secs(30))),
            candidate("never", never_called()),
        ];
        let policy = DispatchPolicy::new().with_timeout(Duration::from_secs(2));

        let started = Instant::now();
        let err = dispatcher()
            .execute(&Request::search("Paris"), &candidates, &policy)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(err.attempts().len(), 1);
        assert_eq!(err.attempts()[0].kind(), ErrorKind::Timeout);
        assert_eq!(started.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_means_no_deadline() {
        let candidates = vec![candidate("a", succeeding(3))];
        let policy = DispatchPolicy::new().with_timeout(Duration::MAX);

        let records = dispatcher()
            .execute(&Request::search("Paris"), &candidates, &policy)
            .await
            .unwrap();
        assert_eq!(records[0].backend_name, "a");
    }

    #[tokio::test]
    async fn test_raw_dispatch_falls_back_and_skips_normalization() {
        let mut bad = MockAdapter::new();
        bad.expect_call()
            .times(1)
            .returning(|_, _| Err(AdapterError::request("HTTP 502")));
        let mut native = MockAdapter::new();
        // Out of range latitude; normalizing this would fail
        native
            .expect_call()
            .times(1)
            .returning(|_, _| Ok(json!([{"place_id": 5, "lat": "200", "lon": "0"}])));
        let candidates = vec![
            candidate("a", bad),
            candidate("b", native),
            candidate("c", never_called()),
        ];

        let raw = dispatcher()
            .execute_raw(&Request::search("Paris"), &candidates, &DispatchPolicy::default())
            .await
            .unwrap();
        assert_eq!(raw.provider, "b");
        assert_eq!(raw.response, json!([{"place_id": 5, "lat": "200", "lon": "0"}]));
    }

    #[tokio::test]
    async fn test_raw_dispatch_reports_exhaustion() {
        let descriptor = ProviderDescriptor::builder("google", "Google")
            .required("GOOGLE_API_KEY")
            .capabilities(Capability::ALL)
            .build();
        let candidates = vec![
            candidate_with(descriptor, never_called()),
            candidate("b", failing("down")),
        ];

        let err = dispatcher()
            .execute_raw(&Request::search("Paris"), &candidates, &DispatchPolicy::default())
            .await
            .unwrap_err();
        let kinds: Vec<ErrorKind> = err.attempts().iter().map(|a| a.kind()).collect();
        assert_eq!(kinds, vec![ErrorKind::Configuration, ErrorKind::ProviderRequest]);
    }

    #[tokio::test]
    async fn test_normalization_failure_falls_back() {
        let mut bad = MockAdapter::new();
        bad.expect_call()
            .times(1)
            .returning(|_, _| Ok(json!([{"place_id": 1, "lat": "200", "lon": "0"}])));
        let candidates = vec![candidate("bad", bad), candidate("good", succeeding(2))];

        let records = dispatcher()
            .execute(&Request::search("Paris"), &candidates, &DispatchPolicy::default())
            .await
            .unwrap();
        assert_eq!(records[0].backend_name, "good");
    }

    #[tokio::test]
    async fn test_empty_results_are_success() {
        let mut empty = MockAdapter::new();
        empty.expect_call().times(1).returning(|_, _| Ok(json!([])));
        let candidates = vec![candidate("a", empty), candidate("b", never_called())];

        let records = dispatcher()
            .execute(
                &Request::search("xyz-nonexistent-place"),
                &candidates,
                &DispatchPolicy::default(),
            )
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_no_candidates_and_invalid_requests() {
        let err = dispatcher()
            .execute(&Request::search("Paris"), &[], &DispatchPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::AllProvidersFailed { ref attempts, .. } if attempts.is_empty()));

        let candidates = vec![candidate("a", never_called())];
        let err = dispatcher()
            .execute(&Request::search("   "), &candidates, &DispatchPolicy::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_metrics_record_outcomes() {
        let registry = prometheus::Registry::new();
        let metrics = Arc::new(DispatchMetrics::new(&registry).unwrap());
        let dispatcher = dispatcher().with_metrics(metrics);
        let candidates = vec![candidate("a", failing("down")), candidate("b", succeeding(1))];

        dispatcher
            .execute(&Request::search("Paris"), &candidates, &DispatchPolicy::default())
            .await
            .unwrap();

        let attempts = registry
            .gather()
            .into_iter()
            .find(|f| f.get_name() == "geoaddress_dispatch_attempts_total")
            .unwrap();
        assert_eq!(attempts.get_metric().len(), 2);
    }
}
