//! Replaying adapter backed by recorded responses
//!
//! A fixture document maps operation names to what the provider should
//! answer:
//!
//! ```yaml
//! search_addresses:
//!   sequence:
//!     - error: rate_limit
//!       message: slow down
//!       retry_after_ms: 100
//!     - [{"place_id": 1, "lat": "48.85", "lon": "2.35"}]
//! reverse_geocode:
//!   display_name: Paris, France
//!   osm_id: "123"
//! ```
//!
//! A `sequence` is replayed step by step, the last step repeating forever.
//! An object whose `error` is `rate_limit` or `request` simulates a failure;
//! anything else, including a provider's own `{"error": "Unable to geocode"}`,
//! is returned verbatim as the raw response.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;

use super::{AdapterError, ProviderAdapter};
use crate::config::ResolvedConfig;
use crate::descriptor::Capability;
use crate::request::Request;

/// Errors loading fixture documents
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fixture document: {0}")]
    Parse(String),

    #[error("Unknown operation in fixture document: {0}")]
    UnknownOperation(String),
}

#[derive(Debug, Clone)]
enum Step {
    Respond(Value),
    Fail(AdapterError),
}

impl Step {
    fn from_value(value: Value) -> Self {
        let message = |value: &Value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("simulated failure")
                .to_string()
        };

        let failure = match value.get("error").and_then(Value::as_str) {
            Some("rate_limit") => {
                let mut error = AdapterError::rate_limited(message(&value));
                if let Some(ms) = value.get("retry_after_ms").and_then(Value::as_u64) {
                    error = error.with_retry_after(Duration::from_millis(ms));
                }
                Some(error)
            }
            Some("request") => Some(AdapterError::request(message(&value))),
            // Providers answer with their own `error` payloads, e.g. a Nominatim miss
            _ => None,
        };

        match failure {
            Some(error) => Step::Fail(error),
            None => Step::Respond(value),
        }
    }
}

#[derive(Debug)]
struct Script {
    steps: Vec<Step>,
    cursor: AtomicUsize,
}

impl Script {
    fn from_value(value: Value) -> Result<Self, FixtureError> {
        let steps = match value {
            Value::Object(mut obj) if obj.len() == 1 && obj.contains_key("sequence") => {
                match obj.remove("sequence") {
                    Some(Value::Array(items)) if !items.is_empty() => {
                        items.into_iter().map(Step::from_value).collect()
                    }
                    _ => {
                        return Err(FixtureError::Parse(
                            "'sequence' must be a non-empty list".to_string(),
                        ))
                    }
                }
            }
            other => vec![Step::from_value(other)],
        };
        Ok(Self {
            steps,
            cursor: AtomicUsize::new(0),
        })
    }

    fn next(&self) -> Step {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        let last = self.steps.len().saturating_sub(1);
        // `steps` is never empty: both construction paths push at least one
        self.steps[index.min(last)].clone()
    }

    fn calls(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

/// Adapter that replays canned responses per operation
#[derive(Debug, Default)]
pub struct FixtureAdapter {
    scripts: HashMap<Capability, Script>,
}

impl FixtureAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `operation` with `response` on every call
    pub fn respond(mut self, operation: Capability, response: Value) -> Self {
        self.scripts.insert(
            operation,
            Script {
                steps: vec![Step::Respond(response)],
                cursor: AtomicUsize::new(0),
            },
        );
        self
    }

    /// Play `outcomes` in order for `operation`; the last one repeats
    pub fn script(
        mut self,
        operation: Capability,
        outcomes: Vec<Result<Value, AdapterError>>,
    ) -> Self {
        let mut steps: Vec<Step> = outcomes
            .into_iter()
            .map(|outcome| match outcome {
                Ok(value) => Step::Respond(value),
                Err(error) => Step::Fail(error),
            })
            .collect();
        if steps.is_empty() {
            steps.push(Step::Respond(Value::Null));
        }
        self.scripts.insert(
            operation,
            Script {
                steps,
                cursor: AtomicUsize::new(0),
            },
        );
        self
    }

    /// Build from a document keyed by operation name
    pub fn from_value(document: Value) -> Result<Self, FixtureError> {
        let Value::Object(entries) = document else {
            return Err(FixtureError::Parse(
                "fixture document must be a mapping of operation names".to_string(),
            ));
        };

        let mut scripts = HashMap::new();
        for (name, value) in entries {
            let operation: Capability = name
                .parse()
                .map_err(|_| FixtureError::UnknownOperation(name.clone()))?;
            scripts.insert(operation, Script::from_value(value)?);
        }
        Ok(Self { scripts })
    }

    /// Load a single-provider fixture document (JSON, or YAML by extension)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        Self::from_value(read_document(path.as_ref())?)
    }

    /// Load a document mapping provider names to fixture documents
    pub fn load_set(path: impl AsRef<Path>) -> Result<HashMap<String, FixtureAdapter>, FixtureError> {
        let Value::Object(providers) = read_document(path.as_ref())? else {
            return Err(FixtureError::Parse(
                "fixture set must be a mapping of provider names".to_string(),
            ));
        };
        providers
            .into_iter()
            .map(|(name, document)| Ok((name, Self::from_value(document)?)))
            .collect()
    }

    /// Number of calls made so far for `operation`
    pub fn calls(&self, operation: Capability) -> usize {
        self.scripts.get(&operation).map_or(0, Script::calls)
    }

    /// Operations this fixture can answer
    pub fn operations(&self) -> Vec<Capability> {
        let mut operations: Vec<Capability> = self.scripts.keys().copied().collect();
        operations.sort();
        operations
    }
}

fn read_document(path: &Path) -> Result<Value, FixtureError> {
    let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| FixtureError::Parse(e.to_string()))
    } else {
        serde_json::from_str(&content).map_err(|e| FixtureError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ProviderAdapter for FixtureAdapter {
    async fn call(&self, config: &ResolvedConfig, request: &Request) -> Result<Value, AdapterError> {
        let operation = request.capability();
        let script = self.scripts.get(&operation).ok_or_else(|| {
            AdapterError::request(format!(
                "no fixture recorded for {} on {}",
                operation,
                config.provider()
            ))
        })?;

        match script.next() {
            Step::Respond(value) => Ok(value),
            Step::Fail(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigValidator, MapSource};
    use crate::descriptor::ProviderDescriptor;
    use serde_json::json;

    fn config() -> ResolvedConfig {
        let descriptor = ProviderDescriptor::builder("fixture", "Fixture").build();
        ConfigValidator::validate(&descriptor, &MapSource::new()).unwrap()
    }

    #[tokio::test]
    async fn test_sequence_replays_then_repeats_last() {
        let adapter = FixtureAdapter::from_value(json!({
            "search_addresses": {"sequence": [
                {"error": "rate_limit", "message": "slow down", "retry_after_ms": 50},
                {"error": "request", "message": "HTTP 502"},
                [{"place_id": 1}]
            ]}
        }))
        .unwrap();
        let request = Request::search("Paris");

        assert_eq!(
            adapter.call(&config(), &request).await,
            Err(AdapterError::rate_limited("slow down").with_retry_after(Duration::from_millis(50)))
        );
        assert_eq!(
            adapter.call(&config(), &request).await,
            Err(AdapterError::request("HTTP 502"))
        );
        for _ in 0..2 {
            assert_eq!(
                adapter.call(&config(), &request).await.unwrap(),
                json!([{"place_id": 1}])
            );
        }
        assert_eq!(adapter.calls(Capability::SearchAddresses), 4);
    }

    #[tokio::test]
    async fn test_missing_operation_is_request_error() {
        let adapter = FixtureAdapter::new().respond(Capability::ReverseGeocode, json!({}));
        let err = adapter
            .call(&config(), &Request::reference("abc"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Request(msg) if msg.contains("get_address_by_reference")));
        assert_eq!(adapter.calls(Capability::GetAddressByReference), 0);
    }

    #[test]
    fn test_rejects_unknown_operations_and_empty_sequences() {
        assert!(matches!(
            FixtureAdapter::from_value(json!({"geocode": []})),
            Err(FixtureError::UnknownOperation(_))
        ));
        assert!(matches!(
            FixtureAdapter::from_value(json!({"search": {"sequence": []}})),
            Err(FixtureError::Parse(_))
        ));
        assert!(FixtureAdapter::from_value(json!([])).is_err());
    }

    #[tokio::test]
    async fn test_provider_error_payload_is_replayed_verbatim() {
        let adapter = FixtureAdapter::from_value(json!({
            "reverse_geocode": {"error": "Unable to geocode"}
        }))
        .unwrap();

        assert_eq!(
            adapter.call(&config(), &Request::reverse(0.0, 0.0)).await.unwrap(),
            json!({"error": "Unable to geocode"})
        );
    }

    #[test]
    fn test_load_set_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.yaml");
        std::fs::write(
            &path,
            "nominatim:\n  reverse:\n    display_name: Paris, France\n    osm_id: '123'\nphoton:\n  search:\n    features: []\n",
        )
        .unwrap();

        let set = FixtureAdapter::load_set(&path).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set["nominatim"].operations(), vec![Capability::ReverseGeocode]);
        assert_eq!(set["photon"].operations(), vec![Capability::SearchAddresses]);
    }
}
