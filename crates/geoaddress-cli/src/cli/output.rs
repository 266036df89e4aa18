//! Output formatting for the geoaddress CLI
//!
//! Results render as a colored table for humans, or as JSON / YAML for
//! scripts. Machine formats always carry every record field, `null` included.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;

use geoaddress_core::{AddressRecord, DispatchError, ErrorKind, ProviderDescriptor, RawResponse};

use crate::error::CliError;

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable table format with colors
    #[default]
    Table,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Serialize `value` for the machine formats; `None` for tables
fn serialized<T: Serialize>(value: &T, format: OutputFormat) -> Result<Option<String>, CliError> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value)
            .map(Some)
            .map_err(|e| CliError::SerializationError(e.to_string())),
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .map(Some)
            .map_err(|e| CliError::SerializationError(e.to_string())),
        OutputFormat::Table => Ok(None),
    }
}

/// Successful lookup
#[derive(Debug, Clone, Serialize)]
pub struct RecordsOutput {
    pub count: usize,
    pub records: Vec<AddressRecord>,
}

impl RecordsOutput {
    pub fn new(records: Vec<AddressRecord>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, CliError> {
        match serialized(self, format)? {
            Some(text) => Ok(text),
            None => Ok(self.to_table()),
        }
    }

    fn to_table(&self) -> String {
        let mut out = String::new();
        if self.records.is_empty() {
            let _ = writeln!(out, "{}", "No results".yellow());
            return out;
        }

        let _ = writeln!(
            out,
            "{} {}",
            self.count.to_string().cyan().bold(),
            if self.count == 1 { "result" } else { "results" }
        );
        for (index, record) in self.records.iter().enumerate() {
            let _ = writeln!(out);
            let title = record.text.as_deref().unwrap_or("(no text)");
            let _ = writeln!(out, "{}. {}", index + 1, title.bold());
            let _ = writeln!(
                out,
                "   {} {} ({})",
                "Provider:".dimmed(),
                record.backend,
                record.backend_name
            );
            if let (Some(lat), Some(lon)) = (record.latitude, record.longitude) {
                let _ = writeln!(out, "   {} {:.6}, {:.6}", "Location:".dimmed(), lat, lon);
            }
            if let Some(id) = &record.geoaddress_id {
                let _ = writeln!(out, "   {} {}", "Id:".dimmed(), id.cyan());
            }
            let scores: Vec<String> = [("confidence", record.confidence), ("relevance", record.relevance)]
                .iter()
                .filter_map(|(label, score)| score.map(|s| format!("{} {:.2}", label, s)))
                .collect();
            if !scores.is_empty() {
                let _ = writeln!(out, "   {} {}", "Scores:".dimmed(), scores.join(", "));
            }
        }
        out
    }
}

/// Native response of the provider that answered
#[derive(Debug, Clone, Serialize)]
pub struct RawOutput {
    pub provider: String,
    pub response: serde_json::Value,
}

impl From<RawResponse> for RawOutput {
    fn from(raw: RawResponse) -> Self {
        Self {
            provider: raw.provider,
            response: raw.response,
        }
    }
}

impl RawOutput {
    pub fn render(&self, format: OutputFormat) -> Result<String, CliError> {
        if let Some(text) = serialized(self, format)? {
            return Ok(text);
        }

        let body = serde_json::to_string_pretty(&self.response)
            .map_err(|e| CliError::SerializationError(e.to_string()))?;
        Ok(format!("{} {}\n{}", "Provider:".dimmed(), self.provider.bold(), body))
    }
}

/// One failed candidate in a failure report
#[derive(Debug, Clone, Serialize)]
pub struct AttemptOutput {
    pub provider: String,
    pub kind: ErrorKind,
    pub error: String,
}

/// Exhaustion or deadline failure
#[derive(Debug, Clone, Serialize)]
pub struct FailureOutput {
    pub timed_out: bool,
    pub message: String,
    pub attempts: Vec<AttemptOutput>,
}

impl FailureOutput {
    pub fn from_error(error: &DispatchError) -> Self {
        Self {
            timed_out: error.is_timeout(),
            message: error.to_string(),
            attempts: error
                .attempts()
                .iter()
                .map(|a| AttemptOutput {
                    provider: a.provider.clone(),
                    kind: a.kind(),
                    error: a.error.to_string(),
                })
                .collect(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, CliError> {
        if let Some(text) = serialized(self, format)? {
            return Ok(text);
        }

        let mut out = String::new();
        let headline = if self.timed_out {
            "Deadline exceeded"
        } else {
            "All providers failed"
        };
        let _ = writeln!(out, "{} {}", "x".red(), headline.red().bold());
        if self.attempts.is_empty() {
            let _ = writeln!(out, "  no candidate providers");
        }
        for attempt in &self.attempts {
            let _ = writeln!(
                out,
                "  {} [{}] {}",
                attempt.provider.bold(),
                attempt.kind.as_str().yellow(),
                attempt.error
            );
        }
        Ok(out)
    }
}

/// One row of the `providers` listing
#[derive(Debug, Clone, Serialize)]
pub struct ProviderOutput {
    pub name: String,
    pub display_name: String,
    pub capabilities: Vec<String>,
    pub configured: bool,
    pub missing: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
}

impl ProviderOutput {
    pub fn new(descriptor: &ProviderDescriptor, missing: Vec<String>) -> Self {
        Self {
            name: descriptor.name().to_string(),
            display_name: descriptor.display_name().to_string(),
            capabilities: descriptor
                .capabilities()
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
            configured: missing.is_empty(),
            missing,
            documentation_url: descriptor.documentation_url().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProvidersOutput {
    pub providers: Vec<ProviderOutput>,
}

impl ProvidersOutput {
    pub fn render(&self, format: OutputFormat) -> Result<String, CliError> {
        if let Some(text) = serialized(self, format)? {
            return Ok(text);
        }

        let mut out = String::new();
        let _ = writeln!(out, "{}", "Providers".cyan().bold());
        let _ = writeln!(out, "{}", "=".repeat(60));
        for provider in &self.providers {
            let status = if provider.configured {
                "+".green()
            } else {
                "x".red()
            };
            let _ = writeln!(
                out,
                "{} {:<14} {}",
                status,
                provider.name.bold(),
                provider.capabilities.join(", ").dimmed()
            );
            if !provider.missing.is_empty() {
                let _ = writeln!(
                    out,
                    "    {} {}",
                    "missing:".dimmed(),
                    provider.missing.join(", ").yellow()
                );
            }
        }
        Ok(out)
    }
}
