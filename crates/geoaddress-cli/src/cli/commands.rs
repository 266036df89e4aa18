//! CLI command definitions for geoaddress
//!
//! Lookups run the real dispatcher against recorded provider responses
//! (`--fixtures`), so every fallback, retry and normalization path can be
//! exercised offline.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use geoaddress_core::config::{ConfigSource, LayeredSource};
use geoaddress_core::{
    providers, Capability, ConfigValidator, FixtureAdapter, Geocoder, LookupOptions, Normalizer,
    OsmLookup, Point, ProviderAdapter, ProviderRegistry, Request, RetryPolicy, ScoringContext,
};

use super::output::{
    FailureOutput, OutputFormat, ProviderOutput, ProvidersOutput, RawOutput, RecordsOutput,
};
use super::ExitCode;
use crate::error::CliError;

/// Unified geocoding across many providers
#[derive(Parser, Debug)]
#[command(name = "geoaddress")]
#[command(about = "Geoaddress - geocode through prioritized providers with fallback", long_about = None)]
#[command(version)]
pub struct GeoCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: GeoCommands,
}

/// Where provider configuration comes from
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Dotenv file with provider keys (defaults to ./.env when present)
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// JSON, YAML or TOML bundle with provider keys
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Options shared by every lookup command
#[derive(Args, Debug, Clone)]
pub struct LookupArgs {
    /// Provider to try, in priority order (repeatable)
    #[arg(short, long = "provider")]
    pub providers: Vec<String>,

    /// File mapping provider names to recorded responses
    #[arg(long)]
    pub fixtures: PathBuf,

    /// Deadline for the whole lookup in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Calls per provider when rate limited, including the first
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Print only the first result
    #[arg(long)]
    pub first: bool,

    /// Print the answering provider's native response, unnormalized
    #[arg(long, conflicts_with = "first")]
    pub raw: bool,

    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl LookupArgs {
    pub fn options(&self) -> LookupOptions {
        let mut options = LookupOptions::new().first_only(self.first);
        if !self.providers.is_empty() {
            options = options.with_providers(self.providers.iter().cloned());
        }
        if let Some(ms) = self.timeout_ms {
            options = options.with_timeout(Duration::from_millis(ms));
        }
        if let Some(attempts) = self.max_attempts {
            options = options.with_retry(RetryPolicy::default().max_attempts(attempts));
        }
        options
    }
}

#[derive(Subcommand, Debug)]
pub enum GeoCommands {
    /// List built-in providers and whether they are configured
    Providers {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Search addresses from free text
    Search {
        query: String,

        /// Bias results towards a point, as "lat,lon"
        #[arg(long, allow_hyphen_values = true)]
        proximity: Option<Point>,

        #[command(flatten)]
        lookup: LookupArgs,
    },

    /// Find the address at a coordinate
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[command(flatten)]
        lookup: LookupArgs,
    },

    /// Look up an address by provider reference
    Reference {
        reference: String,

        #[command(flatten)]
        lookup: LookupArgs,
    },

    /// Look up an OpenStreetMap element or tag filter
    Osm {
        #[arg(long, requires = "osm_type", conflicts_with = "tags")]
        osm_id: Option<String>,

        /// N, W, R or node, way, relation
        #[arg(long, requires = "osm_id")]
        osm_type: Option<String>,

        /// Tag filter as key=value (repeatable)
        #[arg(long = "tag", value_parser = parse_tag)]
        tags: Vec<(String, String)>,

        #[command(flatten)]
        lookup: LookupArgs,
    },

    /// Normalize a saved raw provider response
    Normalize {
        #[arg(long)]
        provider: String,

        /// Operation the response answered
        #[arg(long, default_value = "search_addresses")]
        operation: String,

        /// Raw response as JSON
        #[arg(long)]
        input: PathBuf,

        /// Query to score relevance against
        #[arg(long)]
        query: Option<String>,

        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

/// Environment > env file > bundle > descriptor defaults
pub fn build_config(args: &ConfigArgs) -> Result<LayeredSource, CliError> {
    let mut builder = LayeredSource::builder().with_env();
    builder = match &args.env_file {
        Some(path) => builder.with_dotenv(path)?,
        None => builder.with_dotenv_if_exists(".env"),
    };
    if let Some(path) = &args.config {
        builder = builder.with_bundle(path)?;
    }
    Ok(builder.build())
}

/// Bind every built-in provider to its recorded responses
///
/// Providers absent from the fixture file are still registered; a call to
/// one fails as a provider error and dispatch falls back.
pub fn fixture_registry(path: &Path) -> Result<ProviderRegistry, CliError> {
    let mut fixtures = FixtureAdapter::load_set(path)?;
    let registry = ProviderRegistry::with_builtin_providers(|descriptor| {
        let adapter = fixtures.remove(descriptor.name()).unwrap_or_default();
        Some(Arc::new(adapter) as Arc<dyn ProviderAdapter>)
    });
    for name in fixtures.keys() {
        tracing::warn!(provider = %name, "Ignoring fixtures for unknown provider");
    }
    Ok(registry)
}

pub fn execute_providers(format: OutputFormat, config: &ConfigArgs) -> Result<ExitCode, CliError> {
    let source = build_config(config)?;
    let providers = providers::catalogue()
        .iter()
        .map(|builtin| {
            let missing = ConfigValidator::missing_keys(&builtin.descriptor, &source);
            ProviderOutput::new(&builtin.descriptor, missing)
        })
        .collect();
    println!("{}", ProvidersOutput { providers }.render(format)?);
    Ok(ExitCode::Success)
}

/// What a lookup produced, ready to render
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Records(RecordsOutput),
    Raw(RawOutput),
    Failed(FailureOutput),
}

impl LookupOutcome {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            LookupOutcome::Records(_) | LookupOutcome::Raw(_) => ExitCode::Success,
            LookupOutcome::Failed(_) => ExitCode::AllProvidersFailed,
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String, CliError> {
        match self {
            LookupOutcome::Records(output) => output.render(format),
            LookupOutcome::Raw(output) => output.render(format),
            LookupOutcome::Failed(output) => output.render(format),
        }
    }
}

/// Run one lookup; exhaustion is an outcome, user errors are raised
pub async fn lookup(request: Request, args: &LookupArgs) -> Result<LookupOutcome, CliError> {
    let config: Arc<dyn ConfigSource> = Arc::new(build_config(&args.config)?);
    let registry = fixture_registry(&args.fixtures)?;
    let geocoder = Geocoder::new(Arc::new(registry), config);
    let options = args.options();

    let result = if args.raw {
        geocoder
            .execute_raw(&request, &options)
            .await
            .map(|raw| LookupOutcome::Raw(raw.into()))
    } else {
        geocoder
            .execute(&request, &options)
            .await
            .map(|records| LookupOutcome::Records(RecordsOutput::new(records)))
    };

    match result {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.is_user_error() => Err(e.into()),
        Err(e) => Ok(LookupOutcome::Failed(FailureOutput::from_error(&e))),
    }
}

pub async fn execute_lookup(request: Request, args: &LookupArgs) -> Result<ExitCode, CliError> {
    let outcome = lookup(request, args).await?;
    println!("{}", outcome.render(args.format)?);
    Ok(outcome.exit_code())
}

pub fn osm_request(
    osm_id: Option<String>,
    osm_type: Option<String>,
    tags: Vec<(String, String)>,
) -> Result<Request, CliError> {
    let lookup = match (osm_id, osm_type) {
        (Some(id), Some(kind)) => OsmLookup::element(&id, &kind)?,
        (None, None) if !tags.is_empty() => OsmLookup::tags(tags)?,
        _ => {
            return Err(CliError::invalid_input(
                "pass --osm-id with --osm-type, or at least one --tag",
            ))
        }
    };
    Ok(Request::osm(lookup))
}

pub fn execute_normalize(
    provider: &str,
    operation: &str,
    input: &Path,
    query: Option<String>,
    format: OutputFormat,
) -> Result<ExitCode, CliError> {
    let builtin = providers::find(provider)
        .ok_or_else(|| CliError::invalid_input(format!("Unknown provider: {}", provider)))?;
    let operation: Capability = operation.parse().map_err(CliError::InvalidInput)?;
    if !builtin.descriptor.supports(operation) {
        return Err(CliError::invalid_input(format!(
            "{} does not support {}",
            provider, operation
        )));
    }

    let content = std::fs::read_to_string(input).map_err(|e| {
        CliError::file_error(format!(
            "Failed to read response file '{}': {}",
            input.display(),
            e
        ))
    })?;
    let raw: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| CliError::ParseError(e.to_string()))?;

    let context = match (operation, query) {
        (Capability::SearchAddresses, Some(query)) => ScoringContext::search(query),
        _ => ScoringContext::default(),
    };
    let normalizer = Normalizer::new(
        builtin.descriptor.name(),
        builtin.descriptor.display_name(),
        builtin.mapping,
    );
    let records = normalizer
        .normalize(&raw, &context)
        .map_err(|e| CliError::ParseError(e.to_string()))?;

    println!("{}", RecordsOutput::new(records).render(format)?);
    Ok(ExitCode::Success)
}
