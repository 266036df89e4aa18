//! CLI module for geoaddress
//!
//! Subcommands list the provider catalogue, run lookups through the dispatcher
//! and normalize saved provider responses.

pub mod commands;
pub mod output;

pub use commands::{ConfigArgs, GeoCli, GeoCommands, LookupArgs, LookupOutcome};
pub use output::{OutputFormat, RecordsOutput};

use geoaddress_core::Request;

use crate::error::CliError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// Every candidate failed, or the deadline expired
    AllProvidersFailed = 1,
    /// Invalid input or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Exit code for an error that escaped a command
    pub fn for_error(error: &CliError) -> Self {
        match error {
            CliError::FileError(_) => ExitCode::FileError,
            e if e.is_user_error() => ExitCode::InvalidInput,
            _ => ExitCode::InternalError,
        }
    }
}

/// Run the parsed command and return the exit code
pub async fn run(cli: GeoCli) -> Result<ExitCode, CliError> {
    match cli.command {
        GeoCommands::Providers { format, config } => commands::execute_providers(format, &config),
        GeoCommands::Search {
            query,
            proximity,
            lookup,
        } => {
            let request = match proximity {
                Some(point) => Request::search_near(query, point),
                None => Request::search(query),
            };
            commands::execute_lookup(request, &lookup).await
        }
        GeoCommands::Reverse { lat, lon, lookup } => {
            commands::execute_lookup(Request::reverse(lat, lon), &lookup).await
        }
        GeoCommands::Reference { reference, lookup } => {
            commands::execute_lookup(Request::reference(reference), &lookup).await
        }
        GeoCommands::Osm {
            osm_id,
            osm_type,
            tags,
            lookup,
        } => {
            let request = commands::osm_request(osm_id, osm_type, tags)?;
            commands::execute_lookup(request, &lookup).await
        }
        GeoCommands::Normalize {
            provider,
            operation,
            input,
            query,
            format,
        } => commands::execute_normalize(&provider, &operation, &input, query, format),
    }
}
