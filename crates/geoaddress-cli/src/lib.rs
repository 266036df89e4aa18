//! Command-line front end for geoaddress
//!
//! Wraps [`geoaddress_core`] with argument parsing, layered provider
//! configuration and table / JSON / YAML output.
//!
//! # Example
//!
//! ```rust,no_run
//! use clap::Parser;
//! use geoaddress_cli::{run_cli, GeoCli};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cli = GeoCli::parse();
//!     let exit_code = run_cli(cli).await;
//!     std::process::exit(exit_code.into());
//! }
//! ```

pub mod cli;
pub mod error;

pub use cli::{ExitCode, GeoCli, GeoCommands, LookupOutcome, OutputFormat};
pub use error::CliError;

/// Run the CLI, reporting escaped errors on stderr
pub async fn run_cli(cli: GeoCli) -> ExitCode {
    match cli::run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::for_error(&e)
        }
    }
}
