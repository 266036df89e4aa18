//! geoaddress CLI
//!
//! # Usage
//!
//! ```bash
//! # Which providers are configured from the environment and .env
//! geoaddress providers
//!
//! # Search with recorded responses, Google first then Nominatim
//! geoaddress search "10 Downing Street" --fixtures fixtures.yaml -p google -p nominatim
//!
//! # Reverse geocode with a 2 second deadline
//! geoaddress reverse --lat 48.8584 --lon 2.2945 --fixtures fixtures.yaml --timeout-ms 2000
//!
//! # Native response of whichever provider answered
//! geoaddress reference W5013364 --fixtures fixtures.yaml --raw --format json
//!
//! # Normalize a saved response
//! geoaddress normalize --provider photon --input response.json --format json
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: All providers failed or the deadline expired
//! - 3: Invalid input or arguments
//! - 4: File not found or inaccessible
//! - 10: Internal error

use clap::Parser;
use geoaddress_cli::{run_cli, GeoCli};
use tracing::Level;
use tracing_subscriber::EnvFilter;

fn verbosity(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

#[tokio::main]
async fn main() {
    let cli = GeoCli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(verbosity(cli.verbose, cli.quiet).into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = run_cli(cli).await;
    std::process::exit(exit_code.into());
}
