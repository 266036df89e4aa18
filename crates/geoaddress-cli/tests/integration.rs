//! Command runs against recorded provider responses

use clap::Parser;
use geoaddress_cli::cli::commands::lookup;
use geoaddress_cli::{run_cli, ExitCode, GeoCli, GeoCommands, LookupOutcome};
use geoaddress_core::Request;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FIXTURES: &str = r#"
nominatim:
  reverse_geocode:
    display_name: Tour Eiffel, Paris, France
    place_id: 5013364
    lat: "48.8582602"
    lon: "2.2944813"
  search_addresses:
    error: request
    message: HTTP 503
photon:
  search_addresses:
    features:
      - type: Feature
        geometry: {type: Point, coordinates: [2.2944813, 48.8582602]}
        properties: {osm_id: 5013364, osm_type: W, name: Tour Eiffel, city: Paris, countrycode: FR}
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

async fn run(args: &[&str], fixtures: &Path) -> ExitCode {
    let mut argv = vec!["geoaddress"];
    argv.extend_from_slice(args);
    let fixtures = fixtures.to_str().unwrap();
    if !matches!(args.first(), Some(&"providers") | Some(&"normalize")) {
        argv.extend_from_slice(&["--fixtures", fixtures]);
    }
    run_cli(GeoCli::try_parse_from(argv).unwrap()).await
}

#[tokio::test]
async fn reverse_succeeds_with_default_order() {
    let dir = TempDir::new().unwrap();
    let fixtures = write(&dir, "fixtures.yaml", FIXTURES);
    assert_eq!(
        run(&["reverse", "--lat", "48.8584", "--lon", "2.2945", "--format", "json"], &fixtures).await,
        ExitCode::Success
    );
}

/// Parse a `search` command line and run it without printing
async fn search(args: &[&str], fixtures: &Path) -> LookupOutcome {
    let mut argv = vec!["geoaddress", "search"];
    argv.extend_from_slice(args);
    argv.extend_from_slice(&["--fixtures", fixtures.to_str().unwrap()]);
    match GeoCli::try_parse_from(argv).unwrap().command {
        GeoCommands::Search { query, lookup: args, .. } => {
            lookup(Request::search(query), &args).await.unwrap()
        }
        other => panic!("parsed as {:?}", other),
    }
}

#[tokio::test]
async fn search_falls_back_to_photon() {
    let dir = TempDir::new().unwrap();
    let fixtures = write(&dir, "fixtures.yaml", FIXTURES);
    assert_eq!(
        run(&["search", "Tour Eiffel", "-p", "nominatim", "-p", "photon"], &fixtures).await,
        ExitCode::Success
    );

    let outcome = search(&["Tour Eiffel", "-p", "nominatim", "-p", "photon"], &fixtures).await;
    let output = match outcome {
        LookupOutcome::Records(output) => output,
        other => panic!("expected records, got {:?}", other),
    };
    assert_eq!(output.count, 1);
    assert_eq!(output.records[0].backend_name, "photon");
    assert_eq!(output.records[0].geoaddress_id.as_deref(), Some("photon-W:5013364"));
}

#[tokio::test]
async fn raw_search_returns_native_photon_response() {
    let dir = TempDir::new().unwrap();
    let fixtures = write(&dir, "fixtures.yaml", FIXTURES);

    let outcome = search(
        &["Tour Eiffel", "-p", "nominatim", "-p", "photon", "--raw", "--format", "json"],
        &fixtures,
    )
    .await;
    assert_eq!(outcome.exit_code(), ExitCode::Success);
    let output = match outcome {
        LookupOutcome::Raw(output) => output,
        other => panic!("expected a raw response, got {:?}", other),
    };
    assert_eq!(output.provider, "photon");
    assert_eq!(output.response["features"][0]["properties"]["osm_id"], 5013364);
}

#[test]
fn raw_and_first_are_exclusive() {
    let parsed = GeoCli::try_parse_from([
        "geoaddress", "search", "Paris", "--fixtures", "f.yaml", "--raw", "--first",
    ]);
    assert!(parsed.is_err());
}

#[tokio::test]
async fn exhausted_providers_exit_with_failure() {
    let dir = TempDir::new().unwrap();
    let fixtures = write(&dir, "fixtures.yaml", FIXTURES);
    assert_eq!(
        run(&["reference", "W5013364", "-p", "nominatim", "-p", "photon"], &fixtures).await,
        ExitCode::AllProvidersFailed
    );
}

#[tokio::test]
async fn unknown_provider_is_invalid_input() {
    let dir = TempDir::new().unwrap();
    let fixtures = write(&dir, "fixtures.yaml", FIXTURES);
    assert_eq!(
        run(&["search", "Paris", "-p", "bing"], &fixtures).await,
        ExitCode::InvalidInput
    );
}

#[tokio::test]
async fn missing_fixture_file_is_file_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("absent.yaml");
    assert_eq!(run(&["search", "Paris"], &missing).await, ExitCode::FileError);
}

#[tokio::test]
async fn normalize_reads_saved_response() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "google.json",
        r#"{"status": "OK", "results": [{"place_id": "abc", "formatted_address": "Paris, France",
            "geometry": {"location": {"lat": 48.85, "lng": 2.35}}, "address_components": []}]}"#,
    );
    let input = input.to_str().unwrap();

    assert_eq!(
        run(&["normalize", "--provider", "google", "--input", input], Path::new("")).await,
        ExitCode::Success
    );
    assert_eq!(
        run(
            &["normalize", "--provider", "photon", "--operation", "reference", "--input", input],
            Path::new("")
        )
        .await,
        ExitCode::InvalidInput
    );
}
