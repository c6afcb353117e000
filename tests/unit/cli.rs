//! Command line parsing and configuration building

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use dte_extractor::cli::{Cli, CliError, Commands, OutputFormat};
use dte_extractor::config::ConfigError;
use dte_extractor::downloader::YearMonth;
use dte_extractor::fetcher::pagination::PageMode;

const CREDENTIALS: [&str; 6] = [
    "--base-url",
    "https://api.example.com/v1",
    "--user-token",
    "u-token",
    "--company-token",
    "c-token",
];

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    let mut argv = vec!["dte-extractor"];
    argv.extend_from_slice(&CREDENTIALS);
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv)
}

#[test]
fn test_dtes_defaults() {
    let cli = parse(&["dtes"]).unwrap();

    match &cli.command {
        Commands::Dtes(args) => assert_eq!(args.type_document, 33),
        other => panic!("unexpected command {other:?}"),
    }
    assert_eq!(cli.output_format, OutputFormat::Human);

    let config = cli.extractor_config().unwrap();
    assert_eq!(config.start, YearMonth::new(2023, 1));
    assert_eq!(config.end, YearMonth::new(2025, 12));
    assert_eq!(config.data_dir, PathBuf::from("data"));
    assert_eq!(config.max_rps, 7);
    assert_eq!(config.max_attempts, 3);
    assert_eq!(config.batch_size, 20);
    assert_eq!(config.range_delay, Duration::from_millis(2000));
    assert_eq!(config.page_mode, PageMode::Sequential);

    let api = cli.api_config().unwrap();
    assert_eq!(api.base_url, "https://api.example.com/v1");
    assert_eq!(api.company_token, "c-token");
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&[
        "estimates",
        "--start",
        "2024-02",
        "--end",
        "2024-04",
        "--concurrent-pages",
        "4",
        "--output-format",
        "json",
    ])
    .unwrap();

    assert!(matches!(cli.command, Commands::Estimates));
    assert_eq!(cli.output_format, OutputFormat::Json);
    let config = cli.extractor_config().unwrap();
    assert_eq!(config.start, YearMonth::new(2024, 2));
    assert_eq!(config.page_mode, PageMode::Concurrent(4));
}

#[test]
fn test_out_of_range_values_are_rejected() {
    assert!(parse(&["--max-attempts", "11", "dtes"]).is_err());
    assert!(parse(&["--max-attempts", "0", "dtes"]).is_err());
    assert!(parse(&["--max-rps", "0", "dtes"]).is_err());
    assert!(parse(&["--batch-size", "0", "dtes"]).is_err());
    assert!(parse(&["--concurrent-pages", "0", "dtes"]).is_err());
    assert!(parse(&["--start", "2024-13", "dtes"]).is_err());
    assert!(parse(&["--output-format", "xml", "dtes"]).is_err());
}

#[test]
fn test_reversed_span_is_a_configuration_error() {
    let cli = parse(&["--start", "2025-01", "--end", "2024-01", "dtes"]).unwrap();
    assert!(matches!(
        cli.extractor_config(),
        Err(CliError::ConfigurationError(ConfigError::Invalid(_)))
    ));
}

#[test]
fn test_blank_token_is_missing() {
    let cli = parse(&["--user-token", "  ", "dtes"]).unwrap();
    assert!(matches!(
        cli.api_config(),
        Err(CliError::ConfigurationError(ConfigError::Missing("USER_TOKEN")))
    ));
}
