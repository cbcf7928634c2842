//! Fitment-Harvester main entry point
//!
//! This is the command-line interface for the Fitment-Harvester product and
//! fitment scraper.

use anyhow::Context;
use clap::Parser;
use fitment_harvester::config::{load_config_with_hash, validate, Config, OutputFormat};
use fitment_harvester::discovery::UrlDiscoveryEngine;
use fitment_harvester::driver::HttpDriver;
use fitment_harvester::output::{create_writer, print_statistics};
use fitment_harvester::{Harvester, HealthState};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Fitment-Harvester: product and vehicle-fitment extraction
///
/// Fitment-Harvester discovers every candidate product page of a parts
/// catalog, fetches each one through a retrying, challenge-aware fetch loop
/// and writes one row per (product, fitment) pair.
#[derive(Parser, Debug)]
#[command(name = "fitment-harvester")]
#[command(version)]
#[command(about = "Product and vehicle-fitment extraction", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Scrape a single product page instead of the whole catalog
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Output file, overriding the configured path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Output format, overriding the configured format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Validate config and show the discovery plan without fetching anything
    #[arg(long, conflicts_with_all = ["url", "discover_only"])]
    dry_run: bool,

    /// Run discovery only and print the candidate URLs
    #[arg(long, conflicts_with = "url")]
    discover_only: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load(cli.config.as_deref())?;
    if let Some(output) = &cli.output {
        config.output.path = output.display().to_string();
    }
    if let Some(format) = cli.format {
        config.output.format = format;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.discover_only {
        handle_discover_only(config).await
    } else {
        handle_harvest(config, cli.url.as_deref()).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("fitment_harvester=info,warn"),
            1 => EnvFilter::new("fitment_harvester=debug,info"),
            2 => EnvFilter::new("fitment_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or validated defaults when none is given
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

/// Handles the --dry-run mode: shows the configuration and discovery plan
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Fitment-Harvester Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Domain: {}", config.site.domain);
    println!("  Manufacturer: {}", config.site.manufacturer);

    println!("\nFetch:");
    println!("  Max attempts: {}", config.fetch.max_attempts);
    println!(
        "  Settle delay: {}-{}ms",
        config.fetch.settle_min_ms, config.fetch.settle_max_ms
    );
    println!(
        "  Circuit breaker: {} consecutive failures",
        config.fetch.max_consecutive_failures
    );

    println!("\nRelevance:");
    println!("  Keywords: {}", config.relevance.keywords.len());
    println!("  Exclusions: {}", config.relevance.exclude.len());

    println!("\nOutput:");
    println!("  Path: {}", config.output.path);
    println!("  Format: {:?}", config.output.format);

    let mut driver = HttpDriver::new(&config.fetch)?;
    let plan = UrlDiscoveryEngine::new(&mut driver, config)?.plan();
    println!("\nDiscovery seeds ({}):", plan.len());
    for url in &plan {
        println!("  - {}", url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the --discover-only mode: prints every candidate URL
async fn handle_discover_only(config: Config) -> anyhow::Result<()> {
    let driver = HttpDriver::new(&config.fetch)?;
    let mut harvester = Harvester::new(driver, config, HealthState::shared())?;

    let urls = harvester.discover().await?;
    for url in urls.iter() {
        println!("{}", url);
    }
    tracing::info!("Discovered {} candidate URLs", urls.len());
    Ok(())
}

/// Handles the main harvest: one product with --url, otherwise the catalog
async fn handle_harvest(config: Config, url: Option<&str>) -> anyhow::Result<()> {
    let output = PathBuf::from(&config.output.path);
    let mut writer = create_writer(config.output.format, &output)
        .with_context(|| format!("Failed to open output {}", output.display()))?;

    let driver = HttpDriver::new(&config.fetch)?;
    let health = HealthState::shared();
    let mut harvester = Harvester::new(driver, config, health.clone())?;

    let stats = match url {
        Some(url) => {
            tracing::info!("Scraping single product {}", url);
            harvester.scrape_all(&[url.to_string()], writer.as_mut()).await;
            writer.finish()?;
            harvester.stats().clone()
        }
        None => {
            tracing::info!("Starting full-catalog harvest");
            harvester.run_catalog(writer.as_mut()).await?
        }
    };

    tracing::info!("Harvest complete, output written to {}", output.display());
    print_statistics(&stats, Some(&health.snapshot()));
    Ok(())
}
