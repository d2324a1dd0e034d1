//! Pricing pipeline main entry point
//!
//! This is the command-line interface for the scrape → rate → transform → load job.

use clap::Parser;
use pricing_pipeline::config::{load_config_with_hash, validate, Config};
use pricing_pipeline::output::{load_statistics, print_statistics};
use pricing_pipeline::pipeline;
use pricing_pipeline::storage::{LoadMode, SqliteStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pricing pipeline: scrape a catalogue, convert prices, load a product table
///
/// Each run collects listings from a paginated catalogue, fetches the daily
/// exchange rate, converts and classifies every listing, and loads the
/// resulting products into SQLite.
#[derive(Parser, Debug)]
#[command(name = "pricing-pipeline")]
#[command(version)]
#[command(about = "Scrape, convert and load a product catalog", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the configured load mode (replace or upsert)
    #[arg(long, value_name = "MODE")]
    mode: Option<LoadMode>,

    /// Override the configured page limit
    #[arg(long, value_name = "N")]
    pages: Option<u32>,

    /// Validate config and show what a run would do without running it
    #[arg(long, conflicts_with_all = ["stats", "init_db"])]
    dry_run: bool,

    /// Show catalog statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "init_db"])]
    stats: bool,

    /// Create the database tables and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    init_db: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if apply_overrides(&mut config, &cli) {
        validate(&config)?;
    }

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.init_db {
        handle_init_db(&config)?;
    } else {
        handle_run(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pricing_pipeline=info,warn"),
            1 => EnvFilter::new("pricing_pipeline=debug,info"),
            2 => EnvFilter::new("pricing_pipeline=trace,debug"),
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

/// Applies `--mode` and `--pages`; returns true if anything changed
fn apply_overrides(config: &mut Config, cli: &Cli) -> bool {
    let mut changed = false;

    if let Some(mode) = cli.mode {
        tracing::info!("Load mode overridden: {} -> {}", config.output.load_mode, mode);
        config.output.load_mode = mode;
        changed = true;
    }

    if let Some(pages) = cli.pages {
        tracing::info!("Page limit overridden: {} -> {}", config.source.page_limit, pages);
        config.source.page_limit = pages;
        changed = true;
    }

    changed
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, config_hash: &str) {
    println!("=== Pricing Pipeline Dry Run ===\n");

    println!("Source:");
    println!("  Base URL: {}", config.source.base_url);
    println!("  Page limit: {}", config.source.page_limit);
    println!("  Fetch categories: {}", config.source.fetch_categories);
    println!("  Request timeout: {}s", config.source.request_timeout_secs);
    println!("  User agent: {}", config.source.user_agent);

    println!("\nExchange Rate:");
    println!("  API URL: {}", config.rate.api_url);
    println!(
        "  Pair: {} -> {}",
        config.rate.base_currency, config.rate.target_currency
    );
    println!("  Request timeout: {}s", config.rate.request_timeout_secs);

    println!("\nRetry:");
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!(
        "  Backoff: {}ms doubling up to {}ms",
        config.retry.initial_backoff_ms, config.retry.max_backoff_ms
    );

    println!("\nPricing:");
    println!(
        "  Tiers: CHEAP < {} <= MODERATE < {} <= EXPENSIVE ({})",
        config.pricing.cheap_below, config.pricing.expensive_from, config.rate.target_currency
    );
    println!("  Identifier includes price: {}", config.pricing.id_includes_price);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Load mode: {}", config.output.load_mode);
    println!("  Capture raw listings: {}", config.output.capture_raw);
    println!("  Write timeout: {}s", config.output.write_timeout_secs);
    match config.output.max_dropped_records {
        Some(limit) => println!("  Max dropped records: {}", limit),
        None => println!("  Max dropped records: unlimited"),
    }
    if let Some(dir) = &config.output.artifacts_dir {
        println!("  Artifacts: {}", dir);
    }

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let store = SqliteStore::from_config(&config.output)?;
    let stats = load_statistics(&store, &config.rate.base_currency, &config.rate.target_currency)?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the --init-db mode: creates tables and indexes
fn handle_init_db(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::from_config(&config.output)?;
    store.initialize()?;

    println!("✓ Schema initialized in {}", config.output.database_path);

    Ok(())
}

/// Handles the main pipeline run
async fn handle_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting run: {} page(s), {} load",
        config.source.page_limit,
        config.output.load_mode
    );

    match pipeline::run(config).await {
        Ok(summary) => {
            tracing::info!("Run completed: {}", summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                "Run failed ({}): {}",
                if e.is_retryable() { "retryable" } else { "fatal" },
                e
            );
            Err(e.into())
        }
    }
}
