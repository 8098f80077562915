//! Stoker main entry point
//!
//! This is the command-line interface for the stoker cache warmer.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use stoker::config::load_config_with_hash;
use stoker::warmer::warm;
use tracing_subscriber::EnvFilter;

/// Stoker: a CDN cache warming crawler
///
/// Stoker probes a site's pages with header-only requests, fully fetches
/// the cache misses, and warms the resources those pages reference so a
/// downstream cache serves real visitors without cold-start latency.
#[derive(Parser, Debug)]
#[command(name = "stoker")]
#[command(version = "1.0.0")]
#[command(about = "A CDN cache warming crawler", long_about = None)]
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

    /// Validate config and show what would be warmed without any requests
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_warm(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("stoker=info,warn"),
            1 => EnvFilter::new("stoker=debug,info"),
            2 => EnvFilter::new("stoker=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the warming plan
fn handle_dry_run(config: &stoker::config::Config) {
    println!("=== Stoker Dry Run ===\n");

    println!("Warmer Configuration:");
    println!("  Base URL: {}", config.warmer.base_url);
    println!("  Batch size: {}", config.warmer.batch_size);

    println!(
        "\nAllowed Base URLs ({}):",
        config.warmer.allowed_base_urls.len()
    );
    for base in &config.warmer.allowed_base_urls {
        println!("  - {}", base);
    }

    if config.cache_headers.is_empty() {
        println!("\nCache Header Rules: defaults (x-cache, cf-cache-status)");
    } else {
        println!("\nCache Header Rules (merged over defaults):");
        for (header, values) in &config.cache_headers {
            println!("  - {} contains any of {:?}", header, values);
        }
    }

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        if seed.invalidate {
            println!("  - {} (always warm)", seed.path);
        } else {
            println!("  - {}", seed.path);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would warm {} seed URLs", config.seeds.len());
}

/// Handles the main warming operation
async fn handle_warm(config: stoker::config::Config) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, allowed base URLs: {}",
        config.seeds.len(),
        config.warmer.allowed_base_urls.len()
    );

    match warm(config).await {
        Ok(()) => {
            tracing::info!("Warming run completed");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Warming run failed: {}", e);
            Err(e.into())
        }
    }
}
