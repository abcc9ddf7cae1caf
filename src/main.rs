//! Discovery-Crawler main entry point
//!
//! This is the command-line interface for the catalog cache replenisher.

use anyhow::Context;
use clap::Parser;
use discovery_crawler::config::{load_config_with_hash, Config};
use discovery_crawler::crawler::{build_coordinator, run_crawler, SessionOutcome};
use discovery_crawler::credentials::ClientCredentials;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// Discovery-Crawler: keeps per-session catalog caches filled
///
/// Discovery-Crawler searches the upstream catalog with generated query
/// terms, picks artist-diverse tracks, and writes them into the session
/// store that the request layer serves from.
#[derive(Parser, Debug)]
#[command(name = "discovery-crawler")]
#[command(version = "1.0.0")]
#[command(about = "Catalog cache replenishment engine", long_about = None)]
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

    /// Validate config and show what would run without contacting upstream
    #[arg(long, conflicts_with_all = ["stats", "once"])]
    dry_run: bool,

    /// Show cache statistics from the store and exit
    #[arg(long, conflicts_with_all = ["dry_run", "once"])]
    stats: bool,

    /// Run a single tick and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((config, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e).context("invalid configuration");
        }
    };

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else if cli.once {
        handle_once(&config).await
    } else {
        handle_crawl(&config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("discovery_crawler=info,warn"),
            1 => EnvFilter::new("discovery_crawler=debug,info"),
            2 => EnvFilter::new("discovery_crawler=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would run
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Discovery-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Tick interval: {}ms", config.crawler.tick_interval_ms);
    println!(
        "  Rate limit backoff: {}s",
        config.crawler.rate_limit_backoff_secs
    );
    println!(
        "  Session expiry: {} minutes",
        config.crawler.session_expiry_minutes
    );
    println!("  Picks per search: {}", config.crawler.picks_per_search);
    println!("  Search limit: {}", config.crawler.search_limit);
    println!(
        "  Max concurrent sessions: {}",
        config.crawler.max_concurrent_sessions
    );

    println!("\nDefault Pool:");
    println!("  Capacity: {}", config.default_pool.capacity);
    println!("  Initial term length: {}", config.default_pool.term_length);

    println!("\nUpstream:");
    println!("  API: {}", config.upstream.api_base_url);
    println!("  Token endpoint: {}", config.upstream.token_url);
    println!("  User agent: {}", config.upstream.user_agent);

    println!("\nStore:");
    println!("  Database: {}", config.store.database_path);
    println!("  Token cache: {}", config.credentials.token_cache_path);

    match ClientCredentials::from_env() {
        Ok(credentials) => println!("\n✓ Client credentials found ({:?})", credentials),
        Err(e) => println!("\n✗ {}", e),
    }

    println!("✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows cache fill levels from the store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use discovery_crawler::output::{load_statistics, print_statistics};
    use discovery_crawler::storage::open_store;

    println!("Database: {}\n", config.store.database_path);

    let store = open_store(Path::new(&config.store.database_path))
        .context("failed to open the session store")?;
    let stats = load_statistics(&store, &config.default_pool)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --once mode: a single tick
async fn handle_once(config: &Config) -> anyhow::Result<()> {
    let mut coordinator = build_coordinator(config)?;
    let report = coordinator.run_once().await?;

    if report.rate_limited {
        println!(
            "Tick abandoned: upstream rate limit (retry after {:?}s)",
            report.retry_after
        );
        return Ok(());
    }

    for id in &report.expired {
        println!("  {}: expired", id);
    }
    for id in &report.full {
        println!("  {}: full", id);
    }
    for (id, outcome) in &report.outcomes {
        match outcome {
            SessionOutcome::Committed { picked, written } => {
                println!("  {}: picked {}, wrote {}", id, picked, written)
            }
            SessionOutcome::Discarded => println!("  {}: discarded (session changed)", id),
            SessionOutcome::Failed => println!("  {}: failed (see log)", id),
        }
    }
    println!("✓ Wrote {} items", report.items_written());

    Ok(())
}

/// Handles the main crawl loop until Ctrl-C
async fn handle_crawl(config: &Config) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested; finishing the current tick");
            let _ = shutdown_tx.send(true);
        }
    });

    match run_crawler(config, shutdown_rx).await {
        Ok(()) => {
            tracing::info!("Crawler stopped");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawler failed: {}", e);
            Err(e.into())
        }
    }
}
