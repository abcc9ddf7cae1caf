//! Crawler module for cache replenishment
//!
//! This module contains the core replenishment logic, including:
//! - The per-session search, select and enrich pipeline
//! - Adaptive term-length tuning
//! - The tick loop with expiry, capacity filtering and rate-limit backoff

mod coordinator;
mod pipeline;
mod tuning;

pub use coordinator::{Coordinator, SessionOutcome, TickReport};
pub use pipeline::{run_pipeline, PipelineOutput, SessionPlan};
pub use tuning::adapt_term_length;

use crate::catalog::{build_http_client, HttpCatalog};
use crate::config::Config;
use crate::credentials::{ClientCredentials, CredentialManager};
use crate::query::{Corpus, QueryTermGenerator};
use crate::selection::CandidateSelector;
use crate::storage::open_store;
use crate::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

/// Wires a coordinator from configuration and the environment
///
/// Reads the upstream client credentials from the environment, opens the
/// shared store and loads the query corpus and genre playlist table.
///
/// # Returns
///
/// * `Ok(Coordinator)` - Ready to tick
/// * `Err(DiscoveryError::Config)` - Client credentials are missing
/// * `Err(DiscoveryError)` - The store or a corpus file could not be opened
pub fn build_coordinator(config: &Config) -> Result<Coordinator> {
    let client_credentials = ClientCredentials::from_env()?;
    let client = build_http_client(&config.upstream)?;

    let credentials = Arc::new(CredentialManager::new(
        client.clone(),
        config.upstream.token_url.as_str(),
        client_credentials,
        &config.credentials,
    ));
    let catalog = HttpCatalog::new(client, &config.upstream.api_base_url, credentials);

    let store = open_store(Path::new(&config.store.database_path))?;
    let selector = CandidateSelector::from_config(config.crawler.picks_per_search, &config.corpus)?;
    let generator = QueryTermGenerator::new(Corpus::load(&config.corpus)?);

    tracing::info!(
        "Using store {} and upstream {}",
        config.store.database_path,
        config.upstream.api_base_url
    );

    Ok(Coordinator::new(
        config,
        Arc::new(store),
        Arc::new(catalog),
        selector,
        generator,
    ))
}

/// Runs the crawl loop until `shutdown` flips to true
///
/// # Example
///
/// ```no_run
/// use discovery_crawler::config::load_config;
/// use discovery_crawler::crawler::run_crawler;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("discovery.toml"))?;
/// let (_tx, rx) = tokio::sync::watch::channel(false);
/// run_crawler(&config, rx).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawler(config: &Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    let mut coordinator = build_coordinator(config)?;
    coordinator.run(shutdown).await
}
