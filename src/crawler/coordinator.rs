//! Crawler coordinator - main replenishment loop
//!
//! This module contains the tick loop that keeps every session's cache
//! filled, including:
//! - Expiring sessions that have not been seen recently
//! - Skipping sessions whose cache is already full
//! - Running the per-session search pipelines with bounded fan-out
//! - Abandoning a tick when the upstream rate-limits us
//! - Committing picks only to sessions whose filters are unchanged
//! - Adapting each session's query term length

use crate::catalog::{CatalogApi, SearchQuery};
use crate::config::{Config, CrawlerConfig, DefaultPoolConfig};
use crate::crawler::pipeline::{run_pipeline, PipelineOutput, SessionPlan};
use crate::crawler::tuning::adapt_term_length;
use crate::query::QueryTermGenerator;
use crate::selection::CandidateSelector;
use crate::session::Session;
use crate::storage::{CommitOutcome, SessionStore};
use crate::Result;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// What happened to one session during a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Picks were committed; `written` excludes records already cached
    Committed { picked: usize, written: u64 },
    /// The session changed or vanished mid-tick; picks were dropped
    Discarded,
    /// An upstream error other than rate limiting; retried next tick
    Failed,
}

/// Summary of a single tick
#[derive(Debug, Default)]
pub struct TickReport {
    /// Sessions deleted for inactivity
    pub expired: Vec<String>,
    /// Sessions skipped because their cache was full
    pub full: Vec<String>,
    /// Per-session results, in session order
    pub outcomes: Vec<(String, SessionOutcome)>,
    /// True when the tick was abandoned on a rate-limit signal
    pub rate_limited: bool,
    /// Upstream's Retry-After hint, if any
    pub retry_after: Option<u64>,
}

impl TickReport {
    /// Outcome recorded for a session, if it was processed
    pub fn outcome(&self, id: &str) -> Option<&SessionOutcome> {
        self.outcomes
            .iter()
            .find(|(session_id, _)| session_id == id)
            .map(|(_, outcome)| outcome)
    }

    /// Total number of new records written this tick
    pub fn items_written(&self) -> u64 {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                SessionOutcome::Committed { written, .. } => *written,
                _ => 0,
            })
            .sum()
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    settings: CrawlerConfig,
    default_pool: DefaultPoolConfig,
    store: Arc<dyn SessionStore>,
    catalog: Arc<dyn CatalogApi>,
    selector: CandidateSelector,
    generator: QueryTermGenerator,
    // The default pool has no stored record, so its tuning lives here
    default_term_length: u32,
    rng: StdRng,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `store` - The shared session store
    /// * `catalog` - Upstream catalog access
    /// * `selector` - Candidate selection settings
    /// * `generator` - Query term source
    pub fn new(
        config: &Config,
        store: Arc<dyn SessionStore>,
        catalog: Arc<dyn CatalogApi>,
        selector: CandidateSelector,
        generator: QueryTermGenerator,
    ) -> Self {
        Self {
            settings: config.crawler.clone(),
            default_pool: config.default_pool.clone(),
            store,
            catalog,
            selector,
            generator,
            default_term_length: config.default_pool.term_length.max(1),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Makes genre draws and pick order repeatable
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Current term length of the default pool
    pub fn default_term_length(&self) -> u32 {
        self.default_term_length
    }

    /// How long to wait after a tick
    pub fn next_pause(&self, report: &TickReport) -> Duration {
        if report.rate_limited {
            self.settings.rate_limit_backoff()
        } else {
            self.settings.tick_interval()
        }
    }

    /// Runs one full pass over every session
    ///
    /// # Returns
    ///
    /// * `Ok(TickReport)` - The tick finished or was abandoned on a rate limit
    /// * `Err(DiscoveryError)` - The store failed; nothing after the failure ran
    pub async fn tick(&mut self) -> Result<TickReport> {
        let now = Utc::now();
        let mut report = TickReport::default();

        // Collect and expire
        let mut working = vec![Session::default_pool(
            self.default_pool.capacity,
            self.default_term_length,
            now,
        )];

        for session in self.store.list_sessions()? {
            if session.is_default() {
                tracing::warn!("Ignoring stored record for the default session");
                continue;
            }

            if session.is_expired(now, self.settings.session_expiry()) {
                self.store.delete_session(&session.id)?;
                tracing::info!(
                    "Expired session {} (last seen {})",
                    session.id,
                    session.last_seen_at
                );
                report.expired.push(session.id);
                continue;
            }

            working.push(session);
        }

        // Capacity filter, then plan each remaining session's search
        let mut plans = Vec::with_capacity(working.len());
        for session in working {
            let cached = self.store.cache_count(&session.id)?;
            if cached >= session.cache_capacity {
                tracing::debug!(
                    "Session {} is full ({}/{})",
                    session.id,
                    cached,
                    session.cache_capacity
                );
                report.full.push(session.id);
                continue;
            }
            plans.push(self.plan(session));
        }

        if plans.is_empty() {
            tracing::debug!("No sessions need items this tick");
            return Ok(report);
        }

        let outputs = match self.gather(plans).await {
            Ok(outputs) => outputs,
            Err(retry_after) => {
                tracing::warn!(
                    "Upstream rate limit hit; abandoning tick (retry after {:?}s)",
                    retry_after
                );
                report.rate_limited = true;
                report.retry_after = retry_after;
                return Ok(report);
            }
        };

        for output in outputs {
            let (id, outcome) = self.commit(output)?;
            report.outcomes.push((id, outcome));
        }

        tracing::info!(
            "Tick complete: {} sessions searched, {} items written, {} expired, {} full",
            report.outcomes.len(),
            report.items_written(),
            report.expired.len(),
            report.full.len()
        );

        Ok(report)
    }

    /// Runs ticks until the shutdown signal flips to true
    ///
    /// Shutdown is only observed between ticks. Store failures are logged and
    /// the tick is retried after the normal interval.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        tracing::info!(
            "Starting crawl loop (tick every {:?}, backoff {:?})",
            self.settings.tick_interval(),
            self.settings.rate_limit_backoff()
        );

        let mut ticks: u64 = 0;
        loop {
            if *shutdown.borrow() {
                break;
            }

            let pause = match self.tick().await {
                Ok(report) => self.next_pause(&report),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    tracing::error!("Tick failed: {}", e);
                    self.settings.tick_interval()
                }
            };
            ticks += 1;

            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Crawl loop stopped after {} ticks", ticks);
        Ok(())
    }

    /// Runs exactly one tick
    pub async fn run_once(&mut self) -> Result<TickReport> {
        self.tick().await
    }

    fn plan(&mut self, session: Session) -> SessionPlan {
        let filters = session.effective_filters();
        let term = self.generator.next(session.term_length);
        let query = SearchQuery::build(term, &filters, self.settings.search_limit, &mut self.rng);
        let rng = StdRng::seed_from_u64(self.rng.random());

        SessionPlan {
            session,
            filters,
            query,
            rng,
        }
    }

    /// Runs every pipeline; stops at the first rate-limit signal
    async fn gather(
        &self,
        plans: Vec<SessionPlan>,
    ) -> std::result::Result<Vec<PipelineOutput>, Option<u64>> {
        let catalog = self.catalog.as_ref();
        let selector = &self.selector;

        let mut pipelines = stream::iter(plans)
            .map(|plan| run_pipeline(catalog, selector, plan))
            .buffered(self.settings.max_concurrent_sessions.max(1));

        let mut outputs = Vec::new();
        while let Some(output) = pipelines.next().await {
            match &output.result {
                Err(e) if e.is_rate_limited() => return Err(e.retry_after()),
                _ => outputs.push(output),
            }
        }

        Ok(outputs)
    }

    /// Writes one session's picks and adapts its term length
    fn commit(&mut self, output: PipelineOutput) -> Result<(String, SessionOutcome)> {
        let PipelineOutput {
            session,
            filters,
            result,
        } = output;

        let items = match result {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!("Skipping session {} this tick: {}", session.id, e);
                return Ok((session.id, SessionOutcome::Failed));
            }
        };

        let picked = items.len();
        let written = match self
            .store
            .push_if_filters_match(&session.id, &filters, &items)?
        {
            CommitOutcome::Committed(written) => written,
            CommitOutcome::FiltersChanged => {
                tracing::info!(
                    "Session {} changed filters mid-tick; dropping {} picks",
                    session.id,
                    picked
                );
                return Ok((session.id, SessionOutcome::Discarded));
            }
            CommitOutcome::SessionGone => {
                tracing::debug!("Session {} disappeared mid-tick", session.id);
                return Ok((session.id, SessionOutcome::Discarded));
            }
        };

        if written > 0 {
            tracing::info!("Session {}: cached {} new items", session.id, written);
        }

        let next = adapt_term_length(session.term_length, picked, self.selector.max_picks());
        if next != session.term_length {
            tracing::debug!(
                "Session {}: term length {} -> {}",
                session.id,
                session.term_length,
                next
            );
            if session.is_default() {
                self.default_term_length = next;
            } else {
                self.store.set_term_length(&session.id, next)?;
            }
        }

        Ok((session.id, SessionOutcome::Committed { picked, written }))
    }
}
