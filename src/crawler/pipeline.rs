//! Per-session search pipeline
//!
//! One pipeline runs for every eligible session in a tick: search, select,
//! enrich. Pipelines never touch the store; the coordinator commits their
//! output afterwards so a rate-limited tick can be abandoned without writes.

use crate::catalog::{CatalogApi, SearchQuery};
use crate::selection::{CandidateSelector, CatalogItem};
use crate::session::{FilterSet, Session};
use crate::{DiscoveryError, Result};
use rand::rngs::StdRng;

/// Everything a pipeline needs, fixed before any request is made
#[derive(Debug)]
pub struct SessionPlan {
    pub session: Session,
    /// The filters the query was built from; the commit is checked against them
    pub filters: FilterSet,
    pub query: SearchQuery,
    pub rng: StdRng,
}

/// What a pipeline produced for its session
#[derive(Debug)]
pub struct PipelineOutput {
    pub session: Session,
    pub filters: FilterSet,
    pub result: Result<Vec<CatalogItem>>,
}

/// Runs search, selection and enrichment for one session
///
/// An empty search result is not an error here; it yields zero items.
pub async fn run_pipeline(
    catalog: &dyn CatalogApi,
    selector: &CandidateSelector,
    plan: SessionPlan,
) -> PipelineOutput {
    let SessionPlan {
        session,
        filters,
        query,
        mut rng,
    } = plan;

    tracing::debug!("Session {}: searching {:?}", session.id, query.q());

    let result = match catalog.search(&query).await {
        Ok(raw) => {
            let found = raw.len();
            let selected = selector
                .select_and_enrich(catalog, raw, filters.popularity_range.as_ref(), &mut rng)
                .await;
            if let Ok(items) = &selected {
                tracing::debug!(
                    "Session {}: picked {} of {} tracks",
                    session.id,
                    items.len(),
                    found
                );
            }
            selected
        }
        Err(e) => Err(e),
    };

    let result = match result {
        Err(DiscoveryError::EmptyResult) => {
            tracing::debug!("Session {}: search returned nothing", session.id);
            Ok(Vec::new())
        }
        other => other,
    };

    PipelineOutput {
        session,
        filters,
        result,
    }
}
