//! Search query construction

use crate::session::{DateRange, FilterSet};
use rand::seq::IteratorRandom;
use rand::Rng;

/// A fully built search request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// The generated free-text term
    pub term: String,
    /// Genre qualifier, if the session constrains genres
    pub genre: Option<String>,
    /// Year qualifier, if the session has a date range
    pub years: Option<DateRange>,
    /// Number of results requested
    pub limit: u32,
}

impl SearchQuery {
    /// Builds a query from a generated term and the session's filters
    ///
    /// The upstream accepts a single genre qualifier, so when the session
    /// names several genres one is drawn at random for each search.
    pub fn build<R: Rng + ?Sized>(
        term: String,
        filters: &FilterSet,
        limit: u32,
        rng: &mut R,
    ) -> Self {
        Self {
            term,
            genre: filters.genres.iter().choose(rng).cloned(),
            years: filters.date_range,
            limit,
        }
    }

    /// The `q` parameter: term followed by upstream qualifiers
    pub fn q(&self) -> String {
        let mut q = self.term.clone();

        if let Some(genre) = &self.genre {
            q.push_str(&format!(" genre:\"{}\"", genre));
        }

        if let Some(years) = &self.years {
            q.push_str(&format!(" year:{}-{}", years.start, years.end));
        }

        q
    }

    /// Query string parameters for the search endpoint
    pub fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.q()),
            ("type", "track".to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}
