use crate::session::filters::FilterSet;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Id of the synthetic, unfiltered shared pool
pub const DEFAULT_SESSION_ID: &str = "default";

/// Capacity the request layer gives newly created sessions
pub const DEFAULT_SESSION_CAPACITY: u64 = 50;

/// Term length the request layer gives newly created sessions
pub const DEFAULT_TERM_LENGTH: u32 = 5;

/// A requester's standing filter request
///
/// Sessions are created and refreshed by the request layer. The crawler only
/// reads them, tunes `term_length`, and deletes them once they expire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<FilterSet>,

    pub last_seen_at: DateTime<Utc>,

    pub cache_capacity: u64,

    /// Length of generated query terms; always >= 1
    #[serde(default = "default_term_length", deserialize_with = "at_least_one")]
    pub term_length: u32,
}

fn default_term_length() -> u32 {
    DEFAULT_TERM_LENGTH
}

fn at_least_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(u32::deserialize(deserializer)?.max(1))
}

impl Session {
    /// Creates a session the way the request layer does on first contact
    pub fn new(id: impl Into<String>, filters: Option<FilterSet>) -> Self {
        Self {
            id: id.into(),
            filters,
            last_seen_at: Utc::now(),
            cache_capacity: DEFAULT_SESSION_CAPACITY,
            term_length: DEFAULT_TERM_LENGTH,
        }
    }

    /// Builds the synthetic default session; it is always freshly seen
    pub fn default_pool(capacity: u64, term_length: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: DEFAULT_SESSION_ID.to_string(),
            filters: None,
            last_seen_at: now,
            cache_capacity: capacity,
            term_length: term_length.max(1),
        }
    }

    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_term_length(mut self, term_length: u32) -> Self {
        self.term_length = term_length.max(1);
        self
    }

    pub fn with_last_seen_at(mut self, last_seen_at: DateTime<Utc>) -> Self {
        self.last_seen_at = last_seen_at;
        self
    }

    /// Returns true for the shared, unfiltered pool
    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_SESSION_ID
    }

    /// Checks whether the session has gone unseen for longer than `window`
    ///
    /// The default pool never expires.
    pub fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        !self.is_default() && now - self.last_seen_at > window
    }

    /// The session's filters, with "no filters" normalized to an empty set
    pub fn effective_filters(&self) -> FilterSet {
        self.filters.clone().unwrap_or_default()
    }
}
