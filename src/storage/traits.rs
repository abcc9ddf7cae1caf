//! Storage traits and error types
//!
//! This module defines the crawler's narrow view of the shared session store
//! and the associated error types.

use crate::selection::CatalogItem;
use crate::session::{FilterSet, Session, DEFAULT_SESSION_ID};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result of a conditional cache write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Filters matched; this many new records were added
    Committed(u64),
    /// The session's filters no longer match the expected ones
    FiltersChanged,
    /// The session was deleted in the meantime
    SessionGone,
}

/// Cache fill level of one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStats {
    pub id: String,
    pub cached: u64,
    /// `None` for the default pool, whose capacity lives in configuration
    pub capacity: Option<u64>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub term_length: Option<u32>,
}

/// Trait for shared session store backends
///
/// Every method is atomic on its own; no transaction spans two calls.
/// Implementations must be shareable across the tick's session pipelines.
pub trait SessionStore: Send + Sync {
    // ===== Sessions =====

    /// Lists every stored session
    ///
    /// Records that cannot be decoded are skipped.
    fn list_sessions(&self) -> StorageResult<Vec<Session>>;

    /// Gets a session by id
    fn get_session(&self, id: &str) -> StorageResult<Option<Session>>;

    /// Creates or replaces a session record (request layer side)
    fn upsert_session(&self, session: &Session) -> StorageResult<()>;

    /// Deletes a session together with its cache
    fn delete_session(&self, id: &str) -> StorageResult<()>;

    /// Updates only the term length of a session; no-op if it is gone
    fn set_term_length(&self, id: &str, term_length: u32) -> StorageResult<()>;

    // ===== Caches =====

    /// Number of records cached for a session
    fn cache_count(&self, id: &str) -> StorageResult<u64>;

    /// Adds a record to a session's cache
    ///
    /// Returns false when the identical record was already cached.
    fn cache_push(&self, id: &str, item: &CatalogItem) -> StorageResult<bool>;

    /// Removes and returns a random record (request layer side)
    fn cache_pop(&self, id: &str) -> StorageResult<Option<CatalogItem>>;

    /// Adds records only if the session still carries `expected` filters
    ///
    /// The filter check and the writes happen atomically.
    fn push_if_filters_match(
        &self,
        id: &str,
        expected: &FilterSet,
        items: &[CatalogItem],
    ) -> StorageResult<CommitOutcome>;

    // ===== Statistics =====

    /// Fill levels for the default pool and every stored session
    fn session_stats(&self) -> StorageResult<Vec<SessionStats>> {
        let mut stats = vec![SessionStats {
            id: DEFAULT_SESSION_ID.to_string(),
            cached: self.cache_count(DEFAULT_SESSION_ID)?,
            capacity: None,
            last_seen_at: None,
            term_length: None,
        }];

        for session in self.list_sessions()? {
            stats.push(SessionStats {
                cached: self.cache_count(&session.id)?,
                capacity: Some(session.cache_capacity),
                last_seen_at: Some(session.last_seen_at),
                term_length: Some(session.term_length),
                id: session.id,
            });
        }

        Ok(stats)
    }
}
