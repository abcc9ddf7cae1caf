//! Storage module for the shared session store
//!
//! This module holds the crawler's view of the store it shares with the
//! request layer:
//! - Session records (standing filter requests)
//! - Per-session item caches (sets of serialized records)
//! - The conditional write used to commit a session's picks

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemorySessionStore;
pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteSessionStore;
pub use traits::{CommitOutcome, SessionStats, SessionStore, StorageError, StorageResult};

use crate::DiscoveryError;
use std::path::Path;

/// Opens the shared store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteSessionStore)` - Successfully opened store
/// * `Err(DiscoveryError)` - Failed to open the database
pub fn open_store(path: &Path) -> Result<SqliteSessionStore, DiscoveryError> {
    SqliteSessionStore::new(path)
}
