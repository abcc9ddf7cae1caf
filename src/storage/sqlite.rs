//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the SessionStore trait.

use crate::selection::CatalogItem;
use crate::session::{FilterSet, Session, DEFAULT_SESSION_ID};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CommitOutcome, SessionStore, StorageError, StorageResult};
use crate::DiscoveryError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite storage backend
///
/// The connection sits behind a mutex so one store can be shared by every
/// session pipeline of a tick. Other processes (the request layer) open the
/// same file; WAL mode lets them read while the crawler writes.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Creates a new SqliteSessionStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSessionStore)` - Successfully opened/created database
    /// * `Err(DiscoveryError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, DiscoveryError> {
        let conn = Connection::open(path).map_err(StorageError::from)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )
        .map_err(StorageError::from)?;

        initialize_schema(&conn).map_err(StorageError::from)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, DiscoveryError> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        initialize_schema(&conn).map_err(StorageError::from)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }
}

fn read_session(conn: &Connection, id: &str) -> StorageResult<Option<Session>> {
    let record: Option<String> = conn
        .query_row(
            "SELECT record FROM sessions WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    match record {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

fn remove_session(conn: &mut Connection, id: &str) -> StorageResult<()> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM session_items WHERE session_id = ?1", params![id])?;
    tx.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(())
}

fn insert_item(conn: &Connection, id: &str, record: &str) -> StorageResult<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO session_items (session_id, record, added_at) VALUES (?1, ?2, ?3)",
        params![id, record, Utc::now().to_rfc3339()],
    )?;
    Ok(inserted > 0)
}

impl SessionStore for SqliteSessionStore {
    // ===== Sessions =====

    fn list_sessions(&self) -> StorageResult<Vec<Session>> {
        let mut conn = self.lock()?;

        let rows = {
            let mut stmt = conn.prepare("SELECT id, record FROM sessions ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let mut sessions = Vec::with_capacity(rows.len());
        for (id, json) in rows {
            match serde_json::from_str::<Session>(&json) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    // Without a readable last-seen time it could never expire
                    tracing::warn!("Deleting undecodable session {}: {}", id, e);
                    remove_session(&mut conn, &id)?;
                }
            }
        }

        Ok(sessions)
    }

    fn get_session(&self, id: &str) -> StorageResult<Option<Session>> {
        let conn = self.lock()?;
        read_session(&conn, id)
    }

    fn upsert_session(&self, session: &Session) -> StorageResult<()> {
        let record = serde_json::to_string(session)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sessions (id, record, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET record = excluded.record, updated_at = excluded.updated_at",
            params![session.id, record, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn delete_session(&self, id: &str) -> StorageResult<()> {
        let mut conn = self.lock()?;
        remove_session(&mut conn, id)
    }

    fn set_term_length(&self, id: &str, term_length: u32) -> StorageResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(session) = read_session(&tx, id)? {
            let updated = session.with_term_length(term_length);
            tx.execute(
                "UPDATE sessions SET record = ?1, updated_at = ?2 WHERE id = ?3",
                params![
                    serde_json::to_string(&updated)?,
                    Utc::now().to_rfc3339(),
                    id
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // ===== Caches =====

    fn cache_count(&self, id: &str) -> StorageResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM session_items WHERE session_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn cache_push(&self, id: &str, item: &CatalogItem) -> StorageResult<bool> {
        let record = serde_json::to_string(item)?;
        let conn = self.lock()?;
        insert_item(&conn, id, &record)
    }

    fn cache_pop(&self, id: &str) -> StorageResult<Option<CatalogItem>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let row: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, record FROM session_items WHERE session_id = ?1 ORDER BY RANDOM() LIMIT 1",
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((row_id, record)) = row else {
            return Ok(None);
        };

        tx.execute("DELETE FROM session_items WHERE id = ?1", params![row_id])?;
        tx.commit()?;

        Ok(Some(serde_json::from_str(&record)?))
    }

    fn push_if_filters_match(
        &self,
        id: &str,
        expected: &FilterSet,
        items: &[CatalogItem],
    ) -> StorageResult<CommitOutcome> {
        let records = items
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;

        let mut conn = self.lock()?;
        // IMMEDIATE takes the write lock up front, so the request layer cannot
        // replace the session between the check and the inserts.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if id != DEFAULT_SESSION_ID {
            match read_session(&tx, id)? {
                None => return Ok(CommitOutcome::SessionGone),
                Some(current) if current.effective_filters() != *expected => {
                    return Ok(CommitOutcome::FiltersChanged);
                }
                Some(_) => {}
            }
        }

        let mut added = 0;
        for record in &records {
            if insert_item(&tx, id, record)? {
                added += 1;
            }
        }

        tx.commit()?;
        Ok(CommitOutcome::Committed(added))
    }
}
