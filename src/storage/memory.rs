//! In-process storage implementation
//!
//! Keeps sessions and caches in memory, for tests and for embedding the
//! crawler in a process that serves requests from the same store.

use crate::selection::CatalogItem;
use crate::session::{FilterSet, Session, DEFAULT_SESSION_ID};
use crate::storage::traits::{CommitOutcome, SessionStore, StorageError, StorageResult};
use rand::seq::IteratorRandom;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    sessions: BTreeMap<String, Session>,
    // Serialized records; identical items collapse like in the SQL store
    caches: HashMap<String, HashSet<String>>,
}

/// Memory storage backend
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<Inner>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded copy of a session's cache, in no particular order
    pub fn cached_items(&self, id: &str) -> StorageResult<Vec<CatalogItem>> {
        let inner = self.lock()?;
        let Some(cache) = inner.caches.get(id) else {
            return Ok(Vec::new());
        };
        cache
            .iter()
            .map(|record| serde_json::from_str(record).map_err(StorageError::from))
            .collect()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StorageError::Poisoned)
    }
}

impl SessionStore for MemorySessionStore {
    fn list_sessions(&self) -> StorageResult<Vec<Session>> {
        Ok(self.lock()?.sessions.values().cloned().collect())
    }

    fn get_session(&self, id: &str) -> StorageResult<Option<Session>> {
        Ok(self.lock()?.sessions.get(id).cloned())
    }

    fn upsert_session(&self, session: &Session) -> StorageResult<()> {
        self.lock()?
            .sessions
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn delete_session(&self, id: &str) -> StorageResult<()> {
        let mut inner = self.lock()?;
        inner.sessions.remove(id);
        inner.caches.remove(id);
        Ok(())
    }

    fn set_term_length(&self, id: &str, term_length: u32) -> StorageResult<()> {
        let mut inner = self.lock()?;
        if let Some(session) = inner.sessions.remove(id) {
            inner
                .sessions
                .insert(id.to_string(), session.with_term_length(term_length));
        }
        Ok(())
    }

    fn cache_count(&self, id: &str) -> StorageResult<u64> {
        Ok(self
            .lock()?
            .caches
            .get(id)
            .map_or(0, |cache| cache.len() as u64))
    }

    fn cache_push(&self, id: &str, item: &CatalogItem) -> StorageResult<bool> {
        let record = serde_json::to_string(item)?;
        Ok(self
            .lock()?
            .caches
            .entry(id.to_string())
            .or_default()
            .insert(record))
    }

    fn cache_pop(&self, id: &str) -> StorageResult<Option<CatalogItem>> {
        let mut inner = self.lock()?;
        let Some(cache) = inner.caches.get_mut(id) else {
            return Ok(None);
        };

        let picked = cache.iter().choose(&mut rand::rng()).cloned();
        match picked {
            Some(record) => {
                cache.remove(&record);
                Ok(Some(serde_json::from_str(&record)?))
            }
            None => Ok(None),
        }
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

        let mut inner = self.lock()?;
        if id != DEFAULT_SESSION_ID {
            match inner.sessions.get(id) {
                None => return Ok(CommitOutcome::SessionGone),
                Some(current) if current.effective_filters() != *expected => {
                    return Ok(CommitOutcome::FiltersChanged);
                }
                Some(_) => {}
            }
        }

        let cache = inner.caches.entry(id.to_string()).or_default();
        let added = records
            .into_iter()
            .filter(|record| cache.insert(record.clone()))
            .count();

        Ok(CommitOutcome::Committed(added as u64))
    }
}
