//! Statistics from the shared session store
//!
//! This module provides functionality for extracting and displaying
//! cache fill levels from the storage layer.

use crate::config::DefaultPoolConfig;
use crate::storage::{SessionStats, SessionStore};
use crate::Result;
use chrono::{DateTime, Utc};

/// Cache statistics summary
#[derive(Debug, Clone)]
pub struct CacheStatistics {
    /// Per-session fill levels, default pool first
    pub sessions: Vec<SessionStats>,

    /// Capacity of the default pool, from configuration
    pub default_capacity: u64,

    /// When the statistics were taken
    pub taken_at: DateTime<Utc>,
}

impl CacheStatistics {
    /// Total number of cached items across all sessions
    pub fn total_cached(&self) -> u64 {
        self.sessions.iter().map(|s| s.cached).sum()
    }

    /// Capacity of a session, falling back to the default pool's
    pub fn capacity_of(&self, stats: &SessionStats) -> u64 {
        stats.capacity.unwrap_or(self.default_capacity)
    }

    /// Sessions whose cache is at or above capacity
    pub fn full_sessions(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.cached >= self.capacity_of(s))
            .count()
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The session store to query
/// * `default_pool` - Default pool settings (its capacity is not stored)
///
/// # Returns
///
/// * `Ok(CacheStatistics)` - Successfully loaded statistics
/// * `Err(DiscoveryError)` - Failed to query statistics
pub fn load_statistics(
    store: &dyn SessionStore,
    default_pool: &DefaultPoolConfig,
) -> Result<CacheStatistics> {
    Ok(CacheStatistics {
        sessions: store.session_stats()?,
        default_capacity: default_pool.capacity,
        taken_at: Utc::now(),
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CacheStatistics) {
    println!("=== Cache Statistics ===\n");

    println!("Overview:");
    println!("  Sessions: {}", stats.sessions.len());
    println!("  Cached items: {}", stats.total_cached());
    println!("  Full sessions: {}", stats.full_sessions());
    println!();

    println!("Sessions:");
    for session in &stats.sessions {
        let capacity = stats.capacity_of(session);
        let percentage = if capacity > 0 {
            (session.cached as f64 / capacity as f64) * 100.0
        } else {
            0.0
        };

        let idle = session
            .last_seen_at
            .map(|seen| format!(", idle {}s", (stats.taken_at - seen).num_seconds()))
            .unwrap_or_default();
        let term = session
            .term_length
            .map(|t| format!(", term length {}", t))
            .unwrap_or_default();

        println!(
            "  {}: {} / {} ({:.1}%){}{}",
            session.id, session.cached, capacity, percentage, term, idle
        );
    }
}
