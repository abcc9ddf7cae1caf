//! Output module for reporting on the shared store
//!
//! This module handles printing cache fill levels for `--stats`.

pub mod stats;

pub use stats::{load_statistics, print_statistics, CacheStatistics};
