//! Session model
//!
//! A session is one requester's standing filter request. The request layer
//! owns its lifecycle up to expiry; the crawler fills its cache.
//!
//! # Components
//!
//! - `Session`: the stored record, including the adaptive `term_length`
//! - `FilterSet`: optional date range, popularity range and genre constraint

mod filters;
mod record;

pub use filters::{DateRange, FilterSet, PopularityRange};
pub use record::{Session, DEFAULT_SESSION_CAPACITY, DEFAULT_SESSION_ID, DEFAULT_TERM_LENGTH};
