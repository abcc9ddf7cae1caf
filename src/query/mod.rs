//! Search term generation
//!
//! Terms are deliberately random so repeated searches keep surfacing new
//! parts of the catalog. Their length is the knob the crawler tunes per
//! session: shorter terms match more tracks.

mod corpus;
mod generator;

pub use corpus::{parse_word_list, Corpus};
pub use generator::{QueryTermGenerator, TermStrategy};
