//! Candidate selection
//!
//! Turns one search's raw tracks into cached items:
//! 1. Drop tracks outside the session's popularity range
//! 2. Pick at most one track per lead artist
//! 3. Resolve genre tags for every artist of the picks in one batched lookup
//! 4. Convert to [`CatalogItem`] records

mod enrich;
mod item;
mod picker;

pub use enrich::{distinct_artist_ids, enrich_candidates, merge_genres, GenreLinks};
pub use item::{ArtistLink, CatalogItem, GenreLink, Link};
pub use picker::select_candidates;

use crate::catalog::{CatalogApi, Track};
use crate::config::CorpusConfig;
use crate::session::PopularityRange;
use crate::Result;
use rand::Rng;
use std::path::Path;

/// Selection settings shared by every session pipeline
#[derive(Debug, Clone)]
pub struct CandidateSelector {
    max_picks: usize,
    genre_links: GenreLinks,
}

impl CandidateSelector {
    pub fn new(max_picks: usize, genre_links: GenreLinks) -> Self {
        Self {
            max_picks,
            genre_links,
        }
    }

    /// Builds a selector, loading the genre playlist table if configured
    pub fn from_config(max_picks: usize, corpus: &CorpusConfig) -> Result<Self> {
        let links = match &corpus.genre_playlists_path {
            Some(path) => GenreLinks::load(Path::new(path), &corpus.genre_playlist_base_url)?,
            None => GenreLinks::new(Default::default(), &corpus.genre_playlist_base_url),
        };
        Ok(Self::new(max_picks, links))
    }

    /// The per-search pick target
    pub fn max_picks(&self) -> usize {
        self.max_picks
    }

    /// Picks from `raw`
    pub fn select<R: Rng + ?Sized>(
        &self,
        raw: Vec<Track>,
        popularity: Option<&PopularityRange>,
        rng: &mut R,
    ) -> Result<Vec<Track>> {
        select_candidates(raw, self.max_picks, popularity, rng)
    }

    /// Picks from `raw`, then enriches and converts the picks
    pub async fn select_and_enrich<R: Rng + Send + ?Sized>(
        &self,
        catalog: &dyn CatalogApi,
        raw: Vec<Track>,
        popularity: Option<&PopularityRange>,
        rng: &mut R,
    ) -> Result<Vec<CatalogItem>> {
        let picks = self.select(raw, popularity, rng)?;
        enrich_candidates(catalog, picks, &self.genre_links).await
    }
}
