//! Genre enrichment for picked tracks

use crate::catalog::{CatalogApi, Track, ARTIST_BATCH_LIMIT};
use crate::selection::item::{CatalogItem, GenreLink};
use crate::Result;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Maps genre names to showcase playlists
#[derive(Debug, Clone, Default)]
pub struct GenreLinks {
    playlists: HashMap<String, String>,
    base_url: String,
}

impl GenreLinks {
    /// Creates a table from a genre → playlist id map
    pub fn new(playlists: HashMap<String, String>, base_url: impl Into<String>) -> Self {
        Self {
            playlists,
            base_url: base_url.into(),
        }
    }

    /// Loads a JSON object of genre → playlist id
    pub fn load(path: &Path, base_url: impl Into<String>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let playlists: HashMap<String, String> = serde_json::from_str(&content)?;
        tracing::info!("Loaded {} genre playlists from {}", playlists.len(), path.display());
        Ok(Self::new(playlists, base_url))
    }

    /// Builds the link for a genre; unknown genres get no URL
    pub fn link(&self, genre: &str) -> GenreLink {
        GenreLink {
            name: genre.to_string(),
            url: self
                .playlists
                .get(genre)
                .map(|id| format!("{}{}", self.base_url, id)),
        }
    }
}

/// Distinct artist ids across all picks, in first-seen order
pub fn distinct_artist_ids(picks: &[Track]) -> Vec<String> {
    let mut seen = HashSet::new();
    picks
        .iter()
        .flat_map(|t| t.artists.iter())
        .filter(|a| seen.insert(a.id.as_str()))
        .map(|a| a.id.clone())
        .collect()
}

/// Union of the track's artists' genres with duplicates removed
///
/// Keeps the first occurrence of each genre, walking artists in order.
pub fn merge_genres(track: &Track, genres_by_artist: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut seen = HashSet::new();
    track
        .artists
        .iter()
        .filter_map(|a| genres_by_artist.get(&a.id))
        .flatten()
        .filter(|g| seen.insert(g.as_str()))
        .cloned()
        .collect()
}

/// Attaches genres to picked tracks and converts them to cached items
///
/// All artist ids are resolved with batched lookups (one call unless the
/// picks reference more artists than the endpoint accepts at once). No
/// request is made when there are no picks.
pub async fn enrich_candidates(
    catalog: &dyn CatalogApi,
    picks: Vec<Track>,
    links: &GenreLinks,
) -> Result<Vec<CatalogItem>> {
    if picks.is_empty() {
        return Ok(Vec::new());
    }

    let ids = distinct_artist_ids(&picks);
    let mut genres_by_artist = HashMap::with_capacity(ids.len());

    for batch in ids.chunks(ARTIST_BATCH_LIMIT) {
        for artist in catalog.artists(batch).await? {
            genres_by_artist.insert(artist.id, artist.genres);
        }
    }

    let items = picks
        .iter()
        .filter_map(|track| {
            let genres = merge_genres(track, &genres_by_artist)
                .iter()
                .map(|g| links.link(g))
                .collect();
            CatalogItem::from_track(track, genres)
        })
        .collect();

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Album, ArtistDetails, ArtistRef, ExternalUrls, Image, SearchQuery};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ArtistStub {
        genres: HashMap<String, Vec<String>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl CatalogApi for ArtistStub {
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<Track>> {
            Ok(vec![])
        }

        async fn artists(&self, ids: &[String]) -> Result<Vec<ArtistDetails>> {
            self.calls.lock().unwrap().push(ids.to_vec());
            Ok(ids
                .iter()
                .filter_map(|id| {
                    self.genres.get(id).map(|g| ArtistDetails {
                        id: id.clone(),
                        genres: g.clone(),
                    })
                })
                .collect())
        }
    }

    fn stub(entries: &[(&str, &[&str])]) -> ArtistStub {
        ArtistStub {
            genres: entries
                .iter()
                .map(|(id, g)| (id.to_string(), g.iter().map(|s| s.to_string()).collect()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn track(id: &str, artists: &[&str]) -> Track {
        Track {
            id: id.to_string(),
            name: id.to_string(),
            popularity: 10,
            preview_url: Some(format!("https://preview.example/{}", id)),
            external_urls: ExternalUrls::default(),
            album: Album {
                name: "A".to_string(),
                release_date: "1990".to_string(),
                images: vec![Image {
                    url: "https://img.example/a.jpg".to_string(),
                }],
                external_urls: ExternalUrls::default(),
            },
            artists: artists
                .iter()
                .map(|a| ArtistRef {
                    id: a.to_string(),
                    name: a.to_string(),
                    external_urls: ExternalUrls::default(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_distinct_artist_ids_keeps_order() {
        let picks = vec![track("t1", &["a", "b"]), track("t2", &["c", "a"])];
        assert_eq!(distinct_artist_ids(&picks), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_genre_link_urls() {
        let links = GenreLinks::new(
            [("jazz".to_string(), "pl1".to_string())].into(),
            "https://open.example/playlist/",
        );
        assert_eq!(
            links.link("jazz").url.as_deref(),
            Some("https://open.example/playlist/pl1")
        );
        assert!(links.link("polka").url.is_none());
    }

    #[tokio::test]
    async fn test_genres_are_deduplicated_union() {
        let catalog = stub(&[("a", &["jazz", "soul"]), ("b", &["soul", "funk", "jazz"])]);
        let picks = vec![track("t1", &["a", "b"])];

        let items = enrich_candidates(&catalog, picks, &GenreLinks::default())
            .await
            .unwrap();

        let names: Vec<_> = items[0].genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["jazz", "soul", "funk"]);
    }

    #[tokio::test]
    async fn test_single_batched_lookup() {
        let catalog = stub(&[("a", &["rock"])]);
        let picks = vec![track("t1", &["a"]), track("t2", &["b", "a"])];

        enrich_candidates(&catalog, picks, &GenreLinks::default())
            .await
            .unwrap();

        let calls = catalog.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unknown_artist_yields_empty_genres() {
        let catalog = stub(&[]);
        let items = enrich_candidates(&catalog, vec![track("t1", &["ghost"])], &GenreLinks::default())
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].genres.is_empty());
    }

    #[tokio::test]
    async fn test_no_picks_no_lookup() {
        let catalog = stub(&[]);
        let items = enrich_candidates(&catalog, vec![], &GenreLinks::default())
            .await
            .unwrap();
        assert!(items.is_empty());
        assert!(catalog.calls.lock().unwrap().is_empty());
    }
}
