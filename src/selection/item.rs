//! The record written into session caches

use crate::catalog::Track;
use serde::{Deserialize, Serialize};

/// Name and public link of a track or album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistLink {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
}

/// A genre tag and, when known, the playlist that showcases it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreLink {
    pub name: String,
    pub url: Option<String>,
}

/// One playable, cached result
///
/// Immutable once written. The first artist is the lead artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub artwork_url: String,
    /// `None` when the catalog offers no preview
    pub playback_url: Option<String>,
    pub release_date: String,
    pub popularity: u8,
    pub track: Link,
    pub album: Link,
    pub artists: Vec<ArtistLink>,
    pub genres: Vec<GenreLink>,
}

impl CatalogItem {
    /// Converts a raw track, attaching the given genres
    ///
    /// Returns `None` for tracks without artists or artwork.
    pub fn from_track(track: &Track, genres: Vec<GenreLink>) -> Option<Self> {
        if !track.is_convertible() {
            return None;
        }

        Some(Self {
            id: track.id.clone(),
            artwork_url: track.artwork_url()?.to_string(),
            playback_url: track.preview_url.clone(),
            release_date: track.album.release_date.clone(),
            popularity: track.popularity,
            track: Link {
                name: track.name.clone(),
                url: track.external_urls.spotify.clone(),
            },
            album: Link {
                name: track.album.name.clone(),
                url: track.album.external_urls.spotify.clone(),
            },
            artists: track
                .artists
                .iter()
                .map(|a| ArtistLink {
                    id: a.id.clone(),
                    name: a.name.clone(),
                    url: a.external_urls.spotify.clone(),
                })
                .collect(),
            genres,
        })
    }

    /// Id of the first listed artist
    pub fn lead_artist_id(&self) -> Option<&str> {
        self.artists.first().map(|a| a.id.as_str())
    }
}
