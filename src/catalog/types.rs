//! Wire types for the upstream catalog API
//!
//! Only the fields the crawler reads are modeled; everything else in the
//! upstream payloads is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// Response of the search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    pub tracks: TrackPage,
}

/// One page of track results
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackPage {
    /// The upstream occasionally returns `null` entries
    #[serde(default)]
    pub items: Vec<Option<Track>>,
}

impl TrackPage {
    pub fn into_tracks(self) -> Vec<Track> {
        self.items.into_iter().flatten().collect()
    }
}

/// Public links of a catalog object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// Artist as embedded in a track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

/// A raw search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub popularity: u8,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub external_urls: ExternalUrls,
    pub album: Album,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

impl Track {
    /// Id of the first listed artist, the diversity key during selection
    pub fn lead_artist_id(&self) -> Option<&str> {
        self.artists.first().map(|a| a.id.as_str())
    }

    /// Artwork shown for the track (the album's first image)
    pub fn artwork_url(&self) -> Option<&str> {
        self.album.images.first().map(|i| i.url.as_str())
    }

    /// Checks whether the track has everything a cached item needs
    pub fn is_convertible(&self) -> bool {
        self.lead_artist_id().is_some() && self.artwork_url().is_some()
    }
}

/// Response of the artists batch endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistsResponse {
    /// Unknown ids come back as `null`
    #[serde(default)]
    pub artists: Vec<Option<ArtistDetails>>,
}

/// Artist with genre tags
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtistDetails {
    pub id: String,
    #[serde(default)]
    pub genres: Vec<String>,
}
