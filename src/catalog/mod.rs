//! Upstream catalog access
//!
//! The crawler talks to the catalog through the [`CatalogApi`] trait so the
//! tick pipeline can run against the real Web API or a stub.

mod client;
mod query;
mod types;

pub use client::{build_http_client, CatalogApi, HttpCatalog};
pub use query::SearchQuery;
pub use types::{
    Album, ArtistDetails, ArtistRef, ArtistsResponse, ExternalUrls, Image, SearchResponse, Track,
    TrackPage,
};

/// Maximum number of ids the artists endpoint accepts per call
pub const ARTIST_BATCH_LIMIT: usize = 50;
