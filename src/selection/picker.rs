//! Artist-diverse candidate selection

use crate::catalog::Track;
use crate::session::PopularityRange;
use crate::{DiscoveryError, Result};
use rand::Rng;
use std::collections::HashMap;

/// Picks up to `max_picks` tracks, at most one per lead artist
///
/// Tracks outside `popularity` (when given) and tracks that cannot become a
/// cached item are dropped first. The remaining tracks are grouped by lead
/// artist id; each round draws a not-yet-used artist uniformly, then one of
/// that artist's tracks uniformly.
///
/// # Returns
///
/// * `Ok(Vec<Track>)` - The picks (empty if filtering removed everything)
/// * `Err(DiscoveryError::EmptyResult)` - The search returned nothing
pub fn select_candidates<R: Rng + ?Sized>(
    raw: Vec<Track>,
    max_picks: usize,
    popularity: Option<&PopularityRange>,
    rng: &mut R,
) -> Result<Vec<Track>> {
    if raw.is_empty() {
        return Err(DiscoveryError::EmptyResult);
    }

    // Artists in first-seen order, so a seeded RNG gives repeatable picks
    let mut artists: Vec<String> = Vec::new();
    let mut by_artist: HashMap<String, Vec<Track>> = HashMap::new();

    let pool = raw
        .into_iter()
        .filter(Track::is_convertible)
        .filter(|t| popularity.map_or(true, |range| range.contains(t.popularity)));

    for track in pool {
        let Some(lead) = track.lead_artist_id().map(str::to_string) else {
            continue;
        };
        by_artist
            .entry(lead.clone())
            .or_insert_with(|| {
                artists.push(lead);
                Vec::new()
            })
            .push(track);
    }

    let mut picks = Vec::with_capacity(max_picks.min(artists.len()));
    while picks.len() < max_picks && !artists.is_empty() {
        let artist = artists.swap_remove(rng.random_range(0..artists.len()));
        if let Some(mut tracks) = by_artist.remove(&artist) {
            let index = rng.random_range(0..tracks.len());
            picks.push(tracks.swap_remove(index));
        }
    }

    Ok(picks)
}
