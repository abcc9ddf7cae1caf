use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Inclusive range of release years
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: i32,
    pub end: i32,
}

/// Inclusive range of popularity scores (0-100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularityRange {
    pub start: u8,
    pub end: u8,
}

impl PopularityRange {
    /// Checks whether a popularity score falls inside the range
    pub fn contains(&self, popularity: u8) -> bool {
        popularity >= self.start && popularity <= self.end
    }
}

/// The filters a requester attached to a session
///
/// An empty `genres` set means "no genre constraint". A session without a
/// filter set and a session with an empty one are searched the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity_range: Option<PopularityRange>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub genres: BTreeSet<String>,
}

impl FilterSet {
    /// Returns true when no filter constrains the search
    pub fn is_empty(&self) -> bool {
        self.date_range.is_none() && self.popularity_range.is_none() && self.genres.is_empty()
    }

    pub fn with_date_range(mut self, start: i32, end: i32) -> Self {
        self.date_range = Some(DateRange { start, end });
        self
    }

    pub fn with_popularity_range(mut self, start: u8, end: u8) -> Self {
        self.popularity_range = Some(PopularityRange { start, end });
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genres.insert(genre.into());
        self
    }
}
