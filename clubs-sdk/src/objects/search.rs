//! Search and suggestion types.

use serde::{Deserialize, Serialize};

use super::event::EventStatus;

/// Query parameters for the advanced event search.
///
/// `date_from` and `date_to` are unix timestamps in seconds; both bounds are
/// inclusive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchEventsQuery {
    pub q: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_spots: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: i64,
    pub location: String,
    pub available_spots: i64,
    pub max_participants: i32,
    pub status: EventStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results_count: usize,
    pub events: Vec<SearchResult>,
}

/// An upcoming event the user has not joined yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: i64,
    pub title: String,
    pub date: i64,
    pub location: String,
    pub available_spots: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}
