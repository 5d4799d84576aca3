//! Search and suggestions.
//!
//! # Endpoints
//!
//! - `GET /events?q=&location=&date_from=&date_to=&has_spots=`
//! - `GET /suggestions`

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use clubs_core::catalog::SearchFilter;
use clubs_sdk::objects::search::{
    SearchEventsQuery, SearchResponse, SearchResult, Suggestion, SuggestionsResponse,
};
use time::OffsetDateTime;

use crate::api::error::ApiError;
use crate::api::extractors::AuthUser;
use crate::api::{from_unix, unix};
use crate::state::AppState;

const SUGGESTION_REASON: &str = "Upcoming event you haven't joined yet";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(search_events))
        .route("/suggestions", get(suggestions))
}

/// `GET /events`
async fn search_events(
    state: State<AppState>,
    _user: AuthUser,
    Query(query): Query<SearchEventsQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let filter = SearchFilter {
        text: query.q.clone(),
        location: query.location,
        date_from: query.date_from.map(from_unix).transpose()?,
        date_to: query.date_to.map(from_unix).transpose()?,
        has_spots: query.has_spots,
    };
    let now = OffsetDateTime::now_utc();
    let events: Vec<SearchResult> = state
        .catalog()
        .search(filter)
        .await?
        .iter()
        .map(|e| SearchResult {
            id: e.id,
            title: e.title.clone(),
            description: e.description.clone(),
            date: unix(e.date),
            location: e.location.clone(),
            available_spots: e.available_spots(),
            max_participants: e.max_participants,
            status: e.status(now).into(),
        })
        .collect();

    Ok(Json(SearchResponse {
        query: query.q,
        results_count: events.len(),
        events,
    }))
}

/// `GET /suggestions`
async fn suggestions(
    state: State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let events = state
        .catalog()
        .suggestions(user.id, OffsetDateTime::now_utc())
        .await?;
    Ok(Json(SuggestionsResponse {
        suggestions: events
            .iter()
            .map(|e| Suggestion {
                id: e.id,
                title: e.title.clone(),
                date: unix(e.date),
                location: e.location.clone(),
                available_spots: e.available_spots(),
                reason: SUGGESTION_REASON.to_string(),
            })
            .collect(),
    }))
}
