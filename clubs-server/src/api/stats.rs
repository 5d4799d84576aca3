//! Aggregated statistics.
//!
//! # Endpoints
//!
//! - `GET /dashboard`         – system-wide counters (admin)
//! - `GET /my-stats`          – the caller's registration summary
//! - `GET /events/{id}/stats` – fill rate, groups and timeline (admin)
//! - `GET /leaderboard`       – most active students

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use clubs_core::stats::{self, LEADERBOARD_LIMIT, LoadDashboard, LoadLeaderboard};
use clubs_sdk::objects::stats::{DashboardStats, EventStats, Leaderboard, MyStats};
use kanau::processor::Processor;
use time::OffsetDateTime;

use crate::api::error::ApiError;
use crate::api::extractors::{AdminUser, AuthUser};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/my-stats", get(my_stats))
        .route("/events/{event_id}/stats", get(event_stats))
        .route("/leaderboard", get(leaderboard))
}

/// `GET /dashboard`
async fn dashboard(
    state: State<AppState>,
    _admin: AdminUser,
) -> Result<Json<DashboardStats>, ApiError> {
    let stats = state
        .processor()
        .process(LoadDashboard {
            now: OffsetDateTime::now_utc(),
        })
        .await?;
    Ok(Json(stats))
}

/// `GET /my-stats`
async fn my_stats(
    state: State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<MyStats>, ApiError> {
    let registrations = state.ledger().list_by_user(user.id).await?;
    Ok(Json(stats::my_stats(
        &registrations,
        OffsetDateTime::now_utc(),
    )))
}

/// `GET /events/{event_id}/stats`
async fn event_stats(
    state: State<AppState>,
    _admin: AdminUser,
    Path(event_id): Path<i64>,
) -> Result<Json<EventStats>, ApiError> {
    let catalog = state.catalog();
    let event = catalog.get(event_id).await?;
    let participants = catalog.participants(event_id).await?;
    Ok(Json(stats::event_stats(&event, &participants)))
}

/// `GET /leaderboard`
async fn leaderboard(
    state: State<AppState>,
    _user: AuthUser,
) -> Result<Json<Leaderboard>, ApiError> {
    let leaderboard = state
        .processor()
        .process(LoadLeaderboard {
            limit: LEADERBOARD_LIMIT,
        })
        .await?;
    Ok(Json(Leaderboard { leaderboard }))
}
