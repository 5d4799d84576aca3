//! CSV exports and the periodic report. All endpoints require an admin.
//!
//! # Endpoints
//!
//! - `GET /events/csv`
//! - `GET /events/{id}/participants/csv`
//! - `GET /users/csv`
//! - `GET /report`

use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    routing::get,
};
use clubs_core::entities::events::ListEvents;
use clubs_core::export;
use clubs_core::stats::LoadReport;
use clubs_sdk::objects::stats::SystemReport;
use kanau::processor::Processor;
use time::OffsetDateTime;

use crate::api::error::ApiError;
use crate::api::extractors::AdminUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events/csv", get(events_csv))
        .route(
            "/events/{event_id}/participants/csv",
            get(participants_csv),
        )
        .route("/users/csv", get(users_csv))
        .route("/report", get(report))
}

fn csv_attachment(filename: String, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}

fn stamp(now: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day()
    )
}

/// `GET /events/csv`
async fn events_csv(
    state: State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let now = OffsetDateTime::now_utc();
    let events = state.processor().process(ListEvents { text: None }).await?;
    let body = export::events_csv(&events, now)?;
    Ok(csv_attachment(format!("events_{}.csv", stamp(now)), body))
}

/// `GET /events/{event_id}/participants/csv`
async fn participants_csv(
    state: State<AppState>,
    _admin: AdminUser,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let participants = state.catalog().participants(event_id).await?;
    let body = export::participants_csv(&participants)?;
    Ok(csv_attachment(
        format!("event_{event_id}_participants.csv"),
        body,
    ))
}

/// `GET /users/csv`
async fn users_csv(
    state: State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    let users = state.directory().list_all().await?;
    let body = export::users_csv(&users)?;
    Ok(csv_attachment(
        format!("users_{}.csv", stamp(OffsetDateTime::now_utc())),
        body,
    ))
}

/// `GET /report`
async fn report(
    state: State<AppState>,
    _admin: AdminUser,
) -> Result<Json<SystemReport>, ApiError> {
    let report = state
        .processor()
        .process(LoadReport {
            now: OffsetDateTime::now_utc(),
        })
        .await?;
    Ok(Json(report))
}
