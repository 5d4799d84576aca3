//! Event catalog endpoints.
//!
//! # Endpoints
//!
//! - `GET    /`                   – paginated list
//! - `GET    /{id}`               – event detail
//! - `POST   /`                   – create (admin)
//! - `PUT    /{id}`               – partial update (admin)
//! - `DELETE /{id}`               – delete with its registrations (admin)
//! - `GET    /{id}/participants`  – registered users (admin)

use std::collections::HashSet;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use clubs_core::catalog::{EventFilter, EventPatch, NewEvent};
use clubs_sdk::objects::{
    CreateEventRequest, EventListResponse, EventResponse, ListEventsQuery, ParticipantResponse,
    UpdateEventRequest,
};
use time::OffsetDateTime;

use crate::api::error::ApiError;
use crate::api::extractors::{AdminUser, AuthUser};
use crate::api::{event_to_response, from_unix, participant_to_response};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_events).post(create_event))
        .route(
            "/{event_id}",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/{event_id}/participants", get(participants))
}

/// `GET /?page=&per_page=&status=&search=`
async fn list_events(
    state: State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<EventListResponse>, ApiError> {
    let now = OffsetDateTime::now_utc();
    let page = state
        .catalog()
        .list(
            EventFilter {
                status: query.status.map(Into::into),
                text: query.search,
            },
            query.page,
            query.per_page,
            now,
        )
        .await?;

    let registered: HashSet<i64> = state
        .ledger()
        .list_by_user(user.id)
        .await?
        .into_iter()
        .map(|r| r.event_id)
        .collect();

    Ok(Json(EventListResponse {
        events: page
            .events
            .iter()
            .map(|e| event_to_response(e, now, registered.contains(&e.id)))
            .collect(),
        total: page.total,
        page: page.page,
        per_page: page.per_page,
    }))
}

/// `GET /{event_id}`
async fn get_event(
    state: State<AppState>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<i64>,
) -> Result<Json<EventResponse>, ApiError> {
    let event = state.catalog().get(event_id).await?;
    let is_registered = state.ledger().is_registered(user.id, event_id).await?;
    Ok(Json(event_to_response(
        &event,
        OffsetDateTime::now_utc(),
        is_registered,
    )))
}

/// `POST /`
async fn create_event(
    state: State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state
        .catalog()
        .create(
            NewEvent {
                title: payload.title,
                description: payload.description,
                date: from_unix(payload.date)?,
                location: payload.location,
                max_participants: payload.max_participants,
            },
            admin.id,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(event_to_response(&event, OffsetDateTime::now_utc(), false)),
    ))
}

/// `PUT /{event_id}`
async fn update_event(
    state: State<AppState>,
    AdminUser(admin): AdminUser,
    Path(event_id): Path<i64>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<EventResponse>, ApiError> {
    let patch = EventPatch {
        title: payload.title,
        description: payload.description,
        date: payload.date.map(from_unix).transpose()?,
        location: payload.location,
        max_participants: payload.max_participants,
    };
    let event = state.catalog().update(event_id, patch).await?;
    let is_registered = state.ledger().is_registered(admin.id, event_id).await?;
    Ok(Json(event_to_response(
        &event,
        OffsetDateTime::now_utc(),
        is_registered,
    )))
}

/// `DELETE /{event_id}`
async fn delete_event(
    state: State<AppState>,
    _admin: AdminUser,
    Path(event_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.catalog().delete(event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /{event_id}/participants`
async fn participants(
    state: State<AppState>,
    _admin: AdminUser,
    Path(event_id): Path<i64>,
) -> Result<Json<Vec<ParticipantResponse>>, ApiError> {
    let participants = state.catalog().participants(event_id).await?;
    Ok(Json(
        participants.iter().map(participant_to_response).collect(),
    ))
}
