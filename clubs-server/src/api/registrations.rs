//! Registration endpoints.
//!
//! # Endpoints
//!
//! - `POST   /{event_id}` – take a spot
//! - `DELETE /{event_id}` – give the spot back
//! - `GET    /my`         – the caller's registrations with event info

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use clubs_sdk::objects::RegistrationResponse;
use time::OffsetDateTime;

use crate::api::error::ApiError;
use crate::api::extractors::AuthUser;
use crate::api::{registration_to_response, user_registration_to_response};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/my", get(my_registrations))
        .route("/{event_id}", post(register).delete(cancel))
}

/// `POST /{event_id}`
async fn register(
    state: State<AppState>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = state
        .arbiter()
        .attempt_register(user.id, event_id, OffsetDateTime::now_utc())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(registration_to_response(&registration)),
    ))
}

/// `DELETE /{event_id}`
async fn cancel(
    state: State<AppState>,
    AuthUser(user): AuthUser,
    Path(event_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.arbiter().cancel(user.id, event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /my`
async fn my_registrations(
    state: State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<RegistrationResponse>>, ApiError> {
    let registrations = state.ledger().list_by_user(user.id).await?;
    Ok(Json(
        registrations
            .iter()
            .map(user_registration_to_response)
            .collect(),
    ))
}
