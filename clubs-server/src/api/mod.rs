//! HTTP API mounted under `/api`.
//!
//! Every endpoint speaks JSON except the CSV exports. Authenticated
//! endpoints take `Authorization: Bearer {token}`; see [`extractors`].

use axum::Router;
use clubs_core::entities::events::EventRecord;
use clubs_core::entities::registrations::{Participant, Registration, UserRegistration};
use clubs_core::entities::users::User;
use clubs_sdk::objects::{
    EventResponse, ParticipantResponse, RegisteredEventInfo, RegistrationResponse, UserResponse,
};
use time::OffsetDateTime;

use crate::api::error::ApiError;
use crate::state::AppState;

pub mod error;
pub mod extractors;

mod auth;
mod events;
mod export;
mod registrations;
mod search;
mod stats;
mod users;

/// Build the `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/events", events::router())
        .nest("/registrations", registrations::router())
        .nest("/search", search::router())
        .nest("/stats", stats::router())
        .nest("/export", export::router())
}

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

pub(crate) fn unix(t: OffsetDateTime) -> i64 {
    t.unix_timestamp()
}

/// Parse a unix timestamp from a request body.
pub(crate) fn from_unix(secs: i64) -> Result<OffsetDateTime, ApiError> {
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|_| ApiError::invalid(format!("timestamp {secs} is out of range")))
}

pub(crate) fn user_to_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        group: user.group.clone(),
        role: user.role.into(),
        created_at: unix(user.created_at),
    }
}

pub(crate) fn event_to_response(
    record: &EventRecord,
    now: OffsetDateTime,
    is_registered: bool,
) -> EventResponse {
    EventResponse {
        id: record.id,
        title: record.title.clone(),
        description: record.description.clone(),
        date: unix(record.date),
        location: record.location.clone(),
        max_participants: record.max_participants,
        current_participants: record.current_participants,
        available_spots: record.available_spots(),
        status: record.status(now).into(),
        created_by: record.created_by,
        created_at: unix(record.created_at),
        is_registered,
    }
}

pub(crate) fn registration_to_response(r: &Registration) -> RegistrationResponse {
    RegistrationResponse {
        id: r.id,
        event_id: r.event_id,
        user_id: r.user_id,
        registered_at: unix(r.registered_at),
        event: None,
    }
}

pub(crate) fn user_registration_to_response(r: &UserRegistration) -> RegistrationResponse {
    RegistrationResponse {
        id: r.id,
        event_id: r.event_id,
        user_id: r.user_id,
        registered_at: unix(r.registered_at),
        event: Some(RegisteredEventInfo {
            id: r.event_id,
            title: r.event_title.clone(),
            date: unix(r.event_date),
            location: r.event_location.clone(),
        }),
    }
}

pub(crate) fn participant_to_response(p: &Participant) -> ParticipantResponse {
    ParticipantResponse {
        id: p.user_id,
        full_name: p.full_name.clone(),
        email: p.email.clone(),
        group: p.group.clone(),
        registered_at: unix(p.registered_at),
    }
}
