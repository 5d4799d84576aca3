//! Event request and response types.

use serde::{Deserialize, Serialize};

use super::{default_page, default_per_page};

/// Derived event status.
///
/// This is the API/DTO version. The status is never stored; the server
/// derives it from the event date and the current participant count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Full,
    Finished,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Upcoming => write!(f, "upcoming"),
            EventStatus::Full => write!(f, "full"),
            EventStatus::Finished => write!(f, "finished"),
        }
    }
}

/// Request body for creating an event (admin only).
///
/// `date` is a unix timestamp in seconds. `max_participants` falls back to
/// the server default (20) when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: i64,
    pub location: String,
    #[serde(default)]
    pub max_participants: Option<i32>,
}

/// Request body for a partial event update (admin only).
///
/// Only the fields that are present are applied. An explicit
/// `"description": null` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i32>,
}

/// Tell an absent field (`None`) apart from an explicit `null` (`Some(None)`).
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A single event together with its derived capacity view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: i64,
    pub location: String,
    pub max_participants: i32,
    pub current_participants: i64,
    pub available_spots: i64,
    pub status: EventStatus,
    pub created_by: i64,
    pub created_at: i64,
    /// Whether the requesting user holds a registration for this event.
    pub is_registered: bool,
}

/// One page of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventListResponse {
    pub events: Vec<EventResponse>,
    /// Number of events matching the filter, across all pages.
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Query parameters for listing events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListEventsQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for ListEventsQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
            status: None,
            search: None,
        }
    }
}

/// A registered participant of an event (admin only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantResponse {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub group: Option<String>,
    pub registered_at: i64,
}
