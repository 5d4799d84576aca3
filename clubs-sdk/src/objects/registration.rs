//! Registration response types.

use serde::{Deserialize, Serialize};

/// A registration binding the user to an event.
///
/// `event` is populated when listing the caller's own registrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub id: i64,
    pub event_id: i64,
    pub user_id: i64,
    pub registered_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<RegisteredEventInfo>,
}

/// Summary of the event a registration points to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredEventInfo {
    pub id: i64,
    pub title: String,
    pub date: i64,
    pub location: String,
}
