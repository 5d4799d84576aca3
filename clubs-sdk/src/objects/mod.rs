//! Request and response types shared by the server and its clients.

pub mod error;
pub mod event;
pub mod registration;
pub mod search;
pub mod stats;
pub mod user;

pub use error::ApiErrorBody;
pub use event::{
    CreateEventRequest, EventListResponse, EventResponse, EventStatus, ListEventsQuery,
    ParticipantResponse, UpdateEventRequest,
};
pub use registration::{RegisteredEventInfo, RegistrationResponse};
pub use user::{
    AdminRegisterRequest, ListUsersQuery, LoginRequest, RegisterRequest, TokenResponse,
    UpdateProfileRequest, UserResponse, UserRole,
};

const DEFAULT_PER_PAGE: i64 = 20;
const MAX_PER_PAGE: i64 = 100;
const DEFAULT_USER_LIMIT: i64 = 100;
const MAX_USER_LIMIT: i64 = 200;
const MAX_OFFSET: i64 = 100_000;

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    DEFAULT_PER_PAGE
}

fn default_user_limit() -> i64 {
    DEFAULT_USER_LIMIT
}

/// Clamp a `page`/`per_page` pair to `page >= 1` and `1 <= per_page <= 100`.
pub fn clamp_page(page: i64, per_page: i64) -> (i64, i64) {
    (page.max(1), per_page.clamp(1, MAX_PER_PAGE))
}

/// Clamp a `skip`/`limit` pair to safe maximums.
pub fn clamp_skip_limit(skip: i64, limit: i64) -> (i64, i64) {
    (skip.clamp(0, MAX_OFFSET), limit.clamp(1, MAX_USER_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_page() {
        assert_eq!(clamp_page(0, 0), (1, 1));
        assert_eq!(clamp_page(3, 20), (3, 20));
        assert_eq!(clamp_page(-5, 1_000), (1, 100));
    }

    #[test]
    fn test_clamp_skip_limit() {
        assert_eq!(clamp_skip_limit(-1, 0), (0, 1));
        assert_eq!(clamp_skip_limit(10, 500), (10, 200));
    }

    #[test]
    fn test_list_events_query_defaults() {
        let query: ListEventsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.per_page, 20);
        assert!(query.status.is_none());

        let query: ListEventsQuery =
            serde_json::from_str(r#"{"page":2,"status":"full","search":"chess"}"#).unwrap();
        assert_eq!(query.page, 2);
        assert_eq!(query.status, Some(EventStatus::Full));
        assert_eq!(query.search.as_deref(), Some("chess"));
    }
}
