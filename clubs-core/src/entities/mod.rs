pub mod events;
pub mod registrations;
pub mod users;

use clubs_sdk::objects::{EventStatus as SdkEventStatus, UserRole as SdkUserRole};
use time::OffsetDateTime;

/// Account role for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see `clubs_sdk::objects::UserRole`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "user_role")]
pub enum UserRole {
    Student,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Admin => "admin",
        }
    }
}

impl From<UserRole> for SdkUserRole {
    fn from(value: UserRole) -> Self {
        match value {
            UserRole::Student => SdkUserRole::Student,
            UserRole::Admin => SdkUserRole::Admin,
        }
    }
}

impl From<SdkUserRole> for UserRole {
    fn from(value: SdkUserRole) -> Self {
        match value {
            SdkUserRole::Student => UserRole::Student,
            SdkUserRole::Admin => UserRole::Admin,
        }
    }
}

/// Derived event status. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Upcoming,
    Full,
    Finished,
}

impl EventStatus {
    /// Derive the status of an event at `now`.
    ///
    /// Finished wins over full: an event in the past is finished regardless of
    /// how many people signed up.
    pub fn derive(
        date: OffsetDateTime,
        max_participants: i32,
        current_participants: i64,
        now: OffsetDateTime,
    ) -> Self {
        if date < now {
            EventStatus::Finished
        } else if current_participants >= i64::from(max_participants) {
            EventStatus::Full
        } else {
            EventStatus::Upcoming
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "upcoming",
            EventStatus::Full => "full",
            EventStatus::Finished => "finished",
        }
    }
}

impl From<EventStatus> for SdkEventStatus {
    fn from(value: EventStatus) -> Self {
        match value {
            EventStatus::Upcoming => SdkEventStatus::Upcoming,
            EventStatus::Full => SdkEventStatus::Full,
            EventStatus::Finished => SdkEventStatus::Finished,
        }
    }
}

impl From<SdkEventStatus> for EventStatus {
    fn from(value: SdkEventStatus) -> Self {
        match value {
            SdkEventStatus::Upcoming => EventStatus::Upcoming,
            SdkEventStatus::Full => EventStatus::Full,
            SdkEventStatus::Finished => EventStatus::Finished,
        }
    }
}

/// `max(0, max_participants - current_participants)`.
pub fn available_spots(max_participants: i32, current_participants: i64) -> i64 {
    (i64::from(max_participants) - current_participants).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    #[test]
    fn test_status_derivation() {
        let now = OffsetDateTime::now_utc();
        let tomorrow = now + Duration::days(1);
        let yesterday = now - Duration::days(1);

        assert_eq!(EventStatus::derive(tomorrow, 5, 0, now), EventStatus::Upcoming);
        assert_eq!(EventStatus::derive(tomorrow, 5, 4, now), EventStatus::Upcoming);
        assert_eq!(EventStatus::derive(tomorrow, 5, 5, now), EventStatus::Full);
        assert_eq!(EventStatus::derive(yesterday, 5, 0, now), EventStatus::Finished);
        assert_eq!(EventStatus::derive(yesterday, 5, 5, now), EventStatus::Finished);
    }

    #[test]
    fn test_available_spots() {
        assert_eq!(available_spots(5, 0), 5);
        assert_eq!(available_spots(5, 5), 0);
        assert_eq!(available_spots(5, 7), 0);
    }
}
