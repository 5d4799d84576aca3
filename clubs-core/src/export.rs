//! CSV exports of events, participants and users.

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::entities::events::EventRecord;
use crate::entities::registrations::Participant;
use crate::entities::users::User;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("timestamp formatting error: {0}")]
    Format(#[from] time::error::Format),
    #[error("csv writer error: {0}")]
    Flush(String),
}

fn rfc3339(value: OffsetDateTime) -> Result<String, ExportError> {
    Ok(value.format(&Rfc3339)?)
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Flush(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Flush(e.to_string()))
}

/// All events, one row each, with status derived at `now`.
pub fn events_csv(events: &[EventRecord], now: OffsetDateTime) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "ID",
        "Title",
        "Description",
        "Date",
        "Location",
        "Max Participants",
        "Current Participants",
        "Status",
        "Created At",
    ])?;
    for event in events {
        writer.write_record([
            event.id.to_string(),
            event.title.clone(),
            event.description.clone().unwrap_or_default(),
            rfc3339(event.date)?,
            event.location.clone(),
            event.max_participants.to_string(),
            event.current_participants.to_string(),
            event.status(now).as_str().to_string(),
            rfc3339(event.created_at)?,
        ])?;
    }
    finish(writer)
}

pub fn participants_csv(participants: &[Participant]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["ID", "Full Name", "Email", "Group", "Registered At"])?;
    for participant in participants {
        writer.write_record([
            participant.user_id.to_string(),
            participant.full_name.clone(),
            participant.email.clone(),
            participant.group.clone().unwrap_or_default(),
            rfc3339(participant.registered_at)?,
        ])?;
    }
    finish(writer)
}

pub fn users_csv(users: &[User]) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["ID", "Full Name", "Email", "Group", "Role", "Created At"])?;
    for user in users {
        writer.write_record([
            user.id.to_string(),
            user.full_name.clone(),
            user.email.clone(),
            user.group.clone().unwrap_or_default(),
            user.role.as_str().to_string(),
            rfc3339(user.created_at)?,
        ])?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use time::macros::datetime;

    #[test]
    fn test_events_csv_quotes_and_status() {
        let event = EventRecord {
            id: 1,
            title: "Chess, checkers".to_string(),
            description: None,
            date: datetime!(2025-01-01 18:00 UTC),
            location: "Hall".to_string(),
            max_participants: 2,
            created_by: 9,
            created_at: datetime!(2024-12-01 09:00 UTC),
            current_participants: 2,
        };
        let csv = events_csv(&[event], datetime!(2024-12-15 00:00 UTC)).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("ID,Title,Description,Date,Location,Max Participants,Current Participants,Status,Created At")
        );
        assert_eq!(
            lines.next(),
            Some("1,\"Chess, checkers\",,2025-01-01T18:00:00Z,Hall,2,2,full,2024-12-01T09:00:00Z")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_participants_and_users_csv() {
        let participants = [Participant {
            user_id: 3,
            full_name: "Ann Lee".to_string(),
            email: "ann@example.com".to_string(),
            group: None,
            registered_at: datetime!(2025-02-03 04:05:06 UTC),
        }];
        let csv = participants_csv(&participants).unwrap();
        assert!(csv.ends_with("3,Ann Lee,ann@example.com,,2025-02-03T04:05:06Z\n"));

        let users = [User {
            id: 3,
            email: "ann@example.com".to_string(),
            password_hash: "hash".to_string(),
            full_name: "Ann Lee".to_string(),
            group: Some("CS-21".to_string()),
            role: UserRole::Admin,
            created_at: datetime!(2025-01-01 00:00 UTC),
        }];
        let csv = users_csv(&users).unwrap();
        assert!(csv.starts_with("ID,Full Name,Email,Group,Role,Created At\n"));
        assert!(csv.contains("3,Ann Lee,ann@example.com,CS-21,admin,2025-01-01T00:00:00Z"));
        assert!(!csv.contains("hash"));
    }
}
