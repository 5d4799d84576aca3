use crate::entities::{EventStatus, available_spots};
use crate::error::StoreError;
use crate::framework::{DatabaseAccessor, DatabaseProcessor};
use kanau::processor::Processor;
use time::OffsetDateTime;

/// An event row together with its live registration count.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub date: OffsetDateTime,
    pub location: String,
    pub max_participants: i32,
    pub created_by: i64,
    pub created_at: OffsetDateTime,
    pub current_participants: i64,
}

impl EventRecord {
    pub fn status(&self, now: OffsetDateTime) -> EventStatus {
        EventStatus::derive(
            self.date,
            self.max_participants,
            self.current_participants,
            now,
        )
    }

    pub fn available_spots(&self) -> i64 {
        available_spots(self.max_participants, self.current_participants)
    }
}

macro_rules! select_events {
    ($tail:literal) => {
        concat!(
            "SELECT e.id, e.title, e.description, e.date, e.location, e.max_participants, \
             e.created_by, e.created_at, \
             (SELECT COUNT(*) FROM registrations r WHERE r.event_id = e.id) AS current_participants \
             FROM events e ",
            $tail
        )
    };
}

#[derive(Debug, Clone)]
/// Insert a new event. The returned record has no registrations.
pub struct CreateEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: OffsetDateTime,
    pub location: String,
    pub max_participants: i32,
    pub created_by: i64,
}

impl Processor<CreateEvent> for DatabaseProcessor {
    type Output = EventRecord;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:CreateEvent")]
    async fn process(&self, insert: CreateEvent) -> Result<EventRecord, StoreError> {
        let event = sqlx::query_as::<_, EventRecord>(
            r#"
            INSERT INTO events (title, description, date, location, max_participants, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, date, location, max_participants,
                created_by, created_at, 0::BIGINT AS current_participants
            "#,
        )
        .bind(insert.title)
        .bind(insert.description)
        .bind(insert.date)
        .bind(insert.location)
        .bind(insert.max_participants)
        .bind(insert.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::classify)?;
        Ok(event)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetEventById {
    pub id: i64,
}

impl Processor<GetEventById> for DatabaseProcessor {
    type Output = Option<EventRecord>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:GetEventById")]
    async fn process(&self, query: GetEventById) -> Result<Option<EventRecord>, StoreError> {
        let event = sqlx::query_as::<_, EventRecord>(select_events!("WHERE e.id = $1"))
            .bind(query.id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }
}

#[derive(Debug, Clone, Default)]
/// All events, newest date first.
///
/// `text` keeps only events whose title or description contains it,
/// ignoring case.
pub struct ListEvents {
    pub text: Option<String>,
}

impl Processor<ListEvents> for DatabaseProcessor {
    type Output = Vec<EventRecord>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ListEvents")]
    async fn process(&self, query: ListEvents) -> Result<Vec<EventRecord>, StoreError> {
        let events = sqlx::query_as::<_, EventRecord>(select_events!(
            "WHERE $1::TEXT IS NULL \
             OR strpos(lower(e.title), lower($1)) > 0 \
             OR strpos(lower(coalesce(e.description, '')), lower($1)) > 0 \
             ORDER BY e.date DESC, e.id DESC"
        ))
        .bind(query.text)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}

#[derive(Debug, Clone)]
/// Full-text-ish event search, earliest date first.
///
/// `location` is a case-insensitive substring; the date bounds are inclusive.
pub struct SearchEvents {
    pub text: String,
    pub location: Option<String>,
    pub date_from: Option<OffsetDateTime>,
    pub date_to: Option<OffsetDateTime>,
}

impl Processor<SearchEvents> for DatabaseProcessor {
    type Output = Vec<EventRecord>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:SearchEvents")]
    async fn process(&self, query: SearchEvents) -> Result<Vec<EventRecord>, StoreError> {
        let events = sqlx::query_as::<_, EventRecord>(select_events!(
            "WHERE (strpos(lower(e.title), lower($1)) > 0 \
                OR strpos(lower(coalesce(e.description, '')), lower($1)) > 0) \
             AND ($2::TEXT IS NULL OR strpos(lower(e.location), lower($2)) > 0) \
             AND ($3::TIMESTAMPTZ IS NULL OR e.date >= $3) \
             AND ($4::TIMESTAMPTZ IS NULL OR e.date <= $4) \
             ORDER BY e.date ASC, e.id ASC"
        ))
        .bind(query.text)
        .bind(query.location)
        .bind(query.date_from)
        .bind(query.date_to)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}

#[derive(Debug, Clone, Copy)]
/// Events after `after` that `user_id` has not registered for, earliest first.
pub struct ListSuggestedEvents {
    pub user_id: i64,
    pub after: OffsetDateTime,
    pub limit: i64,
}

impl Processor<ListSuggestedEvents> for DatabaseProcessor {
    type Output = Vec<EventRecord>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ListSuggestedEvents")]
    async fn process(&self, query: ListSuggestedEvents) -> Result<Vec<EventRecord>, StoreError> {
        let events = sqlx::query_as::<_, EventRecord>(select_events!(
            "WHERE e.date > $2 \
             AND NOT EXISTS ( \
                SELECT 1 FROM registrations r WHERE r.event_id = e.id AND r.user_id = $1 \
             ) \
             ORDER BY e.date ASC, e.id ASC \
             LIMIT $3"
        ))
        .bind(query.user_id)
        .bind(query.after)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }
}

#[derive(Debug, Clone, Default)]
/// Patch an event. `None` fields are left untouched.
pub struct UpdateEvent {
    pub id: i64,
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub date: Option<OffsetDateTime>,
    pub location: Option<String>,
    pub max_participants: Option<i32>,
}

/// Result of an [`UpdateEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventUpdate {
    Updated(EventRecord),
    NotFound,
    /// The requested capacity is lower than the registrations already held.
    BelowParticipants { current: i64 },
}

impl Processor<UpdateEvent> for DatabaseProcessor {
    type Output = EventUpdate;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:UpdateEvent")]
    async fn process(&self, update: UpdateEvent) -> Result<EventUpdate, StoreError> {
        let mut tx = self.begin().await.map_err(StoreError::classify)?;

        // Same row lock as admission, so the count cannot move under us.
        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM events WHERE id = $1 FOR UPDATE")
            .bind(update.id)
            .fetch_optional(tx.acquire())
            .await
            .map_err(StoreError::classify)?;
        if locked.is_none() {
            return Ok(EventUpdate::NotFound);
        }

        if let Some(max) = update.max_participants {
            let current = count_registrations(&mut tx, update.id).await?;
            if current > i64::from(max) {
                return Ok(EventUpdate::BelowParticipants { current });
            }
        }

        sqlx::query(
            r#"
            UPDATE events SET
                title = COALESCE($2, title),
                description = CASE WHEN $7 THEN $3 ELSE description END,
                date = COALESCE($4, date),
                location = COALESCE($5, location),
                max_participants = COALESCE($6, max_participants)
            WHERE id = $1
            "#,
        )
        .bind(update.id)
        .bind(update.title)
        .bind(update.description.clone().flatten())
        .bind(update.date)
        .bind(update.location)
        .bind(update.max_participants)
        .bind(update.description.is_some())
        .execute(tx.acquire())
        .await
        .map_err(StoreError::classify)?;

        let event = sqlx::query_as::<_, EventRecord>(select_events!("WHERE e.id = $1"))
            .bind(update.id)
            .fetch_one(tx.acquire())
            .await
            .map_err(StoreError::classify)?;
        tx.commit().await.map_err(StoreError::classify)?;
        Ok(EventUpdate::Updated(event))
    }
}

#[derive(Debug, Clone, Copy)]
/// Delete an event; its registrations go with it (`ON DELETE CASCADE`).
///
/// Outputs whether the event existed.
pub struct DeleteEvent {
    pub id: i64,
}

impl Processor<DeleteEvent> for DatabaseProcessor {
    type Output = bool;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteEvent")]
    async fn process(&self, delete: DeleteEvent) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(delete.id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::classify)?;
        Ok(result.rows_affected() > 0)
    }
}

/// Count the registrations of one event.
pub(crate) async fn count_registrations(
    db: &mut impl DatabaseAccessor,
    event_id: i64,
) -> Result<i64, StoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations WHERE event_id = $1")
        .bind(event_id)
        .fetch_one(db.acquire())
        .await
        .map_err(StoreError::classify)?;
    Ok(count)
}
