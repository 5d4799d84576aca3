use crate::entities::events::count_registrations;
use crate::error::StoreError;
use crate::framework::{DatabaseAccessor, DatabaseProcessor};
use kanau::processor::Processor;
use time::OffsetDateTime;

/// A user's claim on one spot of an event.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Registration {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub registered_at: OffsetDateTime,
}

/// A registration joined with the event it is for.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRegistration {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub registered_at: OffsetDateTime,
    pub event_title: String,
    pub event_date: OffsetDateTime,
    pub event_location: String,
}

/// A registration joined with the identity of the registered user.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Participant {
    pub user_id: i64,
    pub full_name: String,
    pub email: String,
    #[sqlx(rename = "group_name")]
    pub group: Option<String>,
    pub registered_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy)]
pub struct FindRegistration {
    pub user_id: i64,
    pub event_id: i64,
}

impl Processor<FindRegistration> for DatabaseProcessor {
    type Output = Option<Registration>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:FindRegistration")]
    async fn process(&self, query: FindRegistration) -> Result<Option<Registration>, StoreError> {
        let registration = sqlx::query_as::<_, Registration>(
            r#"
            SELECT id, user_id, event_id, registered_at
            FROM registrations
            WHERE user_id = $1 AND event_id = $2
            "#,
        )
        .bind(query.user_id)
        .bind(query.event_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(registration)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CountRegistrationsForEvent {
    pub event_id: i64,
}

impl Processor<CountRegistrationsForEvent> for DatabaseProcessor {
    type Output = i64;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:CountRegistrationsForEvent")]
    async fn process(&self, query: CountRegistrationsForEvent) -> Result<i64, StoreError> {
        let mut db = self.clone();
        count_registrations(&mut db, query.event_id).await
    }
}

#[derive(Debug, Clone, Copy)]
/// Insert a registration with no capacity check.
///
/// Outputs `None` when the (user, event) pair is already registered.
pub struct InsertRegistration {
    pub user_id: i64,
    pub event_id: i64,
}

impl Processor<InsertRegistration> for DatabaseProcessor {
    type Output = Option<Registration>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertRegistration")]
    async fn process(&self, insert: InsertRegistration) -> Result<Option<Registration>, StoreError> {
        let mut db = self.clone();
        insert_registration(&mut db, insert).await
    }
}

async fn insert_registration(
    db: &mut impl DatabaseAccessor,
    insert: InsertRegistration,
) -> Result<Option<Registration>, StoreError> {
    let result = sqlx::query_as::<_, Registration>(
        r#"
        INSERT INTO registrations (user_id, event_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, event_id) DO NOTHING
        RETURNING id, user_id, event_id, registered_at
        "#,
    )
    .bind(insert.user_id)
    .bind(insert.event_id)
    .fetch_optional(db.acquire())
    .await;
    match result {
        Ok(registration) => Ok(registration),
        Err(e) if crate::framework::is_unique_violation(&e) => Ok(None),
        Err(e) => Err(StoreError::classify(e)),
    }
}

#[derive(Debug, Clone, Copy)]
/// Capacity-checked insert.
///
/// Locks the event row, recounts its registrations and inserts only while a
/// spot is free. Concurrent admissions for the same event are serialized on
/// the row lock.
pub struct AdmitRegistration {
    pub user_id: i64,
    pub event_id: i64,
}

/// Outcome of an [`AdmitRegistration`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admitted(Registration),
    Full,
    Duplicate,
    /// The event was deleted before the lock was taken.
    EventGone,
}

impl Processor<AdmitRegistration> for DatabaseProcessor {
    type Output = Admission;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:AdmitRegistration")]
    async fn process(&self, admit: AdmitRegistration) -> Result<Admission, StoreError> {
        let mut tx = self.begin().await.map_err(StoreError::classify)?;

        let max_participants: Option<i32> =
            sqlx::query_scalar("SELECT max_participants FROM events WHERE id = $1 FOR UPDATE")
                .bind(admit.event_id)
                .fetch_optional(tx.acquire())
                .await
                .map_err(StoreError::classify)?;
        let Some(max_participants) = max_participants else {
            return Ok(Admission::EventGone);
        };

        let current = count_registrations(&mut tx, admit.event_id).await?;
        if current >= i64::from(max_participants) {
            return Ok(Admission::Full);
        }

        let inserted = insert_registration(
            &mut tx,
            InsertRegistration {
                user_id: admit.user_id,
                event_id: admit.event_id,
            },
        )
        .await?;
        let Some(registration) = inserted else {
            return Ok(Admission::Duplicate);
        };

        tx.commit().await.map_err(StoreError::classify)?;
        Ok(Admission::Admitted(registration))
    }
}

#[derive(Debug, Clone, Copy)]
/// Outputs whether a registration was removed.
pub struct DeleteRegistration {
    pub user_id: i64,
    pub event_id: i64,
}

impl Processor<DeleteRegistration> for DatabaseProcessor {
    type Output = bool;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteRegistration")]
    async fn process(&self, delete: DeleteRegistration) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM registrations WHERE user_id = $1 AND event_id = $2")
            .bind(delete.user_id)
            .bind(delete.event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone, Copy)]
/// A user's registrations, most recent first.
pub struct ListRegistrationsByUser {
    pub user_id: i64,
}

impl Processor<ListRegistrationsByUser> for DatabaseProcessor {
    type Output = Vec<UserRegistration>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ListRegistrationsByUser")]
    async fn process(
        &self,
        query: ListRegistrationsByUser,
    ) -> Result<Vec<UserRegistration>, StoreError> {
        let registrations = sqlx::query_as::<_, UserRegistration>(
            r#"
            SELECT r.id, r.user_id, r.event_id, r.registered_at,
                e.title AS event_title, e.date AS event_date, e.location AS event_location
            FROM registrations r
            JOIN events e ON e.id = r.event_id
            WHERE r.user_id = $1
            ORDER BY r.registered_at DESC, r.id DESC
            "#,
        )
        .bind(query.user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(registrations)
    }
}

#[derive(Debug, Clone, Copy)]
/// Participants of an event in registration order.
pub struct ListRegistrationsByEvent {
    pub event_id: i64,
}

impl Processor<ListRegistrationsByEvent> for DatabaseProcessor {
    type Output = Vec<Participant>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:ListRegistrationsByEvent")]
    async fn process(&self, query: ListRegistrationsByEvent) -> Result<Vec<Participant>, StoreError> {
        let participants = sqlx::query_as::<_, Participant>(
            r#"
            SELECT u.id AS user_id, u.full_name, u.email, u.group_name, r.registered_at
            FROM registrations r
            JOIN users u ON u.id = r.user_id
            WHERE r.event_id = $1
            ORDER BY r.registered_at ASC, r.id ASC
            "#,
        )
        .bind(query.event_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(participants)
    }
}
