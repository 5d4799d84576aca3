//! In-memory storage with the same semantics as the PostgreSQL processors.
//!
//! Every query takes one lock over all tables for its whole read-modify-write,
//! which gives admissions the same serialization the event row lock gives
//! them in PostgreSQL.

use std::collections::BTreeMap;
use std::sync::Arc;

use kanau::processor::Processor;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::entities::events::{
    CreateEvent, DeleteEvent, EventRecord, EventUpdate, GetEventById, ListEvents,
    ListSuggestedEvents, SearchEvents, UpdateEvent,
};
use crate::entities::registrations::{
    Admission, AdmitRegistration, CountRegistrationsForEvent, DeleteRegistration,
    FindRegistration, InsertRegistration, ListRegistrationsByEvent, ListRegistrationsByUser,
    Participant, Registration, UserRegistration,
};
use crate::entities::users::{
    CreateUser, GetUserByEmail, GetUserById, ListUsers, UpdateUserProfile, User,
};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct EventRow {
    id: i64,
    title: String,
    description: Option<String>,
    date: OffsetDateTime,
    location: String,
    max_participants: i32,
    created_by: i64,
    created_at: OffsetDateTime,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    events: BTreeMap<i64, EventRow>,
    registrations: BTreeMap<i64, Registration>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn count_for_event(&self, event_id: i64) -> i64 {
        self.registrations
            .values()
            .filter(|r| r.event_id == event_id)
            .count() as i64
    }

    fn record(&self, row: &EventRow) -> EventRecord {
        EventRecord {
            id: row.id,
            title: row.title.clone(),
            description: row.description.clone(),
            date: row.date,
            location: row.location.clone(),
            max_participants: row.max_participants,
            created_by: row.created_by,
            created_at: row.created_at,
            current_participants: self.count_for_event(row.id),
        }
    }

    fn find(&self, user_id: i64, event_id: i64) -> Option<&Registration> {
        self.registrations
            .values()
            .find(|r| r.user_id == user_id && r.event_id == event_id)
    }

    fn insert(&mut self, user_id: i64, event_id: i64) -> Result<Option<Registration>, StoreError> {
        if !self.users.contains_key(&user_id) || !self.events.contains_key(&event_id) {
            return Err(StoreError::DanglingReference);
        }
        if self.find(user_id, event_id).is_some() {
            return Ok(None);
        }
        let registration = Registration {
            id: self.next_id(),
            user_id,
            event_id,
            registered_at: OffsetDateTime::now_utc(),
        };
        self.registrations
            .insert(registration.id, registration.clone());
        Ok(Some(registration))
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_text(row: &EventRow, text: &str) -> bool {
    contains_ignore_case(&row.title, text)
        || row
            .description
            .as_deref()
            .is_some_and(|d| contains_ignore_case(d, text))
}

/// A process-local store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryProcessor {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryProcessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Processor<CreateEvent> for MemoryProcessor {
    type Output = EventRecord;
    type Error = StoreError;
    async fn process(&self, insert: CreateEvent) -> Result<EventRecord, StoreError> {
        let mut tables = self.tables.lock().await;
        let row = EventRow {
            id: tables.next_id(),
            title: insert.title,
            description: insert.description,
            date: insert.date,
            location: insert.location,
            max_participants: insert.max_participants,
            created_by: insert.created_by,
            created_at: OffsetDateTime::now_utc(),
        };
        let record = tables.record(&row);
        tables.events.insert(row.id, row);
        Ok(record)
    }
}

impl Processor<GetEventById> for MemoryProcessor {
    type Output = Option<EventRecord>;
    type Error = StoreError;
    async fn process(&self, query: GetEventById) -> Result<Option<EventRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.events.get(&query.id).map(|row| tables.record(row)))
    }
}

impl Processor<ListEvents> for MemoryProcessor {
    type Output = Vec<EventRecord>;
    type Error = StoreError;
    async fn process(&self, query: ListEvents) -> Result<Vec<EventRecord>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&EventRow> = tables
            .events
            .values()
            .filter(|row| query.text.as_deref().is_none_or(|text| matches_text(row, text)))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(rows.into_iter().map(|row| tables.record(row)).collect())
    }
}

impl Processor<SearchEvents> for MemoryProcessor {
    type Output = Vec<EventRecord>;
    type Error = StoreError;
    async fn process(&self, query: SearchEvents) -> Result<Vec<EventRecord>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&EventRow> = tables
            .events
            .values()
            .filter(|row| matches_text(row, &query.text))
            .filter(|row| {
                query
                    .location
                    .as_deref()
                    .is_none_or(|location| contains_ignore_case(&row.location, location))
            })
            .filter(|row| query.date_from.is_none_or(|from| row.date >= from))
            .filter(|row| query.date_to.is_none_or(|to| row.date <= to))
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(rows.into_iter().map(|row| tables.record(row)).collect())
    }
}

impl Processor<ListSuggestedEvents> for MemoryProcessor {
    type Output = Vec<EventRecord>;
    type Error = StoreError;
    async fn process(&self, query: ListSuggestedEvents) -> Result<Vec<EventRecord>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<&EventRow> = tables
            .events
            .values()
            .filter(|row| row.date > query.after)
            .filter(|row| tables.find(query.user_id, row.id).is_none())
            .collect();
        rows.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(rows
            .into_iter()
            .take(query.limit.max(0) as usize)
            .map(|row| tables.record(row))
            .collect())
    }
}

impl Processor<UpdateEvent> for MemoryProcessor {
    type Output = EventUpdate;
    type Error = StoreError;
    async fn process(&self, update: UpdateEvent) -> Result<EventUpdate, StoreError> {
        let mut tables = self.tables.lock().await;
        let current = tables.count_for_event(update.id);
        let Some(row) = tables.events.get_mut(&update.id) else {
            return Ok(EventUpdate::NotFound);
        };
        if let Some(max) = update.max_participants
            && current > i64::from(max)
        {
            return Ok(EventUpdate::BelowParticipants { current });
        }
        if let Some(title) = update.title {
            row.title = title;
        }
        if let Some(description) = update.description {
            row.description = description;
        }
        if let Some(date) = update.date {
            row.date = date;
        }
        if let Some(location) = update.location {
            row.location = location;
        }
        if let Some(max) = update.max_participants {
            row.max_participants = max;
        }
        let row = row.clone();
        Ok(EventUpdate::Updated(tables.record(&row)))
    }
}

impl Processor<DeleteEvent> for MemoryProcessor {
    type Output = bool;
    type Error = StoreError;
    async fn process(&self, delete: DeleteEvent) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.events.remove(&delete.id).is_none() {
            return Ok(false);
        }
        tables.registrations.retain(|_, r| r.event_id != delete.id);
        Ok(true)
    }
}

impl Processor<FindRegistration> for MemoryProcessor {
    type Output = Option<Registration>;
    type Error = StoreError;
    async fn process(&self, query: FindRegistration) -> Result<Option<Registration>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.find(query.user_id, query.event_id).cloned())
    }
}

impl Processor<CountRegistrationsForEvent> for MemoryProcessor {
    type Output = i64;
    type Error = StoreError;
    async fn process(&self, query: CountRegistrationsForEvent) -> Result<i64, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.count_for_event(query.event_id))
    }
}

impl Processor<InsertRegistration> for MemoryProcessor {
    type Output = Option<Registration>;
    type Error = StoreError;
    async fn process(&self, insert: InsertRegistration) -> Result<Option<Registration>, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.insert(insert.user_id, insert.event_id)
    }
}

impl Processor<AdmitRegistration> for MemoryProcessor {
    type Output = Admission;
    type Error = StoreError;
    async fn process(&self, admit: AdmitRegistration) -> Result<Admission, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(max_participants) = tables
            .events
            .get(&admit.event_id)
            .map(|row| row.max_participants)
        else {
            return Ok(Admission::EventGone);
        };
        if tables.count_for_event(admit.event_id) >= i64::from(max_participants) {
            return Ok(Admission::Full);
        }
        Ok(match tables.insert(admit.user_id, admit.event_id)? {
            Some(registration) => Admission::Admitted(registration),
            None => Admission::Duplicate,
        })
    }
}

impl Processor<DeleteRegistration> for MemoryProcessor {
    type Output = bool;
    type Error = StoreError;
    async fn process(&self, delete: DeleteRegistration) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(id) = tables
            .find(delete.user_id, delete.event_id)
            .map(|r| r.id)
        else {
            return Ok(false);
        };
        tables.registrations.remove(&id);
        Ok(true)
    }
}

impl Processor<ListRegistrationsByUser> for MemoryProcessor {
    type Output = Vec<UserRegistration>;
    type Error = StoreError;
    async fn process(
        &self,
        query: ListRegistrationsByUser,
    ) -> Result<Vec<UserRegistration>, StoreError> {
        let tables = self.tables.lock().await;
        let mut registrations: Vec<UserRegistration> = tables
            .registrations
            .values()
            .filter(|r| r.user_id == query.user_id)
            .filter_map(|r| {
                let event = tables.events.get(&r.event_id)?;
                Some(UserRegistration {
                    id: r.id,
                    user_id: r.user_id,
                    event_id: r.event_id,
                    registered_at: r.registered_at,
                    event_title: event.title.clone(),
                    event_date: event.date,
                    event_location: event.location.clone(),
                })
            })
            .collect();
        registrations.sort_by(|a, b| {
            b.registered_at
                .cmp(&a.registered_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(registrations)
    }
}

impl Processor<ListRegistrationsByEvent> for MemoryProcessor {
    type Output = Vec<Participant>;
    type Error = StoreError;
    async fn process(&self, query: ListRegistrationsByEvent) -> Result<Vec<Participant>, StoreError> {
        let tables = self.tables.lock().await;
        // Registration ids grow with insertion order, so map order is registration order.
        Ok(tables
            .registrations
            .values()
            .filter(|r| r.event_id == query.event_id)
            .filter_map(|r| {
                let user = tables.users.get(&r.user_id)?;
                Some(Participant {
                    user_id: user.id,
                    full_name: user.full_name.clone(),
                    email: user.email.clone(),
                    group: user.group.clone(),
                    registered_at: r.registered_at,
                })
            })
            .collect())
    }
}

impl Processor<CreateUser> for MemoryProcessor {
    type Output = Option<User>;
    type Error = StoreError;
    async fn process(&self, insert: CreateUser) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.email == insert.email) {
            return Ok(None);
        }
        let user = User {
            id: tables.next_id(),
            email: insert.email,
            password_hash: insert.password_hash,
            full_name: insert.full_name,
            group: insert.group,
            role: insert.role,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(Some(user))
    }
}

impl Processor<GetUserById> for MemoryProcessor {
    type Output = Option<User>;
    type Error = StoreError;
    async fn process(&self, query: GetUserById) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&query.id).cloned())
    }
}

impl Processor<GetUserByEmail> for MemoryProcessor {
    type Output = Option<User>;
    type Error = StoreError;
    async fn process(&self, query: GetUserByEmail) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email == query.email)
            .cloned())
    }
}

impl Processor<UpdateUserProfile> for MemoryProcessor {
    type Output = Option<User>;
    type Error = StoreError;
    async fn process(&self, update: UpdateUserProfile) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(user) = tables.users.get_mut(&update.id) else {
            return Ok(None);
        };
        if let Some(full_name) = update.full_name {
            user.full_name = full_name;
        }
        if let Some(group) = update.group {
            user.group = Some(group);
        }
        Ok(Some(user.clone()))
    }
}

impl Processor<ListUsers> for MemoryProcessor {
    type Output = Vec<User>;
    type Error = StoreError;
    async fn process(&self, query: ListUsers) -> Result<Vec<User>, StoreError> {
        let tables = self.tables.lock().await;
        let users = tables.users.values().skip(query.offset.max(0) as usize);
        Ok(match query.limit {
            Some(limit) => users.take(limit.max(0) as usize).cloned().collect(),
            None => users.cloned().collect(),
        })
    }
}
