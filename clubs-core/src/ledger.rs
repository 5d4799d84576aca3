//! Registration ledger: the raw record of which user holds a spot in which
//! event.
//!
//! The ledger enforces (user, event) uniqueness at the storage level but
//! knows nothing about capacity. Capacity-checked admission lives in
//! [`crate::arbiter`].

use kanau::processor::Processor;

use crate::entities::registrations::{
    CountRegistrationsForEvent, DeleteRegistration, FindRegistration, InsertRegistration,
    ListRegistrationsByEvent, ListRegistrationsByUser, Participant, Registration,
    UserRegistration,
};
use crate::error::{ClubError, ConflictReason, Resource, StoreError};

/// Storage needed by [`RegistrationLedger`].
pub trait LedgerStore:
    Processor<InsertRegistration, Output = Option<Registration>, Error = StoreError>
    + Processor<DeleteRegistration, Output = bool, Error = StoreError>
    + Processor<FindRegistration, Output = Option<Registration>, Error = StoreError>
    + Processor<CountRegistrationsForEvent, Output = i64, Error = StoreError>
    + Processor<ListRegistrationsByUser, Output = Vec<UserRegistration>, Error = StoreError>
    + Processor<ListRegistrationsByEvent, Output = Vec<Participant>, Error = StoreError>
    + Clone
    + Send
    + Sync
{
}

impl<T> LedgerStore for T where
    T: Processor<InsertRegistration, Output = Option<Registration>, Error = StoreError>
        + Processor<DeleteRegistration, Output = bool, Error = StoreError>
        + Processor<FindRegistration, Output = Option<Registration>, Error = StoreError>
        + Processor<CountRegistrationsForEvent, Output = i64, Error = StoreError>
        + Processor<ListRegistrationsByUser, Output = Vec<UserRegistration>, Error = StoreError>
        + Processor<ListRegistrationsByEvent, Output = Vec<Participant>, Error = StoreError>
        + Clone
        + Send
        + Sync
{
}

#[derive(Debug, Clone)]
pub struct RegistrationLedger<S> {
    store: S,
}

impl<S: LedgerStore> RegistrationLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record a registration without any capacity check.
    ///
    /// Fails with `Conflict(Duplicate)` when the unique constraint rejects
    /// the row, whether or not the caller checked beforehand.
    pub async fn insert(&self, user_id: i64, event_id: i64) -> Result<Registration, ClubError> {
        self.store
            .process(InsertRegistration { user_id, event_id })
            .await?
            .ok_or(ClubError::Conflict(ConflictReason::Duplicate))
    }

    /// Remove the registration of `user_id` for `event_id`.
    pub async fn delete_by_user_event(&self, user_id: i64, event_id: i64) -> Result<(), ClubError> {
        if !self
            .store
            .process(DeleteRegistration { user_id, event_id })
            .await?
        {
            return Err(ClubError::NotFound(Resource::Registration));
        }
        Ok(())
    }

    pub async fn find(
        &self,
        user_id: i64,
        event_id: i64,
    ) -> Result<Option<Registration>, ClubError> {
        let registration = self
            .store
            .process(FindRegistration { user_id, event_id })
            .await?;
        Ok(registration)
    }

    pub async fn is_registered(&self, user_id: i64, event_id: i64) -> Result<bool, ClubError> {
        Ok(self.find(user_id, event_id).await?.is_some())
    }

    /// A user's registrations with event details, most recent first.
    pub async fn list_by_user(&self, user_id: i64) -> Result<Vec<UserRegistration>, ClubError> {
        let registrations = self
            .store
            .process(ListRegistrationsByUser { user_id })
            .await?;
        Ok(registrations)
    }

    /// The participants of an event, in registration order.
    pub async fn list_by_event(&self, event_id: i64) -> Result<Vec<Participant>, ClubError> {
        let participants = self
            .store
            .process(ListRegistrationsByEvent { event_id })
            .await?;
        Ok(participants)
    }

    pub async fn count_active_for_event(&self, event_id: i64) -> Result<i64, ClubError> {
        let count = self
            .store
            .process(CountRegistrationsForEvent { event_id })
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::entities::events::CreateEvent;
    use crate::entities::users::CreateUser;
    use crate::memory::MemoryProcessor;
    use time::{Duration, OffsetDateTime};

    async fn seed(store: &MemoryProcessor) -> (i64, i64) {
        let user = store
            .process(CreateUser {
                email: "ann@example.com".to_string(),
                password_hash: "x".to_string(),
                full_name: "Ann".to_string(),
                group: None,
                role: UserRole::Student,
            })
            .await
            .unwrap()
            .unwrap();
        let event = store
            .process(CreateEvent {
                title: "Chess".to_string(),
                description: None,
                date: OffsetDateTime::now_utc() + Duration::days(1),
                location: "Hall".to_string(),
                max_participants: 1,
                created_by: user.id,
            })
            .await
            .unwrap();
        (user.id, event.id)
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let store = MemoryProcessor::new();
        let ledger = RegistrationLedger::new(store.clone());
        let (user_id, event_id) = seed(&store).await;

        ledger.insert(user_id, event_id).await.unwrap();
        let err = ledger.insert(user_id, event_id).await.unwrap_err();
        assert!(matches!(err, ClubError::Conflict(ConflictReason::Duplicate)));
        assert_eq!(ledger.count_active_for_event(event_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_twice_is_not_found() {
        let store = MemoryProcessor::new();
        let ledger = RegistrationLedger::new(store.clone());
        let (user_id, event_id) = seed(&store).await;

        assert!(matches!(
            ledger.delete_by_user_event(user_id, event_id).await,
            Err(ClubError::NotFound(Resource::Registration))
        ));
        ledger.insert(user_id, event_id).await.unwrap();
        assert!(ledger.is_registered(user_id, event_id).await.unwrap());
        ledger.delete_by_user_event(user_id, event_id).await.unwrap();
        assert!(!ledger.is_registered(user_id, event_id).await.unwrap());
        assert!(matches!(
            ledger.delete_by_user_event(user_id, event_id).await,
            Err(ClubError::NotFound(Resource::Registration))
        ));
    }

    #[tokio::test]
    async fn test_listings_join_details() {
        let store = MemoryProcessor::new();
        let ledger = RegistrationLedger::new(store.clone());
        let (user_id, event_id) = seed(&store).await;
        ledger.insert(user_id, event_id).await.unwrap();

        let mine = ledger.list_by_user(user_id).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].event_title, "Chess");

        let participants = ledger.list_by_event(event_id).await.unwrap();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0].user_id, user_id);
        assert_eq!(participants[0].full_name, "Ann");
    }
}
