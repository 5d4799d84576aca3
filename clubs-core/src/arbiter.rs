//! Capacity arbiter: decides whether a registration attempt gets a spot.
//!
//! The cheap checks (event exists, user exists, event not finished, not
//! already registered) run first without locks. The capacity decision itself
//! is a single [`AdmitRegistration`] query: the store recounts and inserts
//! under a lock on the event, so two attempts racing for the last spot can
//! never both succeed.

use kanau::processor::Processor;
use time::OffsetDateTime;

use crate::catalog::{CatalogStore, EventCatalog};
use crate::directory::{DirectoryStore, UserDirectory};
use crate::entities::registrations::{Admission, AdmitRegistration, Registration};
use crate::error::{ClubError, ConflictReason, Resource, StoreError};
use crate::ledger::{LedgerStore, RegistrationLedger};

/// Attempts made when the store reports contention.
pub const MAX_ADMISSION_ATTEMPTS: u32 = 3;

/// Storage needed by [`CapacityArbiter`].
pub trait ArbiterStore:
    CatalogStore
    + LedgerStore
    + DirectoryStore
    + Processor<AdmitRegistration, Output = Admission, Error = StoreError>
{
}

impl<T> ArbiterStore for T where
    T: CatalogStore
        + LedgerStore
        + DirectoryStore
        + Processor<AdmitRegistration, Output = Admission, Error = StoreError>
{
}

#[derive(Debug, Clone)]
pub struct CapacityArbiter<S> {
    store: S,
    catalog: EventCatalog<S>,
    ledger: RegistrationLedger<S>,
    directory: UserDirectory<S>,
}

impl<S: ArbiterStore> CapacityArbiter<S> {
    pub fn new(store: S) -> Self {
        Self {
            catalog: EventCatalog::new(store.clone()),
            ledger: RegistrationLedger::new(store.clone()),
            directory: UserDirectory::new(store.clone()),
            store,
        }
    }

    /// Try to register `user_id` for `event_id`.
    ///
    /// Failure order: missing event, missing user, finished event, existing
    /// registration, no spot left. Contention is retried up to
    /// [`MAX_ADMISSION_ATTEMPTS`] times and then reported as `Full`.
    #[tracing::instrument(skip_all, fields(user_id = user_id, event_id = event_id))]
    pub async fn attempt_register(
        &self,
        user_id: i64,
        event_id: i64,
        now: OffsetDateTime,
    ) -> Result<Registration, ClubError> {
        let event = self.catalog.get(event_id).await?;
        self.directory.get_by_id(user_id).await?;

        if event.date < now {
            return Err(ClubError::Finished);
        }
        if self.ledger.is_registered(user_id, event_id).await? {
            return Err(ClubError::Conflict(ConflictReason::AlreadyRegistered));
        }

        for attempt in 1..=MAX_ADMISSION_ATTEMPTS {
            let admission = self
                .store
                .process(AdmitRegistration { user_id, event_id })
                .await;
            match admission {
                Ok(Admission::Admitted(registration)) => {
                    tracing::info!(registration_id = registration.id, "Registration admitted");
                    return Ok(registration);
                }
                Ok(Admission::Full) => {
                    tracing::debug!("Registration rejected, event is full");
                    return Err(ClubError::Conflict(ConflictReason::Full));
                }
                Ok(Admission::Duplicate) => {
                    return Err(ClubError::Conflict(ConflictReason::AlreadyRegistered));
                }
                Ok(Admission::EventGone) => return Err(ClubError::NotFound(Resource::Event)),
                Err(StoreError::Contention) => {
                    tracing::warn!(attempt, "Storage contention during admission");
                }
                // The event row is locked by now, so only the user can be missing.
                Err(StoreError::DanglingReference) => {
                    return Err(ClubError::NotFound(Resource::User));
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!("Admission attempts exhausted");
        Err(ClubError::Conflict(ConflictReason::Full))
    }

    /// Give up a spot. The freed capacity is visible on the next read.
    #[tracing::instrument(skip_all, fields(user_id = user_id, event_id = event_id))]
    pub async fn cancel(&self, user_id: i64, event_id: i64) -> Result<(), ClubError> {
        self.ledger.delete_by_user_event(user_id, event_id).await?;
        tracing::info!("Registration cancelled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NewEvent;
    use crate::directory::NewUser;
    use crate::entities::events::*;
    use crate::entities::registrations::*;
    use crate::entities::users::*;
    use crate::entities::{EventStatus, UserRole};
    use crate::error::ErrorKind;
    use crate::memory::MemoryProcessor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use time::Duration;

    struct Fixture<S> {
        arbiter: CapacityArbiter<S>,
        catalog: EventCatalog<S>,
        ledger: RegistrationLedger<S>,
        directory: UserDirectory<S>,
    }

    impl<S: ArbiterStore> Fixture<S> {
        fn new(store: S) -> Self {
            Self {
                arbiter: CapacityArbiter::new(store.clone()),
                catalog: EventCatalog::new(store.clone()),
                ledger: RegistrationLedger::new(store.clone()),
                directory: UserDirectory::new(store),
            }
        }

        async fn user(&self, n: usize) -> i64 {
            self.directory
                .create(
                    NewUser {
                        email: format!("student{n}@example.com"),
                        password: "pw".to_string(),
                        full_name: format!("Student {n}"),
                        group: None,
                    },
                    UserRole::Student,
                )
                .await
                .unwrap()
                .id
        }

        async fn event(&self, max: i32, days_from_now: i64) -> i64 {
            self.catalog
                .create(
                    NewEvent {
                        title: "Chess night".to_string(),
                        description: None,
                        date: OffsetDateTime::now_utc() + Duration::days(days_from_now),
                        location: "Room 101".to_string(),
                        max_participants: Some(max),
                    },
                    1,
                )
                .await
                .unwrap()
                .id
        }
    }

    fn now() -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    #[tokio::test]
    async fn test_fills_up_and_rejects_next() {
        let fx = Fixture::new(MemoryProcessor::new());
        let event_id = fx.event(5, 7).await;
        for n in 0..5 {
            let user_id = fx.user(n).await;
            fx.arbiter
                .attempt_register(user_id, event_id, now())
                .await
                .unwrap();
        }

        let event = fx.catalog.get(event_id).await.unwrap();
        assert_eq!(event.current_participants, 5);
        assert_eq!(event.available_spots(), 0);
        assert_eq!(event.status(now()), EventStatus::Full);

        let sixth = fx.user(5).await;
        assert!(matches!(
            fx.arbiter.attempt_register(sixth, event_id, now()).await,
            Err(ClubError::Conflict(ConflictReason::Full))
        ));
        assert_eq!(fx.ledger.count_active_for_event(event_id).await.unwrap(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_last_spot_goes_to_exactly_one() {
        let fx = Arc::new(Fixture::new(MemoryProcessor::new()));
        let event_id = fx.event(1, 7).await;
        let first = fx.user(0).await;
        let second = fx.user(1).await;

        let a = {
            let fx = fx.clone();
            tokio::spawn(async move { fx.arbiter.attempt_register(first, event_id, now()).await })
        };
        let b = {
            let fx = fx.clone();
            tokio::spawn(async move { fx.arbiter.attempt_register(second, event_id, now()).await })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(ClubError::Conflict(ConflictReason::Full))))
                .count(),
            1
        );
        assert_eq!(fx.ledger.count_active_for_event(event_id).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_crowd_never_overbooks() {
        let fx = Arc::new(Fixture::new(MemoryProcessor::new()));
        let event_id = fx.event(10, 7).await;
        let mut users = Vec::new();
        for n in 0..40 {
            users.push(fx.user(n).await);
        }

        let handles: Vec<_> = users
            .into_iter()
            .map(|user_id| {
                let fx = fx.clone();
                tokio::spawn(async move { fx.arbiter.attempt_register(user_id, event_id, now()).await })
            })
            .collect();
        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(ClubError::Conflict(ConflictReason::Full)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(admitted, 10);
        assert_eq!(fx.ledger.count_active_for_event(event_id).await.unwrap(), 10);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_user_racing_gets_one_registration() {
        let fx = Arc::new(Fixture::new(MemoryProcessor::new()));
        let event_id = fx.event(10, 7).await;
        let user_id = fx.user(0).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let fx = fx.clone();
                tokio::spawn(async move { fx.arbiter.attempt_register(user_id, event_id, now()).await })
            })
            .collect();
        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(ClubError::Conflict(ConflictReason::AlreadyRegistered)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(fx.ledger.list_by_user(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejection_order() {
        let fx = Fixture::new(MemoryProcessor::new());
        let user_id = fx.user(0).await;
        let past = fx.event(5, -1).await;
        let open = fx.event(5, 7).await;

        assert!(matches!(
            fx.arbiter.attempt_register(user_id, 9_999, now()).await,
            Err(ClubError::NotFound(Resource::Event))
        ));
        assert!(matches!(
            fx.arbiter.attempt_register(9_999, open, now()).await,
            Err(ClubError::NotFound(Resource::User))
        ));
        assert!(matches!(
            fx.arbiter.attempt_register(user_id, past, now()).await,
            Err(ClubError::Finished)
        ));

        fx.arbiter.attempt_register(user_id, open, now()).await.unwrap();
        assert!(matches!(
            fx.arbiter.attempt_register(user_id, open, now()).await,
            Err(ClubError::Conflict(ConflictReason::AlreadyRegistered))
        ));
    }

    #[tokio::test]
    async fn test_cancel_semantics() {
        let fx = Fixture::new(MemoryProcessor::new());
        let user_id = fx.user(0).await;
        let event_id = fx.event(1, 7).await;

        assert!(matches!(
            fx.arbiter.cancel(user_id, event_id).await,
            Err(ClubError::NotFound(Resource::Registration))
        ));

        fx.arbiter.attempt_register(user_id, event_id, now()).await.unwrap();
        fx.arbiter.cancel(user_id, event_id).await.unwrap();
        assert!(matches!(
            fx.arbiter.cancel(user_id, event_id).await,
            Err(ClubError::NotFound(Resource::Registration))
        ));

        // The freed spot can be taken again.
        fx.arbiter.attempt_register(user_id, event_id, now()).await.unwrap();
        let event = fx.catalog.get(event_id).await.unwrap();
        assert_eq!(event.current_participants, 1);
    }

    #[tokio::test]
    async fn test_event_deletion_cascades() {
        let fx = Fixture::new(MemoryProcessor::new());
        let event_id = fx.event(5, 7).await;
        let kept_id = fx.event(5, 8).await;
        let mut users = Vec::new();
        for n in 0..3 {
            let user_id = fx.user(n).await;
            fx.arbiter.attempt_register(user_id, event_id, now()).await.unwrap();
            users.push(user_id);
        }
        fx.arbiter.attempt_register(users[0], kept_id, now()).await.unwrap();

        fx.catalog.delete(event_id).await.unwrap();

        assert_eq!(fx.ledger.count_active_for_event(event_id).await.unwrap(), 0);
        for user_id in &users {
            let mine = fx.ledger.list_by_user(*user_id).await.unwrap();
            assert!(mine.iter().all(|r| r.event_id != event_id));
        }
        assert_eq!(fx.ledger.list_by_user(users[0]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_capacity_cannot_drop_below_participants() {
        let fx = Fixture::new(MemoryProcessor::new());
        let event_id = fx.event(5, 7).await;
        for n in 0..3 {
            let user_id = fx.user(n).await;
            fx.arbiter.attempt_register(user_id, event_id, now()).await.unwrap();
        }

        let lowered = |max| crate::catalog::EventPatch {
            max_participants: Some(max),
            ..Default::default()
        };
        assert!(matches!(
            fx.catalog.update(event_id, lowered(2)).await,
            Err(ClubError::Conflict(ConflictReason::CapacityBelowParticipants))
        ));
        let event = fx.catalog.update(event_id, lowered(3)).await.unwrap();
        assert_eq!(event.status(now()), EventStatus::Full);
    }

    /// Delegates to a [`MemoryProcessor`] but reports contention on the first
    /// `contended` admissions.
    #[derive(Clone)]
    struct ContendedStore {
        inner: MemoryProcessor,
        contended: Arc<AtomicU32>,
    }

    macro_rules! delegate {
        ($store:ty: $($query:ty),* $(,)?) => {
            $(
                impl Processor<$query> for $store {
                    type Output = <MemoryProcessor as Processor<$query>>::Output;
                    type Error = StoreError;
                    async fn process(&self, query: $query) -> Result<Self::Output, StoreError> {
                        self.inner.process(query).await
                    }
                }
            )*
        };
    }

    delegate!(
        ContendedStore:
        CreateEvent,
        GetEventById,
        ListEvents,
        SearchEvents,
        ListSuggestedEvents,
        UpdateEvent,
        DeleteEvent,
        FindRegistration,
        CountRegistrationsForEvent,
        InsertRegistration,
        DeleteRegistration,
        ListRegistrationsByUser,
        ListRegistrationsByEvent,
        CreateUser,
        GetUserById,
        GetUserByEmail,
        UpdateUserProfile,
        ListUsers,
    );

    impl Processor<AdmitRegistration> for ContendedStore {
        type Output = Admission;
        type Error = StoreError;
        async fn process(&self, admit: AdmitRegistration) -> Result<Admission, StoreError> {
            let remaining = self.contended.load(Ordering::SeqCst);
            if remaining > 0 {
                self.contended.store(remaining - 1, Ordering::SeqCst);
                return Err(StoreError::Contention);
            }
            self.inner.process(admit).await
        }
    }

    /// Delegates to a [`MemoryProcessor`] but resolves every user id, as if
    /// the account was deleted after the identity check.
    #[derive(Clone)]
    struct VanishedUserStore {
        inner: MemoryProcessor,
    }

    delegate!(
        VanishedUserStore:
        CreateEvent,
        GetEventById,
        ListEvents,
        SearchEvents,
        ListSuggestedEvents,
        UpdateEvent,
        DeleteEvent,
        FindRegistration,
        CountRegistrationsForEvent,
        InsertRegistration,
        AdmitRegistration,
        DeleteRegistration,
        ListRegistrationsByUser,
        ListRegistrationsByEvent,
        CreateUser,
        GetUserByEmail,
        UpdateUserProfile,
        ListUsers,
    );

    impl Processor<GetUserById> for VanishedUserStore {
        type Output = Option<User>;
        type Error = StoreError;
        async fn process(&self, query: GetUserById) -> Result<Option<User>, StoreError> {
            Ok(Some(User {
                id: query.id,
                email: format!("gone{}@example.com", query.id),
                password_hash: String::new(),
                full_name: "Gone".to_string(),
                group: None,
                role: UserRole::Student,
                created_at: OffsetDateTime::now_utc(),
            }))
        }
    }

    #[tokio::test]
    async fn test_user_deleted_before_admission_is_not_found() {
        let fx = Fixture::new(VanishedUserStore {
            inner: MemoryProcessor::new(),
        });
        let event_id = fx.event(5, 7).await;

        let result = fx.arbiter.attempt_register(999, event_id, now()).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(matches!(err, ClubError::NotFound(Resource::User)));
        assert_eq!(fx.ledger.count_active_for_event(event_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_contention_is_retried_then_reported_full() {
        let contended = Arc::new(AtomicU32::new(MAX_ADMISSION_ATTEMPTS - 1));
        let fx = Fixture::new(ContendedStore {
            inner: MemoryProcessor::new(),
            contended: contended.clone(),
        });
        let event_id = fx.event(5, 7).await;
        let first = fx.user(0).await;
        let second = fx.user(1).await;

        fx.arbiter.attempt_register(first, event_id, now()).await.unwrap();

        contended.store(MAX_ADMISSION_ATTEMPTS, Ordering::SeqCst);
        assert!(matches!(
            fx.arbiter.attempt_register(second, event_id, now()).await,
            Err(ClubError::Conflict(ConflictReason::Full))
        ));
        assert_eq!(fx.ledger.count_active_for_event(event_id).await.unwrap(), 1);
    }
}
