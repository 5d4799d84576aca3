//! Event catalog: event CRUD and the derived views built on top of it.
//!
//! Nothing derived is stored. Status, participant count and free spots are
//! recomputed from the registrations table and the supplied clock on every
//! read.

use clubs_sdk::objects::clamp_page;
use kanau::processor::Processor;
use time::OffsetDateTime;

use crate::entities::EventStatus;
use crate::entities::events::{
    CreateEvent, DeleteEvent, EventRecord, EventUpdate, GetEventById, ListEvents,
    ListSuggestedEvents, SearchEvents, UpdateEvent,
};
use crate::entities::registrations::{ListRegistrationsByEvent, Participant};
use crate::error::{ClubError, ConflictReason, Resource, StoreError};

/// Capacity used when an event is created without one.
pub const DEFAULT_MAX_PARTICIPANTS: i32 = 20;

/// How many events [`EventCatalog::suggestions`] returns.
pub const SUGGESTION_LIMIT: i64 = 5;

/// Storage needed by [`EventCatalog`].
pub trait CatalogStore:
    Processor<CreateEvent, Output = EventRecord, Error = StoreError>
    + Processor<GetEventById, Output = Option<EventRecord>, Error = StoreError>
    + Processor<ListEvents, Output = Vec<EventRecord>, Error = StoreError>
    + Processor<SearchEvents, Output = Vec<EventRecord>, Error = StoreError>
    + Processor<ListSuggestedEvents, Output = Vec<EventRecord>, Error = StoreError>
    + Processor<UpdateEvent, Output = EventUpdate, Error = StoreError>
    + Processor<DeleteEvent, Output = bool, Error = StoreError>
    + Processor<ListRegistrationsByEvent, Output = Vec<Participant>, Error = StoreError>
    + Clone
    + Send
    + Sync
{
}

impl<T> CatalogStore for T where
    T: Processor<CreateEvent, Output = EventRecord, Error = StoreError>
        + Processor<GetEventById, Output = Option<EventRecord>, Error = StoreError>
        + Processor<ListEvents, Output = Vec<EventRecord>, Error = StoreError>
        + Processor<SearchEvents, Output = Vec<EventRecord>, Error = StoreError>
        + Processor<ListSuggestedEvents, Output = Vec<EventRecord>, Error = StoreError>
        + Processor<UpdateEvent, Output = EventUpdate, Error = StoreError>
        + Processor<DeleteEvent, Output = bool, Error = StoreError>
        + Processor<ListRegistrationsByEvent, Output = Vec<Participant>, Error = StoreError>
        + Clone
        + Send
        + Sync
{
}

/// Attributes of a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub date: OffsetDateTime,
    pub location: String,
    /// Defaults to [`DEFAULT_MAX_PARTICIPANTS`].
    pub max_participants: Option<i32>,
}

/// A partial event update. Only `Some` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub date: Option<OffsetDateTime>,
    pub location: Option<String>,
    pub max_participants: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    /// Case-insensitive match against title and description.
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub text: String,
    pub location: Option<String>,
    pub date_from: Option<OffsetDateTime>,
    pub date_to: Option<OffsetDateTime>,
    /// Keep only events with at least one free spot.
    pub has_spots: Option<bool>,
}

/// One page of [`EventCatalog::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<EventRecord>,
    /// Size of the filtered set, across all pages.
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

fn required(field: &str, value: String) -> Result<String, ClubError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClubError::validation(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

fn positive_capacity(max_participants: i32) -> Result<i32, ClubError> {
    if max_participants <= 0 {
        return Err(ClubError::validation(
            "max_participants must be a positive integer",
        ));
    }
    Ok(max_participants)
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[derive(Debug, Clone)]
pub struct EventCatalog<S> {
    store: S,
}

impl<S: CatalogStore> EventCatalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip_all, fields(created_by = created_by))]
    pub async fn create(&self, new: NewEvent, created_by: i64) -> Result<EventRecord, ClubError> {
        let insert = CreateEvent {
            title: required("title", new.title)?,
            description: new.description,
            date: new.date,
            location: required("location", new.location)?,
            max_participants: positive_capacity(
                new.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
            )?,
            created_by,
        };
        let event = self.store.process(insert).await?;
        tracing::info!(event_id = event.id, "Event created");
        Ok(event)
    }

    pub async fn get(&self, id: i64) -> Result<EventRecord, ClubError> {
        self.store
            .process(GetEventById { id })
            .await?
            .ok_or(ClubError::NotFound(Resource::Event))
    }

    /// Apply a partial update.
    ///
    /// Lowering `max_participants` below the number of registrations is
    /// refused; the check and the write happen under the same lock.
    #[tracing::instrument(skip_all, fields(event_id = id))]
    pub async fn update(&self, id: i64, patch: EventPatch) -> Result<EventRecord, ClubError> {
        let update = UpdateEvent {
            id,
            title: patch.title.map(|t| required("title", t)).transpose()?,
            description: patch.description,
            date: patch.date,
            location: patch.location.map(|l| required("location", l)).transpose()?,
            max_participants: patch.max_participants.map(positive_capacity).transpose()?,
        };
        match self.store.process(update).await? {
            EventUpdate::Updated(event) => Ok(event),
            EventUpdate::NotFound => Err(ClubError::NotFound(Resource::Event)),
            EventUpdate::BelowParticipants { current } => {
                tracing::debug!(current, "Refusing to lower capacity below participants");
                Err(ClubError::Conflict(ConflictReason::CapacityBelowParticipants))
            }
        }
    }

    /// Delete an event together with all of its registrations.
    #[tracing::instrument(skip_all, fields(event_id = id))]
    pub async fn delete(&self, id: i64) -> Result<(), ClubError> {
        if !self.store.process(DeleteEvent { id }).await? {
            return Err(ClubError::NotFound(Resource::Event));
        }
        tracing::info!("Event deleted");
        Ok(())
    }

    /// List events newest first.
    ///
    /// The status filter runs after status derivation, and the page is cut
    /// from the filtered set.
    pub async fn list(
        &self,
        filter: EventFilter,
        page: i64,
        per_page: i64,
        now: OffsetDateTime,
    ) -> Result<EventPage, ClubError> {
        let (page, per_page) = clamp_page(page, per_page);
        let events = self
            .store
            .process(ListEvents {
                text: non_blank(filter.text),
            })
            .await?;
        let matching: Vec<EventRecord> = events
            .into_iter()
            .filter(|e| filter.status.is_none_or(|status| e.status(now) == status))
            .collect();
        let total = matching.len() as i64;
        let offset = ((page - 1).saturating_mul(per_page)).clamp(0, total) as usize;
        let events = matching
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();
        Ok(EventPage {
            events,
            total,
            page,
            per_page,
        })
    }

    /// Search events, earliest first.
    pub async fn search(&self, filter: SearchFilter) -> Result<Vec<EventRecord>, ClubError> {
        let Some(text) = non_blank(Some(filter.text)) else {
            return Err(ClubError::validation("search query must not be blank"));
        };
        let events = self
            .store
            .process(SearchEvents {
                text,
                location: non_blank(filter.location),
                date_from: filter.date_from,
                date_to: filter.date_to,
            })
            .await?;
        Ok(match filter.has_spots {
            Some(true) => events
                .into_iter()
                .filter(|e| e.available_spots() > 0)
                .collect(),
            _ => events,
        })
    }

    /// Future events the user has not registered for yet, earliest first.
    pub async fn suggestions(
        &self,
        user_id: i64,
        now: OffsetDateTime,
    ) -> Result<Vec<EventRecord>, ClubError> {
        let events = self
            .store
            .process(ListSuggestedEvents {
                user_id,
                after: now,
                limit: SUGGESTION_LIMIT,
            })
            .await?;
        Ok(events)
    }

    /// Registered users of an event, in registration order.
    pub async fn participants(&self, event_id: i64) -> Result<Vec<Participant>, ClubError> {
        self.get(event_id).await?;
        let participants = self
            .store
            .process(ListRegistrationsByEvent { event_id })
            .await?;
        Ok(participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryProcessor;
    use time::Duration;

    fn new_event(title: &str, days_from_now: i64, max: Option<i32>) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: None,
            date: OffsetDateTime::now_utc() + Duration::days(days_from_now),
            location: "Hall A".to_string(),
            max_participants: max,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_and_validation() {
        let catalog = EventCatalog::new(MemoryProcessor::new());

        let event = catalog.create(new_event("Chess", 3, None), 1).await.unwrap();
        assert_eq!(event.max_participants, DEFAULT_MAX_PARTICIPANTS);
        assert_eq!(event.current_participants, 0);
        assert_eq!(event.available_spots(), 20);
        assert_eq!(event.status(OffsetDateTime::now_utc()), EventStatus::Upcoming);

        let err = catalog
            .create(new_event("Chess", 3, Some(0)), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ClubError::Validation(_)));

        let err = catalog
            .create(new_event("   ", 3, Some(5)), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ClubError::Validation(_)));
    }

    #[tokio::test]
    async fn test_past_event_is_finished() {
        let catalog = EventCatalog::new(MemoryProcessor::new());
        let event = catalog.create(new_event("Old", -1, Some(5)), 1).await.unwrap();
        let event = catalog.get(event.id).await.unwrap();
        assert_eq!(event.status(OffsetDateTime::now_utc()), EventStatus::Finished);
    }

    #[tokio::test]
    async fn test_get_update_delete_missing() {
        let catalog = EventCatalog::new(MemoryProcessor::new());
        assert!(matches!(
            catalog.get(404).await,
            Err(ClubError::NotFound(Resource::Event))
        ));
        assert!(matches!(
            catalog.update(404, EventPatch::default()).await,
            Err(ClubError::NotFound(Resource::Event))
        ));
        assert!(matches!(
            catalog.delete(404).await,
            Err(ClubError::NotFound(Resource::Event))
        ));
    }

    #[tokio::test]
    async fn test_update_applies_only_given_fields() {
        let catalog = EventCatalog::new(MemoryProcessor::new());
        let event = catalog.create(new_event("Chess", 3, Some(5)), 1).await.unwrap();

        let updated = catalog
            .update(
                event.id,
                EventPatch {
                    location: Some("Library".to_string()),
                    max_participants: Some(8),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Chess");
        assert_eq!(updated.location, "Library");
        assert_eq!(updated.max_participants, 8);

        let err = catalog
            .update(
                event.id,
                EventPatch {
                    max_participants: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ClubError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_sets_and_clears_description() {
        let catalog = EventCatalog::new(MemoryProcessor::new());
        let event = catalog.create(new_event("Chess", 3, Some(5)), 1).await.unwrap();

        let with_text = |description| EventPatch {
            description: Some(description),
            ..Default::default()
        };
        let updated = catalog
            .update(event.id, with_text(Some("Bring a board".to_string())))
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("Bring a board"));

        // Absent leaves it alone.
        let updated = catalog
            .update(
                event.id,
                EventPatch {
                    location: Some("Library".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("Bring a board"));

        let updated = catalog.update(event.id, with_text(None)).await.unwrap();
        assert_eq!(updated.description, None);
        assert_eq!(catalog.get(event.id).await.unwrap().description, None);
    }

    #[tokio::test]
    async fn test_list_filters_orders_and_pages() {
        let catalog = EventCatalog::new(MemoryProcessor::new());
        let now = OffsetDateTime::now_utc();
        for (i, days) in [1, 2, 3, 4, -2].into_iter().enumerate() {
            catalog
                .create(new_event(&format!("Board games #{i}"), days, Some(5)), 1)
                .await
                .unwrap();
        }
        catalog
            .create(
                NewEvent {
                    description: Some("Weekly CHESS practice".to_string()),
                    ..new_event("Practice", 5, Some(5))
                },
                1,
            )
            .await
            .unwrap();

        let page = catalog
            .list(EventFilter::default(), 1, 4, now)
            .await
            .unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.events.len(), 4);
        assert!(page.events.windows(2).all(|w| w[0].date >= w[1].date));

        let page = catalog
            .list(EventFilter::default(), 2, 4, now)
            .await
            .unwrap();
        assert_eq!(page.events.len(), 2);

        let page = catalog
            .list(
                EventFilter {
                    status: Some(EventStatus::Finished),
                    text: None,
                },
                1,
                20,
                now,
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.events[0].title, "Board games #4");

        let page = catalog
            .list(
                EventFilter {
                    status: None,
                    text: Some("chess".to_string()),
                },
                1,
                20,
                now,
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.events[0].title, "Practice");
    }

    #[tokio::test]
    async fn test_search_requires_text_and_orders_ascending() {
        let catalog = EventCatalog::new(MemoryProcessor::new());
        let now = OffsetDateTime::now_utc();
        let late = catalog.create(new_event("Robotics", 9, Some(5)), 1).await.unwrap();
        let early = catalog.create(new_event("Robotics intro", 2, Some(5)), 1).await.unwrap();
        catalog.create(new_event("Drama", 3, Some(5)), 1).await.unwrap();

        let found = catalog
            .search(
                SearchFilter {
                    text: "robot".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let ids: Vec<i64> = found.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);

        let found = catalog
            .search(
                SearchFilter {
                    text: "robot".to_string(),
                    date_to: Some(now + Duration::days(5)),
                    location: Some("hall".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        let err = catalog
            .search(SearchFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ClubError::Validation(_)));
    }
}
