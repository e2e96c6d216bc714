//! Typed domain events and the publish/subscribe bus that carries them.
//!
//! Producers publish a [`DomainEvent`] after their own state change commits;
//! consumers subscribe with an [`EventSelector`] and react through an
//! [`EventHandler`]. Delivery is at-least-once: a consumer may observe the
//! same event more than once (e.g. after a crash/restart of the backing
//! transport) and must handle it idempotently. No ordering is guaranteed
//! between events for unrelated entities.

mod bus;

pub use bus::{EventBus, EventHandler, InProcessBus, Subscription};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog entity types that emit lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Book,
    Library,
    Series,
    Publisher,
    Person,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Book => "book",
            Self::Library => "library",
            Self::Series => "series",
            Self::Publisher => "publisher",
            Self::Person => "person",
        };
        f.write_str(name)
    }
}

/// Lifecycle phase an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

/// An immutable domain event.
///
/// Events carry the affected entity's kind and id plus identity metadata,
/// never the entity itself. Consumers that need entity state must look it up,
/// which keeps redelivered events from carrying stale payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A primary entity was created.
    EntityCreated {
        event_id: Uuid,
        occurred_at: DateTime<Utc>,
        entity: EntityKind,
        id: String,
    },
    /// A primary entity was updated.
    EntityUpdated {
        event_id: Uuid,
        occurred_at: DateTime<Utc>,
        entity: EntityKind,
        id: String,
    },
    /// A primary entity was deleted.
    EntityDeleted {
        event_id: Uuid,
        occurred_at: DateTime<Utc>,
        entity: EntityKind,
        id: String,
    },
}

impl DomainEvent {
    /// Create an `EntityCreated` event.
    pub fn created(entity: EntityKind, id: impl Into<String>) -> Self {
        Self::EntityCreated {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            entity,
            id: id.into(),
        }
    }

    /// Create an `EntityUpdated` event.
    pub fn updated(entity: EntityKind, id: impl Into<String>) -> Self {
        Self::EntityUpdated {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            entity,
            id: id.into(),
        }
    }

    /// Create an `EntityDeleted` event.
    pub fn deleted(entity: EntityKind, id: impl Into<String>) -> Self {
        Self::EntityDeleted {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            entity,
            id: id.into(),
        }
    }

    /// The lifecycle phase this event reports.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::EntityCreated { .. } => EventKind::Created,
            Self::EntityUpdated { .. } => EventKind::Updated,
            Self::EntityDeleted { .. } => EventKind::Deleted,
        }
    }

    /// The kind of the affected entity.
    pub fn entity(&self) -> EntityKind {
        match self {
            Self::EntityCreated { entity, .. }
            | Self::EntityUpdated { entity, .. }
            | Self::EntityDeleted { entity, .. } => *entity,
        }
    }

    /// The id of the affected entity.
    pub fn entity_id(&self) -> &str {
        match self {
            Self::EntityCreated { id, .. }
            | Self::EntityUpdated { id, .. }
            | Self::EntityDeleted { id, .. } => id,
        }
    }

    /// Unique id of this event occurrence.
    pub fn event_id(&self) -> Uuid {
        match self {
            Self::EntityCreated { event_id, .. }
            | Self::EntityUpdated { event_id, .. }
            | Self::EntityDeleted { event_id, .. } => *event_id,
        }
    }
}

/// Filter describing which events a subscriber wants. `None` fields match
/// everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSelector {
    pub entity: Option<EntityKind>,
    pub event: Option<EventKind>,
}

impl EventSelector {
    /// Match every event.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match every event for one entity kind.
    pub fn for_entity(entity: EntityKind) -> Self {
        Self {
            entity: Some(entity),
            event: None,
        }
    }

    /// Match deletion events for one entity kind.
    pub fn deletions_of(entity: EntityKind) -> Self {
        Self {
            entity: Some(entity),
            event: Some(EventKind::Deleted),
        }
    }

    /// Whether `event` passes this filter.
    pub fn matches(&self, event: &DomainEvent) -> bool {
        self.entity.map_or(true, |e| e == event.entity())
            && self.event.map_or(true, |k| k == event.kind())
    }
}
