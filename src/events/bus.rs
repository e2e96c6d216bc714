//! Event bus capability and the in-process implementation.
//!
//! The bus is modeled as an abstract enqueue/consume channel so the backing
//! transport (in-process queues here, an external broker elsewhere) can be
//! swapped without changing subscriber logic. `publish` completes once the
//! event is enqueued for every matching subscriber, not once it has been
//! handled; each subscriber drains its own queue in a spawned worker task.
//!
//! Failure containment: a handler that errors is logged and the event is
//! dropped for that subscriber (redelivery policy is a deployment concern).
//! Handler failures never propagate to the publisher or to other
//! subscribers.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::{DomainEvent, EventSelector};

/// Queue depth per subscriber. Publishers feel backpressure beyond this.
const SUBSCRIBER_QUEUE_CAPACITY: usize = 256;

/// Consumer callback invoked once per delivered event.
///
/// Handlers must be idempotent: the delivery contract is at-least-once, so
/// the same event may be observed twice.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Short name used in delivery logs.
    fn name(&self) -> &'static str;

    /// Handle one delivery. An error is contained to this subscriber.
    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()>;
}

/// Publish/subscribe capability over [`DomainEvent`]s.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Enqueue `event` for every matching subscriber.
    ///
    /// Returns once the event is durably enqueued everywhere; consumers
    /// process it asynchronously. Fails with [`Error::BusClosed`] when the
    /// bus has been shut down.
    async fn publish(&self, event: DomainEvent) -> Result<()>;

    /// Register `handler` for events matching `selector`.
    fn subscribe(&self, selector: EventSelector, handler: Arc<dyn EventHandler>) -> Subscription;

    /// Remove a subscriber; its queue closes and its worker drains and exits.
    fn unsubscribe(&self, subscription: &Subscription);
}

/// Handle identifying one subscriber registration.
#[derive(Debug)]
pub struct Subscription {
    id: Uuid,
}

impl Subscription {
    /// Unique id of this registration.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

struct SubscriberEntry {
    id: Uuid,
    name: &'static str,
    selector: EventSelector,
    sender: mpsc::Sender<DomainEvent>,
}

/// In-process [`EventBus`] backed by one bounded queue per subscriber.
#[derive(Default)]
pub struct InProcessBus {
    subscribers: RwLock<Vec<SubscriberEntry>>,
    closed: RwLock<bool>,
}

impl InProcessBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the bus: drop every subscriber queue so workers drain and exit.
    /// Subsequent publishes fail with [`Error::BusClosed`].
    pub fn shutdown(&self) {
        *self.closed.write() = true;
        self.subscribers.write().clear();
        info!("event bus shut down");
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[async_trait]
impl EventBus for InProcessBus {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        if *self.closed.read() {
            return Err(Error::BusClosed);
        }

        // Snapshot matching senders so no lock is held across await points.
        let targets: Vec<(Uuid, &'static str, mpsc::Sender<DomainEvent>)> = {
            let subscribers = self.subscribers.read();
            subscribers
                .iter()
                .filter(|entry| entry.selector.matches(&event))
                .map(|entry| (entry.id, entry.name, entry.sender.clone()))
                .collect()
        };

        debug!(
            event_id = %event.event_id(),
            entity = %event.entity(),
            entity_id = %event.entity_id(),
            subscribers = targets.len(),
            "publishing domain event"
        );

        let mut stale = Vec::new();
        for (id, name, sender) in targets {
            if sender.send(event.clone()).await.is_err() {
                // Receiver gone without unsubscribing; prune below.
                warn!(subscriber = name, "subscriber queue closed, pruning");
                stale.push(id);
            }
        }

        if !stale.is_empty() {
            self.subscribers
                .write()
                .retain(|entry| !stale.contains(&entry.id));
        }

        Ok(())
    }

    fn subscribe(&self, selector: EventSelector, handler: Arc<dyn EventHandler>) -> Subscription {
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);
        let id = Uuid::new_v4();
        let name = handler.name();

        tokio::spawn(deliver(receiver, handler));

        self.subscribers.write().push(SubscriberEntry {
            id,
            name,
            selector,
            sender,
        });

        info!(subscriber = name, subscription_id = %id, "subscriber registered");
        Subscription { id }
    }

    fn unsubscribe(&self, subscription: &Subscription) {
        self.subscribers
            .write()
            .retain(|entry| entry.id != subscription.id);
    }
}

/// Worker loop for one subscriber: drain the queue until it closes, handing
/// each event to the handler and containing handler failures.
async fn deliver(mut receiver: mpsc::Receiver<DomainEvent>, handler: Arc<dyn EventHandler>) {
    let name = handler.name();
    debug!(subscriber = name, "subscriber worker started");

    while let Some(event) = receiver.recv().await {
        if let Err(error) = handler.handle(&event).await {
            warn!(
                subscriber = name,
                event_id = %event.event_id(),
                entity = %event.entity(),
                entity_id = %event.entity_id(),
                error = %error,
                "event handler failed; delivery dropped"
            );
        }
    }

    debug!(subscriber = name, "subscriber worker stopped (queue closed)");
}
