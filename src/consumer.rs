use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{EventVariant, PublishedEvent};

/// A trait that defines where the aggregate store sends events once their commit is durable.
///
/// It is called once per saved event, in commit order. An error is reported to the caller of
/// `save` but never undoes the append.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &PublishedEvent) -> anyhow::Result<()>;
}

#[async_trait]
impl<P: EventPublisher + ?Sized> EventPublisher for Arc<P> {
    async fn publish(&self, event: &PublishedEvent) -> anyhow::Result<()> {
        (**self).publish(event).await
    }
}

/// A trait that defines the behavior of an event consumer.
///
/// An event consumer reacts to published events, typically by updating a read model.
#[async_trait]
pub trait EventConsumer: Send + Sync + 'static {
    async fn process(&self, event: &PublishedEvent) -> anyhow::Result<()>;
}

type Subscribers = HashMap<String, Vec<Arc<dyn EventConsumer>>>;

/// An in-process [`EventPublisher`] routing each event to the consumers subscribed to its variant.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<RwLock<Subscribers>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `consumer` to the variant `V`.
    pub async fn subscribe<V: EventVariant>(&self, consumer: Arc<dyn EventConsumer>) {
        self.subscribe_to(V::EVENT_TYPE, consumer).await;
    }

    /// Subscribes `consumer` to a raw variant tag.
    pub async fn subscribe_to(&self, event_type: &str, consumer: Arc<dyn EventConsumer>) {
        self.subscribers
            .write()
            .await
            .entry(event_type.to_string())
            .or_default()
            .push(consumer);
    }

    pub async fn subscriber_count(&self, event_type: &str) -> usize {
        self.subscribers
            .read()
            .await
            .get(event_type)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl EventPublisher for EventBus {
    async fn publish(&self, event: &PublishedEvent) -> anyhow::Result<()> {
        let consumers = self
            .subscribers
            .read()
            .await
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();

        debug!(
            event_type = %event.event_type,
            event_id = %event.id,
            consumers = consumers.len(),
            "dispatching event"
        );

        let mut first_error = None;
        for consumer in consumers {
            if let Err(error) = consumer.process(event).await {
                warn!(
                    event_type = %event.event_type,
                    event_id = %event.id,
                    "consumer failed: {error:#}"
                );
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error.context(format!(
                "a consumer of {} failed for event {}",
                event.event_type, event.id
            ))),
            None => Ok(()),
        }
    }
}
