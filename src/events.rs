use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{CqrsError, EventRegistry, Headers, Result, Uuid};

/// The `DomainEvent` trait is implemented by the closed set of events of one aggregate type.
///
/// Each variant of the implementing enum wraps a payload struct (an [`EventVariant`]) that carries
/// the aggregate ID plus whatever the fact needs. The implementation is normally generated by
/// [`domain_events!`](crate::domain_events), which keeps variant tags, payload encoding and the
/// decode registry in sync.
pub trait DomainEvent: Clone + Debug + Send + Sync + 'static {
    /// Gets the stable tag of the concrete variant, as written in the `EventType` header.
    fn event_type(&self) -> &'static str;

    /// Gets the ID of the aggregate that produced the event.
    fn aggregate_id(&self) -> Uuid;

    /// Serializes the payload of the concrete variant, without any tag.
    fn to_payload(&self) -> serde_json::Result<serde_json::Value>;

    /// Registers one decode routine per variant tag.
    fn register(registry: &mut EventRegistry<Self>)
    where
        Self: Sized;
}

/// A payload struct wrapped by exactly one variant of a [`DomainEvent`] enum.
pub trait EventVariant: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The event enum this payload belongs to.
    type Event: DomainEvent;

    /// Stable tag of the variant. Changing it breaks every stream already written.
    const EVENT_TYPE: &'static str;

    /// Wraps the payload into its enum variant.
    fn into_event(self) -> Self::Event;

    /// Borrows the payload if `event` is this variant.
    fn peek(event: &Self::Event) -> Option<&Self>;
}

/// The `domain_events!` macro derives the variant plumbing for an aggregate's event enum.
///
/// Every payload struct must implement `Serialize` and `Deserialize` and carry an `id: Uuid`
/// field holding the aggregate ID.
///
/// ```rust,ignore
/// pub enum CounterEvent {
///     Incremented(Incremented),
///     Reset(Reset),
/// }
///
/// domain_events! {
///     CounterEvent {
///         Incremented(Incremented) => "CounterIncremented",
///         Reset(Reset) => "CounterReset",
///     }
/// }
/// ```
#[macro_export]
macro_rules! domain_events {
    (
        $Name:ident {
            $($Variant:ident($Payload:ty) => $tag:literal),* $(,)?
        }
    ) => {
        $(
            impl From<$Payload> for $Name {
                fn from(event: $Payload) -> Self {
                    $Name::$Variant(event)
                }
            }

            impl $crate::EventVariant for $Payload {
                type Event = $Name;

                const EVENT_TYPE: &'static str = $tag;

                fn into_event(self) -> $Name {
                    $Name::$Variant(self)
                }

                fn peek(event: &$Name) -> Option<&Self> {
                    match event {
                        $Name::$Variant(inner) => Some(inner),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }
        )*

        impl $crate::DomainEvent for $Name {
            fn event_type(&self) -> &'static str {
                match self {
                    $($Name::$Variant(_) => $tag,)*
                }
            }

            fn aggregate_id(&self) -> $crate::Uuid {
                match self {
                    $($Name::$Variant(inner) => inner.id,)*
                }
            }

            fn to_payload(&self) -> $crate::serde_json::Result<$crate::serde_json::Value> {
                match self {
                    $($Name::$Variant(inner) => $crate::serde_json::to_value(inner),)*
                }
            }

            fn register(registry: &mut $crate::EventRegistry<Self>) {
                $(registry.register::<$Payload>();)*
            }
        }
    };
}

/// The `PublishedEvent` struct is what subscribers receive once a commit is durable.
///
/// It is type-erased so a single publisher can serve every aggregate type: the payload stays as
/// JSON and is decoded by the subscriber with [`PublishedEvent::get_payload`], usually into the
/// payload struct matching [`event_type`](PublishedEvent::event_type).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PublishedEvent {
    /// The ID of the record the event was written as.
    pub id: Uuid,

    /// The stable variant tag.
    pub event_type: String,

    /// The ID of the aggregate that the event is associated with.
    pub aggregate_id: Uuid,

    /// The aggregate-type tag.
    pub aggregate_type: String,

    /// The commit the event was saved in.
    pub commit_id: Uuid,

    /// The commit headers, including caller-supplied ones.
    pub headers: Headers,

    /// The 1-based position of the event in its stream.
    pub version: u64,

    /// When the commit holding the event became durable.
    pub timestamp: DateTime<Utc>,

    /// The payload of the event.
    payload: serde_json::Value,
}

impl PublishedEvent {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: Uuid,
        event_type: &str,
        aggregate_id: Uuid,
        aggregate_type: &str,
        commit_id: Uuid,
        headers: Headers,
        version: u64,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id,
            event_type: event_type.to_string(),
            aggregate_id,
            aggregate_type: aggregate_type.to_string(),
            commit_id,
            headers,
            version,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Gets the payload of the event.
    pub fn get_payload<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).map_err(CqrsError::PayloadSerialization)
    }

    /// Returns `true` if the event is the variant `V`.
    pub fn is<V: EventVariant>(&self) -> bool {
        self.event_type == V::EVENT_TYPE
    }
}
