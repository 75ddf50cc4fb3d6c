use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{CqrsError, DomainEvent, EventVariant, Result, Uuid};

/// Header naming the variant tag of a record.
pub const EVENT_TYPE_HEADER: &str = "EventType";

/// Header carrying the commit ID shared by every record of one save.
pub const COMMIT_ID_HEADER: &str = "CommitId";

/// Header carrying the aggregate-type tag.
pub const AGGREGATE_TYPE_HEADER: &str = "AggregateClrType";

/// Commit-level headers, serialized as a JSON object in each record's metadata.
pub type Headers = serde_json::Map<String, serde_json::Value>;

/// The `Record` struct is the wire shape of one event in a stream.
///
/// `payload` holds the JSON of the variant's payload struct and `metadata` a JSON object with the
/// commit headers plus [`EVENT_TYPE_HEADER`]. `record_id` is fresh for every encoded record and is
/// only used by the log for deduplication.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub record_id: Uuid,
    pub event_type: String,
    pub is_json: bool,
    pub payload: Vec<u8>,
    pub metadata: Vec<u8>,
}

impl Record {
    /// Parses the metadata header.
    pub fn headers(&self) -> Result<Headers> {
        Ok(serde_json::from_slice(&self.metadata)?)
    }
}

type DecodeFn<E> = fn(&[u8]) -> serde_json::Result<E>;

fn decode_variant<V: EventVariant>(payload: &[u8]) -> serde_json::Result<V::Event> {
    serde_json::from_slice::<V>(payload).map(V::into_event)
}

/// Maps stable variant tags to decode routines for one event enum.
pub struct EventRegistry<E> {
    decoders: HashMap<&'static str, DecodeFn<E>>,
}

impl<E: DomainEvent> EventRegistry<E> {
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    /// Registers the payload struct `V` under its tag.
    pub fn register<V>(&mut self) -> &mut Self
    where
        V: EventVariant<Event = E>,
    {
        let previous = self.decoders.insert(V::EVENT_TYPE, decode_variant::<V>);
        debug_assert!(previous.is_none(), "tag {} registered twice", V::EVENT_TYPE);
        self
    }

    pub fn contains(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    pub fn decode(&self, event_type: &str, payload: &[u8]) -> Result<E> {
        let decode = self
            .decoders
            .get(event_type)
            .ok_or_else(|| CqrsError::UnknownEventVariant(event_type.to_string()))?;
        Ok(decode(payload)?)
    }
}

impl<E: DomainEvent> Default for EventRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Translates between the events of one aggregate type and [`Record`]s.
pub struct EventCodec<E> {
    registry: EventRegistry<E>,
}

impl<E: DomainEvent> EventCodec<E> {
    pub fn new() -> Self {
        let mut registry = EventRegistry::new();
        E::register(&mut registry);
        Self { registry }
    }

    pub fn registry(&self) -> &EventRegistry<E> {
        &self.registry
    }

    pub fn encode(&self, event: &E, commit_headers: &Headers) -> Result<Record> {
        let payload = serde_json::to_vec(&event.to_payload()?)?;

        let mut headers = commit_headers.clone();
        headers.insert(
            EVENT_TYPE_HEADER.to_string(),
            serde_json::Value::String(event.event_type().to_string()),
        );
        let metadata = serde_json::to_vec(&headers)?;

        Ok(Record {
            record_id: Uuid::new_v4(),
            event_type: event.event_type().to_string(),
            is_json: true,
            payload,
            metadata,
        })
    }

    pub fn decode(&self, record: &Record) -> Result<E> {
        let headers = record.headers()?;
        let event_type = headers
            .get(EVENT_TYPE_HEADER)
            .and_then(serde_json::Value::as_str)
            .ok_or(CqrsError::MissingHeader(EVENT_TYPE_HEADER))?;

        self.registry.decode(event_type, &record.payload)
    }
}

impl<E: DomainEvent> Default for EventCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}
