//! # mini_es_store
//!
//! Persistence for event-sourced aggregates.
//!
//! An [`Aggregate`] derives its state from the events it applies. The [`AggregateStore`] rebuilds
//! it by replaying its stream page by page from an [`EventLog`], and saves the events it produced
//! since as one commit: a single append, or a transaction of pages for large commits, guarded by
//! the version the aggregate was loaded at. Once the commit is durable every event goes to an
//! [`EventPublisher`], such as the in-process [`EventBus`].
//!
//! Events are a closed enum per aggregate type; [`domain_events!`] wires their variant tags into
//! the [`EventCodec`] used on the wire.

mod aggregate;
mod codec;
mod command;
mod consumer;
mod cqrs;
mod error;
mod event_log;
mod events;
mod naming;
mod store;

pub mod inventory;

pub use aggregate::{Aggregate, AggregateRoot, Transitions};
pub use codec::{
    AGGREGATE_TYPE_HEADER, COMMIT_ID_HEADER, EVENT_TYPE_HEADER, EventCodec, EventRegistry, Headers,
    Record,
};
pub use command::{Command, CreateCommand};
pub use consumer::{EventBus, EventConsumer, EventPublisher};
pub use cqrs::Cqrs;
pub use error::{CqrsError, Result};
pub use event_log::{
    EventLog, ExpectedVersion, InMemoryEventLog, MemoryTransaction, ReadSlice, SliceStatus,
};
pub use events::{DomainEvent, EventVariant, PublishedEvent};
pub use naming::{IdStreamNaming, StreamNaming, TypePrefixedNaming};
pub use store::{AggregateStore, AggregateStoreBuilder, StoreConfig};

#[doc(hidden)]
pub use serde_json;
pub use uuid::Uuid;
