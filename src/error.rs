use thiserror::Error;
use uuid::Uuid;

use crate::event_log::ExpectedVersion;

#[derive(Error, Debug)]
pub enum CqrsError {
    #[error("Cannot load version {0}: versions start at 1")]
    InvalidVersionRequested(u64),

    #[error("Aggregate {aggregate_type} not found in stream '{stream_id}'")]
    AggregateNotFound {
        aggregate_type: &'static str,
        stream_id: String,
    },

    #[error("Aggregate {aggregate_type} in stream '{stream_id}' has been deleted")]
    AggregateDeleted {
        aggregate_type: &'static str,
        stream_id: String,
    },

    #[error("Stream '{0}' has been deleted and cannot be written")]
    StreamDeleted(String),

    #[error("Unknown event variant '{0}'")]
    UnknownEventVariant(String),

    #[error("Aggregate {aggregate_type} has no transition for event variant '{event_type}'")]
    UnhandledEventVariant {
        aggregate_type: &'static str,
        event_type: String,
    },

    #[error(
        "Concurrency conflict on stream '{stream_id}': expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        stream_id: String,
        expected: ExpectedVersion,
        actual: u64,
    },

    #[error("Command validation failed for aggregate {aggregate_id}: {reason}")]
    CommandValidation { aggregate_id: Uuid, reason: String },

    #[error(
        "Aggregate {aggregate_id} cannot save {event_type} recorded for aggregate {event_aggregate_id}"
    )]
    ForeignEvent {
        aggregate_id: Uuid,
        event_type: &'static str,
        event_aggregate_id: Uuid,
    },

    #[error("Record metadata is missing the '{0}' header")]
    MissingHeader(&'static str),

    #[error("Failed to (de)serialize event data: {0}")]
    PayloadSerialization(#[from] serde_json::Error),

    #[error("Event log operation failed for stream '{stream_id}': {source}")]
    StoreOperation {
        stream_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Commit {commit_id} is durable but publishing event {event_id} failed: {source}")]
    Publication {
        commit_id: Uuid,
        event_id: Uuid,
        #[source]
        source: anyhow::Error,
    },
}

impl CqrsError {
    pub fn validation(aggregate_id: Uuid, reason: impl Into<String>) -> Self {
        Self::CommandValidation {
            aggregate_id,
            reason: reason.into(),
        }
    }

    pub fn store_operation(stream_id: &str, source: impl Into<anyhow::Error>) -> Self {
        Self::StoreOperation {
            stream_id: stream_id.to_string(),
            source: source.into(),
        }
    }
}

// Result alias within the library
pub type Result<T, E = CqrsError> = std::result::Result<T, E>;
