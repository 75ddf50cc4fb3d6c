use std::fmt::{Display, Formatter};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Record, Result};

mod memory;

pub use memory::{InMemoryEventLog, MemoryTransaction};

/// The condition a write places on the current length of the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpectedVersion {
    /// Accept the write whatever the stream holds. Writers that use it lose updates.
    Any,
    /// The stream must not exist yet (or be empty).
    NoStream,
    /// The stream must hold exactly this many events.
    Exact(u64),
}

impl ExpectedVersion {
    /// The expectation matching an aggregate that has seen `committed` events of its stream.
    pub fn from_committed(committed: u64) -> Self {
        match committed {
            0 => Self::NoStream,
            n => Self::Exact(n),
        }
    }

    pub fn is_satisfied_by(&self, actual: u64) -> bool {
        match self {
            Self::Any => true,
            Self::NoStream => actual == 0,
            Self::Exact(expected) => *expected == actual,
        }
    }
}

impl Display for ExpectedVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::NoStream => write!(f, "no stream"),
            Self::Exact(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceStatus {
    Success,
    StreamNotFound,
    StreamDeleted,
}

/// One page of a forward read.
#[derive(Clone, Debug)]
pub struct ReadSlice {
    pub status: SliceStatus,
    pub records: Vec<Record>,
    /// Position to start the next page from.
    pub next_position: u64,
    pub is_end_of_stream: bool,
}

impl ReadSlice {
    pub fn not_found() -> Self {
        Self::terminal(SliceStatus::StreamNotFound)
    }

    pub fn deleted() -> Self {
        Self::terminal(SliceStatus::StreamDeleted)
    }

    fn terminal(status: SliceStatus) -> Self {
        Self {
            status,
            records: Vec::new(),
            next_position: 0,
            is_end_of_stream: true,
        }
    }
}

/// The `EventLog` trait is the backing log the aggregate store reads from and appends to.
///
/// Positions are 0-based and versions count events, so a stream holding `n` events has version
/// `n` and its next record lands at position `n`. Every write carries an [`ExpectedVersion`]; a
/// mismatch must fail with [`CqrsError::ConcurrencyConflict`](crate::CqrsError) and leave the
/// stream unchanged.
///
/// Writes larger than one page go through a transaction: pages written with
/// [`write_page`](EventLog::write_page) become visible only once [`commit`](EventLog::commit)
/// succeeds, and dropping an uncommitted transaction discards them.
#[async_trait]
pub trait EventLog: Send + Sync {
    type Transaction: Send;

    async fn read_forward(&self, stream_id: &str, start: u64, count: usize) -> Result<ReadSlice>;

    /// Appends `records` atomically and returns the new stream version.
    async fn append(
        &self,
        stream_id: &str,
        expected: ExpectedVersion,
        records: Vec<Record>,
    ) -> Result<u64>;

    async fn start_transaction(
        &self,
        stream_id: &str,
        expected: ExpectedVersion,
    ) -> Result<Self::Transaction>;

    async fn write_page(
        &self,
        transaction: &mut Self::Transaction,
        records: Vec<Record>,
    ) -> Result<()>;

    /// Makes every written page visible at once and returns the new stream version.
    async fn commit(&self, transaction: Self::Transaction) -> Result<u64>;
}
