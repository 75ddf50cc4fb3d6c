use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::trace;

use super::{EventLog, ExpectedVersion, ReadSlice, SliceStatus};
use crate::{CqrsError, Record, Result};

#[derive(Debug, Default)]
struct Stream {
    records: Vec<Record>,
    deleted: bool,
}

/// An [`EventLog`] kept in process memory.
///
/// Clones share the same streams, so a test can keep a handle for inspection while the store owns
/// another.
#[derive(Clone, Debug, Default)]
pub struct InMemoryEventLog {
    streams: Arc<RwLock<HashMap<String, Stream>>>,
}

/// Pages staged by [`InMemoryEventLog`] until commit.
#[derive(Debug)]
pub struct MemoryTransaction {
    stream_id: String,
    expected: ExpectedVersion,
    staged: Vec<Record>,
}

impl MemoryTransaction {
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tombstones a stream. Reads report it deleted and writes fail from now on.
    pub async fn delete_stream(&self, stream_id: &str) {
        let mut streams = self.streams.write().await;
        streams.entry(stream_id.to_string()).or_default().deleted = true;
    }

    /// Number of records in a live stream.
    pub async fn stream_len(&self, stream_id: &str) -> Option<usize> {
        let streams = self.streams.read().await;
        streams
            .get(stream_id)
            .filter(|stream| !stream.deleted)
            .map(|stream| stream.records.len())
    }

    /// Every record of a live stream, in order.
    pub async fn read_all(&self, stream_id: &str) -> Vec<Record> {
        let streams = self.streams.read().await;
        streams
            .get(stream_id)
            .filter(|stream| !stream.deleted)
            .map(|stream| stream.records.clone())
            .unwrap_or_default()
    }

    async fn write(
        &self,
        stream_id: &str,
        expected: ExpectedVersion,
        records: Vec<Record>,
    ) -> Result<u64> {
        let mut streams = self.streams.write().await;

        let actual = match streams.get(stream_id) {
            Some(stream) if stream.deleted => {
                return Err(CqrsError::StreamDeleted(stream_id.to_string()));
            }
            Some(stream) => stream.records.len() as u64,
            None => 0,
        };

        if !expected.is_satisfied_by(actual) {
            return Err(CqrsError::ConcurrencyConflict {
                stream_id: stream_id.to_string(),
                expected,
                actual,
            });
        }

        let stream = streams.entry(stream_id.to_string()).or_default();
        stream.records.extend(records);
        trace!(stream_id, version = stream.records.len(), "records written");

        Ok(stream.records.len() as u64)
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    type Transaction = MemoryTransaction;

    async fn read_forward(&self, stream_id: &str, start: u64, count: usize) -> Result<ReadSlice> {
        let streams = self.streams.read().await;

        let Some(stream) = streams.get(stream_id) else {
            return Ok(ReadSlice::not_found());
        };
        if stream.deleted {
            return Ok(ReadSlice::deleted());
        }

        let len = stream.records.len();
        let from = usize::try_from(start).unwrap_or(usize::MAX).min(len);
        let to = from.saturating_add(count).min(len);

        Ok(ReadSlice {
            status: SliceStatus::Success,
            records: stream.records[from..to].to_vec(),
            next_position: to as u64,
            is_end_of_stream: to == len,
        })
    }

    async fn append(
        &self,
        stream_id: &str,
        expected: ExpectedVersion,
        records: Vec<Record>,
    ) -> Result<u64> {
        self.write(stream_id, expected, records).await
    }

    async fn start_transaction(
        &self,
        stream_id: &str,
        expected: ExpectedVersion,
    ) -> Result<MemoryTransaction> {
        Ok(MemoryTransaction {
            stream_id: stream_id.to_string(),
            expected,
            staged: Vec::new(),
        })
    }

    async fn write_page(
        &self,
        transaction: &mut MemoryTransaction,
        records: Vec<Record>,
    ) -> Result<()> {
        transaction.staged.extend(records);
        Ok(())
    }

    async fn commit(&self, transaction: MemoryTransaction) -> Result<u64> {
        let MemoryTransaction {
            stream_id,
            expected,
            staged,
        } = transaction;
        self.write(&stream_id, expected, staged).await
    }
}
