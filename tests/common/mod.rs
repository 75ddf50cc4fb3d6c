#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use anyhow::anyhow;
use async_trait::async_trait;
use mini_es_store::{
    AggregateStore, CqrsError, EventLog, EventPublisher, ExpectedVersion, InMemoryEventLog,
    MemoryTransaction, PublishedEvent, ReadSlice, Record, Result,
};

/// Wraps an [`InMemoryEventLog`], recording how it is used and optionally failing a page write.
#[derive(Clone, Default)]
pub struct ProbeLog {
    pub inner: InMemoryEventLog,
    reads: Arc<Mutex<Vec<(u64, usize)>>>,
    appends: Arc<AtomicUsize>,
    pages: Arc<AtomicUsize>,
    fail_on_page: Option<usize>,
}

pub struct ProbeTransaction {
    stream_id: String,
    inner: MemoryTransaction,
    pages: usize,
}

impl ProbeLog {
    pub fn new(inner: InMemoryEventLog) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Fails the `page`-th page (1-based) of every transaction.
    pub fn failing_on_page(mut self, page: usize) -> Self {
        self.fail_on_page = Some(page);
        self
    }

    /// `(start, count)` of every forward read so far.
    pub fn reads(&self) -> Vec<(u64, usize)> {
        self.reads.lock().unwrap().clone()
    }

    pub fn appends(&self) -> usize {
        self.appends.load(Ordering::SeqCst)
    }

    pub fn pages(&self) -> usize {
        self.pages.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventLog for ProbeLog {
    type Transaction = ProbeTransaction;

    async fn read_forward(&self, stream_id: &str, start: u64, count: usize) -> Result<ReadSlice> {
        self.reads.lock().unwrap().push((start, count));
        self.inner.read_forward(stream_id, start, count).await
    }

    async fn append(
        &self,
        stream_id: &str,
        expected: ExpectedVersion,
        records: Vec<Record>,
    ) -> Result<u64> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        self.inner.append(stream_id, expected, records).await
    }

    async fn start_transaction(
        &self,
        stream_id: &str,
        expected: ExpectedVersion,
    ) -> Result<ProbeTransaction> {
        Ok(ProbeTransaction {
            stream_id: stream_id.to_string(),
            inner: self.inner.start_transaction(stream_id, expected).await?,
            pages: 0,
        })
    }

    async fn write_page(
        &self,
        transaction: &mut ProbeTransaction,
        records: Vec<Record>,
    ) -> Result<()> {
        transaction.pages += 1;
        if self.fail_on_page == Some(transaction.pages) {
            return Err(CqrsError::store_operation(
                &transaction.stream_id,
                anyhow!("connection reset while writing page {}", transaction.pages),
            ));
        }

        self.pages.fetch_add(1, Ordering::SeqCst);
        self.inner.write_page(&mut transaction.inner, records).await
    }

    async fn commit(&self, transaction: ProbeTransaction) -> Result<u64> {
        self.inner.commit(transaction.inner).await
    }
}

/// Keeps every event it is handed.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<PublishedEvent>>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &PublishedEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Counts publish attempts and rejects every one of them.
#[derive(Clone, Default)]
pub struct FailingPublisher {
    attempts: Arc<AtomicUsize>,
}

impl FailingPublisher {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: &PublishedEvent) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(anyhow!("subscriber offline"))
    }
}

pub fn recording_store() -> (
    AggregateStore<InMemoryEventLog, RecordingPublisher>,
    InMemoryEventLog,
    RecordingPublisher,
) {
    let log = InMemoryEventLog::new();
    let publisher = RecordingPublisher::default();
    let store = AggregateStore::new(log.clone(), publisher.clone());
    (store, log, publisher)
}
