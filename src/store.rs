use std::{num::NonZeroUsize, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    AGGREGATE_TYPE_HEADER, Aggregate, COMMIT_ID_HEADER, CqrsError, DomainEvent, EventCodec,
    EventLog, EventPublisher, ExpectedVersion, Headers, IdStreamNaming, PublishedEvent, Record,
    Result, SliceStatus, StreamNaming, Uuid,
};

const DEFAULT_PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(50).unwrap();

/// Paging settings of an [`AggregateStore`].
///
/// Deserializable so host applications can embed it in their own configuration. Missing fields
/// take the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum number of records requested per read.
    pub read_page_size: NonZeroUsize,

    /// Saves with at least this many events are written in pages of this size inside a
    /// transaction; smaller ones are a single append.
    pub write_page_size: NonZeroUsize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            read_page_size: DEFAULT_PAGE_SIZE,
            write_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// The `AggregateStore` loads aggregates by replaying their stream and saves the events they
/// produced, publishing each one once the write is durable.
///
/// It holds no per-aggregate state: concurrent writers to the same aggregate are arbitrated by
/// the log, through the expected version every save carries.
#[derive(Clone)]
pub struct AggregateStore<L, P> {
    log: L,
    publisher: P,
    naming: Arc<dyn StreamNaming>,
    config: StoreConfig,
}

impl<L, P> AggregateStore<L, P>
where
    L: EventLog,
    P: EventPublisher,
{
    pub fn new(log: L, publisher: P) -> Self {
        Self::builder(log, publisher).build()
    }

    pub fn builder(log: L, publisher: P) -> AggregateStoreBuilder<L, P> {
        AggregateStoreBuilder {
            log,
            publisher,
            naming: Arc::new(IdStreamNaming),
            config: StoreConfig::default(),
        }
    }

    pub fn stream_id<A: Aggregate>(&self, id: Uuid) -> String {
        self.naming.stream_id(A::AGGREGATE_TYPE, id)
    }

    /// Loads the latest state of an aggregate.
    pub async fn load<A: Aggregate>(&self, id: Uuid) -> Result<A> {
        self.load_version(id, u64::MAX).await
    }

    /// Loads an aggregate as it was after its first `version` events.
    pub async fn load_version<A: Aggregate>(&self, id: Uuid, version: u64) -> Result<A> {
        if version == 0 {
            return Err(CqrsError::InvalidVersionRequested(version));
        }

        let stream_id = self.stream_id::<A>(id);
        let codec = EventCodec::<A::Event>::new();
        let mut aggregate = A::blank(id);
        let page_size = self.config.read_page_size.get() as u64;

        let mut position = 0;
        loop {
            let count = page_size.min(version - position) as usize;
            let slice = self.log.read_forward(&stream_id, position, count).await?;

            match slice.status {
                SliceStatus::Success => {}
                SliceStatus::StreamNotFound => {
                    return Err(CqrsError::AggregateNotFound {
                        aggregate_type: A::AGGREGATE_TYPE,
                        stream_id,
                    });
                }
                SliceStatus::StreamDeleted => {
                    return Err(CqrsError::AggregateDeleted {
                        aggregate_type: A::AGGREGATE_TYPE,
                        stream_id,
                    });
                }
            }

            for record in &slice.records {
                aggregate.apply_history(&codec.decode(record)?)?;
            }

            debug!(
                stream_id = %stream_id,
                from = position,
                records = slice.records.len(),
                "read page"
            );

            position = slice.next_position;
            if slice.is_end_of_stream || slice.records.is_empty() || position >= version {
                break;
            }
        }

        debug!(
            stream_id = %stream_id,
            aggregate_type = A::AGGREGATE_TYPE,
            version = aggregate.version(),
            "aggregate loaded"
        );
        Ok(aggregate)
    }

    /// Persists the events an aggregate produced since it was loaded, as one commit.
    ///
    /// `update_headers` is called once with the commit headers and may add its own; they are
    /// stored with every event of the commit. On success the aggregate's buffer is empty. A
    /// failed write leaves the buffer untouched, while a failed publication is reported only after
    /// the commit is durable and the buffer cleared.
    pub async fn save<A, F>(
        &self,
        aggregate: &mut A,
        commit_id: Uuid,
        update_headers: F,
    ) -> Result<()>
    where
        A: Aggregate,
        F: FnOnce(&mut Headers) + Send,
    {
        let mut headers = Headers::new();
        headers.insert(COMMIT_ID_HEADER.to_string(), commit_id.to_string().into());
        headers.insert(AGGREGATE_TYPE_HEADER.to_string(), A::AGGREGATE_TYPE.into());
        update_headers(&mut headers);

        let stream_id = self.stream_id::<A>(aggregate.id());

        if aggregate.uncommitted_events().is_empty() {
            debug!(stream_id = %stream_id, %commit_id, "nothing to save");
            return Ok(());
        }

        if let Some(event) = aggregate
            .uncommitted_events()
            .iter()
            .find(|event| event.aggregate_id() != aggregate.id())
        {
            return Err(CqrsError::ForeignEvent {
                aggregate_id: aggregate.id(),
                event_type: event.event_type(),
                event_aggregate_id: event.aggregate_id(),
            });
        }

        let codec = EventCodec::<A::Event>::new();
        let records = aggregate
            .uncommitted_events()
            .iter()
            .map(|event| codec.encode(event, &headers))
            .collect::<Result<Vec<_>>>()?;
        let payloads = aggregate
            .uncommitted_events()
            .iter()
            .zip(&records)
            .map(|(event, record)| -> Result<(Uuid, &'static str, serde_json::Value)> {
                Ok((record.record_id, event.event_type(), event.to_payload()?))
            })
            .collect::<Result<Vec<_>>>()?;

        let committed = aggregate.root().committed_version();
        let expected = ExpectedVersion::from_committed(committed);
        let version = self.write(&stream_id, expected, records).await?;
        info!(
            stream_id = %stream_id,
            %commit_id,
            version,
            events = payloads.len(),
            "commit written"
        );

        aggregate.drain_uncommitted();

        let published: Vec<_> = payloads
            .into_iter()
            .enumerate()
            .map(|(i, (record_id, event_type, payload))| {
                PublishedEvent::new(
                    record_id,
                    event_type,
                    aggregate.id(),
                    A::AGGREGATE_TYPE,
                    commit_id,
                    headers.clone(),
                    committed + i as u64 + 1,
                    payload,
                )
            })
            .collect();

        let mut failure = None;
        for event in &published {
            if let Err(source) = self.publisher.publish(event).await {
                warn!(
                    stream_id = %stream_id,
                    %commit_id,
                    event_id = %event.id,
                    "publication failed: {source:#}"
                );
                failure.get_or_insert(CqrsError::Publication {
                    commit_id,
                    event_id: event.id,
                    source,
                });
            }
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn write(
        &self,
        stream_id: &str,
        expected: ExpectedVersion,
        records: Vec<Record>,
    ) -> Result<u64> {
        let page_size = self.config.write_page_size.get();
        if records.len() < page_size {
            return self.log.append(stream_id, expected, records).await;
        }

        debug!(
            stream_id = %stream_id,
            records = records.len(),
            pages = records.len().div_ceil(page_size),
            "writing commit in pages"
        );

        // An uncommitted transaction is discarded when dropped, so `?` leaves the stream as is.
        let mut transaction = self.log.start_transaction(stream_id, expected).await?;
        for page in records.chunks(page_size) {
            self.log.write_page(&mut transaction, page.to_vec()).await?;
        }
        self.log.commit(transaction).await
    }
}

pub struct AggregateStoreBuilder<L, P> {
    log: L,
    publisher: P,
    naming: Arc<dyn StreamNaming>,
    config: StoreConfig,
}

impl<L, P> AggregateStoreBuilder<L, P>
where
    L: EventLog,
    P: EventPublisher,
{
    pub fn naming(mut self, naming: impl StreamNaming + 'static) -> Self {
        self.naming = Arc::new(naming);
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn read_page_size(mut self, size: NonZeroUsize) -> Self {
        self.config.read_page_size = size;
        self
    }

    pub fn write_page_size(mut self, size: NonZeroUsize) -> Self {
        self.config.write_page_size = size;
        self
    }

    pub fn build(self) -> AggregateStore<L, P> {
        AggregateStore {
            log: self.log,
            publisher: self.publisher,
            naming: self.naming,
            config: self.config,
        }
    }
}
