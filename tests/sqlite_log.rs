mod common;

use std::num::NonZeroUsize;

use anyhow::anyhow;
use async_trait::async_trait;
use common::RecordingPublisher;
use mini_es_store::{
    Aggregate, AggregateStore, CqrsError, EventLog, ExpectedVersion, ReadSlice, Record, Result,
    SliceStatus, Uuid, inventory::InventoryItem,
};
use sqlx::{
    Row, Sqlite, SqlitePool, Transaction,
    sqlite::{SqlitePoolOptions, SqliteRow},
};

/// An [`EventLog`] on a single-connection, in-memory SQLite database.
#[derive(Clone)]
struct SqliteEventLog {
    pool: SqlitePool,
    fail_on_page: Option<usize>,
}

struct SqliteTransaction {
    stream_id: String,
    tx: Transaction<'static, Sqlite>,
    version: u64,
    pages: usize,
}

impl SqliteEventLog {
    async fn connect() -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::query(
            r#"
            CREATE TABLE events (
                stream_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                record_id TEXT NOT NULL UNIQUE,
                event_type TEXT NOT NULL,
                payload BLOB NOT NULL,
                metadata BLOB NOT NULL,
                PRIMARY KEY (stream_id, position)
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();

        Self {
            pool,
            fail_on_page: None,
        }
    }

    async fn stream_len(&self, stream_id: &str) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE stream_id = $1")
            .bind(stream_id)
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

fn record_from_row(row: &SqliteRow) -> anyhow::Result<Record> {
    Ok(Record {
        record_id: Uuid::parse_str(row.try_get("record_id")?)?,
        event_type: row.try_get("event_type")?,
        is_json: true,
        payload: row.try_get("payload")?,
        metadata: row.try_get("metadata")?,
    })
}

async fn begin(
    pool: &SqlitePool,
    stream_id: &str,
    expected: ExpectedVersion,
) -> Result<SqliteTransaction> {
    let failed = |error: sqlx::Error| CqrsError::store_operation(stream_id, error);

    let mut tx = pool.begin().await.map_err(failed)?;
    let actual = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE stream_id = $1")
        .bind(stream_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(failed)?;

    let actual = actual as u64;
    if !expected.is_satisfied_by(actual) {
        return Err(CqrsError::ConcurrencyConflict {
            stream_id: stream_id.to_string(),
            expected,
            actual,
        });
    }

    Ok(SqliteTransaction {
        stream_id: stream_id.to_string(),
        tx,
        version: actual,
        pages: 0,
    })
}

async fn insert(transaction: &mut SqliteTransaction, records: Vec<Record>) -> Result<()> {
    for record in records {
        sqlx::query(
            r#"
            INSERT INTO events (stream_id, position, record_id, event_type, payload, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&transaction.stream_id)
        .bind(transaction.version as i64)
        .bind(record.record_id.to_string())
        .bind(&record.event_type)
        .bind(&record.payload)
        .bind(&record.metadata)
        .execute(&mut *transaction.tx)
        .await
        .map_err(|error| CqrsError::store_operation(&transaction.stream_id, error))?;

        transaction.version += 1;
    }
    Ok(())
}

#[async_trait]
impl EventLog for SqliteEventLog {
    type Transaction = SqliteTransaction;

    async fn read_forward(&self, stream_id: &str, start: u64, count: usize) -> Result<ReadSlice> {
        let failed = |error: anyhow::Error| CqrsError::store_operation(stream_id, error);

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events WHERE stream_id = $1")
            .bind(stream_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| failed(error.into()))?;
        if total == 0 {
            return Ok(ReadSlice::not_found());
        }

        let rows = sqlx::query(
            r#"
            SELECT record_id, event_type, payload, metadata
            FROM events
            WHERE stream_id = $1 AND position >= $2
            ORDER BY position
            LIMIT $3
            "#,
        )
        .bind(stream_id)
        .bind(start as i64)
        .bind(count as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| failed(error.into()))?;

        let records = rows
            .iter()
            .map(record_from_row)
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(failed)?;
        let next_position = start + records.len() as u64;

        Ok(ReadSlice {
            status: SliceStatus::Success,
            records,
            next_position,
            is_end_of_stream: next_position >= total as u64,
        })
    }

    async fn append(
        &self,
        stream_id: &str,
        expected: ExpectedVersion,
        records: Vec<Record>,
    ) -> Result<u64> {
        let mut transaction = begin(&self.pool, stream_id, expected).await?;
        insert(&mut transaction, records).await?;
        self.commit(transaction).await
    }

    async fn start_transaction(
        &self,
        stream_id: &str,
        expected: ExpectedVersion,
    ) -> Result<SqliteTransaction> {
        begin(&self.pool, stream_id, expected).await
    }

    async fn write_page(
        &self,
        transaction: &mut SqliteTransaction,
        records: Vec<Record>,
    ) -> Result<()> {
        transaction.pages += 1;
        if self.fail_on_page == Some(transaction.pages) {
            return Err(CqrsError::store_operation(
                &transaction.stream_id,
                anyhow!("disk full"),
            ));
        }
        insert(transaction, records).await
    }

    async fn commit(&self, transaction: SqliteTransaction) -> Result<u64> {
        let SqliteTransaction {
            stream_id,
            tx,
            version,
            ..
        } = transaction;
        tx.commit()
            .await
            .map_err(|error| CqrsError::store_operation(&stream_id, error))?;
        Ok(version)
    }
}

fn paged_store(log: SqliteEventLog) -> AggregateStore<SqliteEventLog, RecordingPublisher> {
    AggregateStore::builder(log, RecordingPublisher::default())
        .read_page_size(NonZeroUsize::new(2).unwrap())
        .write_page_size(NonZeroUsize::new(2).unwrap())
        .build()
}

#[tokio::test]
async fn round_trips_through_sqlite() {
    let log = SqliteEventLog::connect().await;
    let store = paged_store(log.clone());
    let id = Uuid::new_v4();

    let mut item = InventoryItem::create(id, "Widget").unwrap();
    item.check_in(10).unwrap();
    store.save(&mut item, Uuid::new_v4(), |_| {}).await.unwrap();

    item.remove(4).unwrap();
    item.rename("Gadget").unwrap();
    item.check_in(1).unwrap();
    store.save(&mut item, Uuid::new_v4(), |_| {}).await.unwrap();

    assert_eq!(log.stream_len(&id.to_string()).await, 5);

    let loaded: InventoryItem = store.load(id).await.unwrap();
    assert_eq!(loaded, item);
    assert_eq!(loaded.count(), 7);

    let early: InventoryItem = store.load_version(id, 2).await.unwrap();
    assert_eq!(early.name(), "Widget");
    assert_eq!(early.count(), 10);
}

#[tokio::test]
async fn failed_page_rolls_the_transaction_back() {
    let mut log = SqliteEventLog::connect().await;
    log.fail_on_page = Some(2);
    let store = paged_store(log.clone());
    let id = Uuid::new_v4();

    let mut item = InventoryItem::create(id, "Widget").unwrap();
    for _ in 0..4 {
        item.check_in(1).unwrap();
    }
    let result = store.save(&mut item, Uuid::new_v4(), |_| {}).await;

    assert!(matches!(result, Err(CqrsError::StoreOperation { .. })));
    assert_eq!(item.uncommitted_events().len(), 5);
    assert_eq!(log.stream_len(&id.to_string()).await, 0);
    assert!(matches!(
        store.load::<InventoryItem>(id).await,
        Err(CqrsError::AggregateNotFound { .. })
    ));
}

#[tokio::test]
async fn conflicting_writers_are_rejected() {
    let log = SqliteEventLog::connect().await;
    let store = paged_store(log.clone());
    let id = Uuid::new_v4();

    let mut item = InventoryItem::create(id, "Widget").unwrap();
    store.save(&mut item, Uuid::new_v4(), |_| {}).await.unwrap();

    let mut stale: InventoryItem = store.load(id).await.unwrap();
    item.rename("Gadget").unwrap();
    store.save(&mut item, Uuid::new_v4(), |_| {}).await.unwrap();

    stale.check_in(3).unwrap();
    assert!(matches!(
        store.save(&mut stale, Uuid::new_v4(), |_| {}).await,
        Err(CqrsError::ConcurrencyConflict {
            expected: ExpectedVersion::Exact(1),
            actual: 2,
            ..
        })
    ));
    assert_eq!(log.stream_len(&id.to_string()).await, 2);
}
