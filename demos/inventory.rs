/// # mini_es_store Example: Inventory
///
/// Runs a few commands against an inventory item, keeps a read model up to date from the
/// published events, and reloads the item at an earlier version.
///
/// ## Usage
///
/// ```sh
/// RUST_LOG=mini_es_store=debug cargo run --example inventory
/// ```
///
use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use mini_es_store::{
    Aggregate, AggregateStore, Cqrs, EventBus, EventConsumer, InMemoryEventLog, PublishedEvent,
    StoreConfig, TypePrefixedNaming, Uuid,
    inventory::{
        CheckInItemsToInventory, CreateInventoryItem, InventoryItem, InventoryItemCreated,
        InventoryItemRenamed, ItemsCheckedInToInventory, ItemsRemovedFromInventory,
        RemoveItemsFromInventory, RenameInventoryItem,
    },
};
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct ItemSummary {
    name: String,
    count: i64,
}

#[derive(Default)]
struct InventoryListView {
    items: RwLock<HashMap<Uuid, ItemSummary>>,
}

#[async_trait]
impl EventConsumer for InventoryListView {
    async fn process(&self, event: &PublishedEvent) -> anyhow::Result<()> {
        let mut items = self.items.write().await;
        let summary = items.entry(event.aggregate_id).or_default();

        match event.event_type.as_str() {
            "InventoryItemCreated" => {
                summary.name = event.get_payload::<InventoryItemCreated>()?.name;
            }
            "InventoryItemRenamed" => {
                summary.name = event.get_payload::<InventoryItemRenamed>()?.new_name;
            }
            "ItemsCheckedInToInventory" => {
                summary.count += event.get_payload::<ItemsCheckedInToInventory>()?.count;
            }
            "ItemsRemovedFromInventory" => {
                summary.count -= event.get_payload::<ItemsRemovedFromInventory>()?.count;
            }
            _ => {}
        }
        Ok(())
    }
}

/// Prints every event it receives.
struct PrintEventConsumer;

#[async_trait]
impl EventConsumer for PrintEventConsumer {
    async fn process(&self, event: &PublishedEvent) -> anyhow::Result<()> {
        println!(
            "[v{}] {} on {} (commit {})",
            event.version, event.event_type, event.aggregate_id, event.commit_id
        );
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let view = Arc::new(InventoryListView::default());
    let printer = Arc::new(PrintEventConsumer);

    let bus = EventBus::new();
    bus.subscribe::<InventoryItemCreated>(view.clone()).await;
    bus.subscribe::<InventoryItemRenamed>(view.clone()).await;
    bus.subscribe::<ItemsCheckedInToInventory>(view.clone()).await;
    bus.subscribe::<ItemsRemovedFromInventory>(view.clone()).await;
    for event_type in [
        "InventoryItemCreated",
        "InventoryItemRenamed",
        "ItemsCheckedInToInventory",
        "ItemsRemovedFromInventory",
    ] {
        bus.subscribe_to(event_type, printer.clone()).await;
    }

    let config: StoreConfig = serde_json::from_str(r#"{ "read_page_size": 2 }"#)?;
    let store = AggregateStore::builder(InMemoryEventLog::new(), bus)
        .naming(TypePrefixedNaming)
        .config(config)
        .build();
    let cqrs = Cqrs::new(store);

    let id = Uuid::new_v4();
    cqrs.create(&CreateInventoryItem {
        id,
        name: "Widget".to_string(),
    })
    .await?;
    cqrs.execute(&CheckInItemsToInventory { id, count: 10 })
        .await?;
    cqrs.execute(&RemoveItemsFromInventory { id, count: 4 })
        .await?;
    let item = cqrs
        .execute(&RenameInventoryItem {
            id,
            new_name: "Gadget".to_string(),
        })
        .await?;

    println!(
        "item {}: {} x{} at version {}",
        item.id(),
        item.name(),
        item.count(),
        item.version()
    );

    let earlier: InventoryItem = cqrs.store().load_version(id, 2).await?;
    println!(
        "at version 2 it was {} x{}",
        earlier.name(),
        earlier.count()
    );

    if let Err(error) = cqrs
        .execute(&CheckInItemsToInventory { id, count: -1 })
        .await
    {
        println!("rejected: {error}");
    }

    for (id, summary) in view.items.read().await.iter() {
        println!("read model: {id} => {summary:?}");
    }

    Ok(())
}
