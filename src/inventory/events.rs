use serde::{Deserialize, Serialize};

use crate::{Uuid, domain_events};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItemCreated {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItemRenamed {
    pub id: Uuid,
    pub new_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsCheckedInToInventory {
    pub id: Uuid,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsRemovedFromInventory {
    pub id: Uuid,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItemDeactivated {
    pub id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InventoryEvent {
    Created(InventoryItemCreated),
    Renamed(InventoryItemRenamed),
    CheckedIn(ItemsCheckedInToInventory),
    Removed(ItemsRemovedFromInventory),
    Deactivated(InventoryItemDeactivated),
}

// Tags are persisted in every record: never rename them.
domain_events! {
    InventoryEvent {
        Created(InventoryItemCreated) => "InventoryItemCreated",
        Renamed(InventoryItemRenamed) => "InventoryItemRenamed",
        CheckedIn(ItemsCheckedInToInventory) => "ItemsCheckedInToInventory",
        Removed(ItemsRemovedFromInventory) => "ItemsRemovedFromInventory",
        Deactivated(InventoryItemDeactivated) => "InventoryItemDeactivated",
    }
}
