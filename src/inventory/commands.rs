use serde::{Deserialize, Serialize};

use super::InventoryItem;
use crate::{Command, CreateCommand, Result, Uuid};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInventoryItem {
    pub id: Uuid,
    pub name: String,
}

impl CreateCommand for CreateInventoryItem {
    type Aggregate = InventoryItem;

    fn create(&self) -> Result<InventoryItem> {
        InventoryItem::create(self.id, &self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameInventoryItem {
    pub id: Uuid,
    pub new_name: String,
}

impl Command for RenameInventoryItem {
    type Aggregate = InventoryItem;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn handle(&self, item: &mut InventoryItem) -> Result<()> {
        item.rename(&self.new_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInItemsToInventory {
    pub id: Uuid,
    pub count: i64,
}

impl Command for CheckInItemsToInventory {
    type Aggregate = InventoryItem;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn handle(&self, item: &mut InventoryItem) -> Result<()> {
        item.check_in(self.count)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveItemsFromInventory {
    pub id: Uuid,
    pub count: i64,
}

impl Command for RemoveItemsFromInventory {
    type Aggregate = InventoryItem;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn handle(&self, item: &mut InventoryItem) -> Result<()> {
        item.remove(self.count)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateInventoryItem {
    pub id: Uuid,
}

impl Command for DeactivateInventoryItem {
    type Aggregate = InventoryItem;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn handle(&self, item: &mut InventoryItem) -> Result<()> {
        item.deactivate()
    }
}
