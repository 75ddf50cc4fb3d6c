//! A stock-keeping item: created with a name, renamed, checked in, removed from and deactivated.

mod commands;
mod events;
mod item;

pub use commands::{
    CheckInItemsToInventory, CreateInventoryItem, DeactivateInventoryItem, RemoveItemsFromInventory,
    RenameInventoryItem,
};
pub use events::{
    InventoryEvent, InventoryItemCreated, InventoryItemDeactivated, InventoryItemRenamed,
    ItemsCheckedInToInventory, ItemsRemovedFromInventory,
};
pub use item::InventoryItem;
