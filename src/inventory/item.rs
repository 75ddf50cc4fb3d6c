use std::sync::LazyLock;

use super::events::{
    InventoryEvent, InventoryItemCreated, InventoryItemDeactivated, InventoryItemRenamed,
    ItemsCheckedInToInventory, ItemsRemovedFromInventory,
};
use crate::{Aggregate, AggregateRoot, CqrsError, Result, Transitions, Uuid};

#[derive(Clone, Debug, PartialEq)]
pub struct InventoryItem {
    root: AggregateRoot<InventoryEvent>,
    name: String,
    count: i64,
    activated: bool,
}

static TRANSITIONS: LazyLock<Transitions<InventoryItem>> = LazyLock::new(|| {
    Transitions::new()
        .on::<InventoryItemCreated>(InventoryItem::on_created)
        .on::<InventoryItemRenamed>(InventoryItem::on_renamed)
        .on::<ItemsCheckedInToInventory>(InventoryItem::on_checked_in)
        .on::<ItemsRemovedFromInventory>(InventoryItem::on_removed)
        .on::<InventoryItemDeactivated>(InventoryItem::on_deactivated)
});

impl InventoryItem {
    pub fn create(id: Uuid, name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(CqrsError::validation(id, "an item needs a name"));
        }

        let mut item = Self::blank(id);
        item.apply_new(
            InventoryItemCreated {
                id,
                name: name.to_string(),
            }
            .into(),
        )?;
        Ok(item)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn rename(&mut self, new_name: &str) -> Result<()> {
        if new_name.is_empty() {
            return Err(CqrsError::validation(self.id(), "new name must not be empty"));
        }

        let id = self.id();
        self.apply_new(
            InventoryItemRenamed {
                id,
                new_name: new_name.to_string(),
            }
            .into(),
        )
    }

    pub fn check_in(&mut self, count: i64) -> Result<()> {
        if count <= 0 {
            return Err(CqrsError::validation(
                self.id(),
                "must have a count greater than 0 to add to inventory",
            ));
        }
        if self.count.checked_add(count).is_none() {
            return Err(CqrsError::validation(
                self.id(),
                "checking in that many items would overflow the stock count",
            ));
        }

        let id = self.id();
        self.apply_new(ItemsCheckedInToInventory { id, count }.into())
    }

    pub fn remove(&mut self, count: i64) -> Result<()> {
        if count <= 0 {
            return Err(CqrsError::validation(
                self.id(),
                "can't remove a non-positive count from inventory",
            ));
        }
        if self.count.checked_sub(count).is_none() {
            return Err(CqrsError::validation(
                self.id(),
                "removing that many items would overflow the stock count",
            ));
        }

        let id = self.id();
        self.apply_new(ItemsRemovedFromInventory { id, count }.into())
    }

    pub fn deactivate(&mut self) -> Result<()> {
        if !self.activated {
            return Err(CqrsError::validation(self.id(), "already deactivated"));
        }

        let id = self.id();
        self.apply_new(InventoryItemDeactivated { id }.into())
    }

    fn on_created(&mut self, event: &InventoryItemCreated) {
        self.name = event.name.clone();
        self.activated = true;
    }

    fn on_renamed(&mut self, event: &InventoryItemRenamed) {
        self.name = event.new_name.clone();
    }

    fn on_checked_in(&mut self, event: &ItemsCheckedInToInventory) {
        // Saturates on streams written without the overflow check.
        self.count = self.count.saturating_add(event.count);
    }

    fn on_removed(&mut self, event: &ItemsRemovedFromInventory) {
        self.count = self.count.saturating_sub(event.count);
    }

    fn on_deactivated(&mut self, _event: &InventoryItemDeactivated) {
        self.activated = false;
    }
}

impl Aggregate for InventoryItem {
    const AGGREGATE_TYPE: &'static str = "InventoryItem";
    type Event = InventoryEvent;

    fn blank(id: Uuid) -> Self {
        Self {
            root: AggregateRoot::new(id),
            name: String::new(),
            count: 0,
            activated: false,
        }
    }

    fn root(&self) -> &AggregateRoot<InventoryEvent> {
        &self.root
    }

    fn root_mut(&mut self) -> &mut AggregateRoot<InventoryEvent> {
        &mut self.root
    }

    fn transitions() -> &'static Transitions<Self> {
        &TRANSITIONS
    }
}
