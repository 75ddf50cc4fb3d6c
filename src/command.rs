use crate::{Aggregate, Result, Uuid};

/// The `Command` trait defines a request to change an existing aggregate.
///
/// A command is handled against the aggregate's current state: it validates and calls the
/// aggregate's operations, which record the resulting events. [`Cqrs`](crate::Cqrs) takes care of
/// loading the aggregate before and saving it after.
///
/// ## Example
///
/// ```rust,ignore
/// struct CheckIn {
///     id: Uuid,
///     count: i64,
/// }
///
/// impl Command for CheckIn {
///     type Aggregate = InventoryItem;
///
///     fn aggregate_id(&self) -> Uuid {
///         self.id
///     }
///
///     fn handle(&self, item: &mut InventoryItem) -> Result<()> {
///         item.check_in(self.count)
///     }
/// }
/// ```
pub trait Command: Send + Sync {
    /// The type of aggregate that this command handles.
    type Aggregate: Aggregate;

    /// The ID of the aggregate to load.
    fn aggregate_id(&self) -> Uuid;

    /// Handles the command against the loaded aggregate.
    fn handle(&self, aggregate: &mut Self::Aggregate) -> Result<()>;
}

/// The `CreateCommand` trait defines a request that brings a new aggregate into existence.
pub trait CreateCommand: Send + Sync {
    /// The type of aggregate that this command creates.
    type Aggregate: Aggregate;

    /// Builds the aggregate, with its creation event recorded.
    fn create(&self) -> Result<Self::Aggregate>;
}
