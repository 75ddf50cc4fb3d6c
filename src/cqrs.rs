use tracing::debug;

use crate::{
    Aggregate, AggregateStore, Command, CreateCommand, EventLog, EventPublisher, Result, Uuid,
};

/// Runs commands against the aggregates of an [`AggregateStore`].
///
/// Every handled command is saved as its own commit, with a fresh commit ID.
pub struct Cqrs<L, P> {
    store: AggregateStore<L, P>,
}

impl<L, P> Cqrs<L, P>
where
    L: EventLog,
    P: EventPublisher,
{
    pub fn new(store: AggregateStore<L, P>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AggregateStore<L, P> {
        &self.store
    }

    /// Creates a new aggregate and saves its first events.
    pub async fn create<C>(&self, command: &C) -> Result<C::Aggregate>
    where
        C: CreateCommand,
    {
        let mut aggregate = command.create()?;
        debug!(
            aggregate_type = <C::Aggregate as Aggregate>::AGGREGATE_TYPE,
            aggregate_id = %aggregate.id(),
            "creating aggregate"
        );

        self.store
            .save(&mut aggregate, Uuid::new_v4(), |_| {})
            .await?;
        Ok(aggregate)
    }

    /// Loads the target aggregate, handles the command and saves the outcome.
    pub async fn execute<C>(&self, command: &C) -> Result<C::Aggregate>
    where
        C: Command,
    {
        let mut aggregate = self
            .store
            .load::<C::Aggregate>(command.aggregate_id())
            .await?;

        command.handle(&mut aggregate)?;

        self.store
            .save(&mut aggregate, Uuid::new_v4(), |_| {})
            .await?;
        Ok(aggregate)
    }
}
