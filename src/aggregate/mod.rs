use crate::{DomainEvent, Result, Uuid};

mod transitions;

pub use transitions::Transitions;

/// The `AggregateRoot` struct holds the bookkeeping every aggregate shares: its identity, how many
/// events it has applied, and the events produced since the last save.
///
/// It is embedded in each aggregate and only mutated through the provided methods of
/// [`Aggregate`], so version and buffer can't drift from the applied events.
#[derive(Clone, Debug, PartialEq)]
pub struct AggregateRoot<E> {
    id: Uuid,
    version: u64,
    uncommitted: Vec<E>,
}

impl<E> AggregateRoot<E> {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            uncommitted: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Count of events ever applied, from history and new.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Count of applied events that were already in the stream.
    pub fn committed_version(&self) -> u64 {
        self.version - self.uncommitted.len() as u64
    }

    pub fn uncommitted_events(&self) -> &[E] {
        &self.uncommitted
    }
}

/// The `Aggregate` trait defines the behavior of an aggregate, whose state is derived exclusively
/// from the ordered events it has applied.
///
/// ## Implementing the `Aggregate` Trait
///
/// An implementation provides:
/// - `AGGREGATE_TYPE`, the stable tag stored with every record;
/// - `blank`, the factory the store uses to get an empty replay target;
/// - access to its embedded [`AggregateRoot`];
/// - `transitions`, the table mapping each event variant to the function that mutates state.
///   Build it once, usually in a `LazyLock` static.
///
/// Public operations validate against current state and call [`apply_new`](Aggregate::apply_new)
/// with the resulting event. State fields must not be written anywhere else.
pub trait Aggregate: Send + Sync + Sized + 'static {
    /// Identifies this aggregate type in record metadata and stream names.
    const AGGREGATE_TYPE: &'static str;

    /// The closed set of events this aggregate produces and applies.
    type Event: DomainEvent;

    /// Builds an instance with no events applied.
    fn blank(id: Uuid) -> Self;

    fn root(&self) -> &AggregateRoot<Self::Event>;

    fn root_mut(&mut self) -> &mut AggregateRoot<Self::Event>;

    fn transitions() -> &'static Transitions<Self>;

    fn id(&self) -> Uuid {
        self.root().id()
    }

    fn version(&self) -> u64 {
        self.root().version()
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        self.root().uncommitted_events()
    }

    /// Applies an event the aggregate itself produced and buffers it until the next save.
    fn apply_new(&mut self, event: Self::Event) -> Result<()> {
        Self::transitions().dispatch(self, &event)?;

        let root = self.root_mut();
        root.version += 1;
        root.uncommitted.push(event);
        Ok(())
    }

    /// Applies an event read back from the stream.
    fn apply_history(&mut self, event: &Self::Event) -> Result<()> {
        Self::transitions().dispatch(self, event)?;

        self.root_mut().version += 1;
        Ok(())
    }

    /// Takes the events produced since the last save, leaving the buffer empty.
    fn drain_uncommitted(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.root_mut().uncommitted)
    }
}
