use std::collections::HashMap;

use crate::{Aggregate, CqrsError, DomainEvent, EventVariant, Result};

type Transition<A> = Box<dyn Fn(&mut A, &<A as Aggregate>::Event) + Send + Sync>;

/// The state transitions of one aggregate type, keyed by event variant tag.
///
/// ```rust,ignore
/// static TRANSITIONS: LazyLock<Transitions<InventoryItem>> = LazyLock::new(|| {
///     Transitions::new()
///         .on::<InventoryItemCreated>(InventoryItem::on_created)
///         .on::<InventoryItemRenamed>(InventoryItem::on_renamed)
/// });
/// ```
pub struct Transitions<A: Aggregate> {
    handlers: HashMap<&'static str, Transition<A>>,
}

impl<A: Aggregate> Transitions<A> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registers `apply` as the transition for the variant `V`.
    pub fn on<V>(mut self, apply: fn(&mut A, &V)) -> Self
    where
        V: EventVariant<Event = A::Event>,
    {
        let transition = move |aggregate: &mut A, event: &A::Event| {
            if let Some(variant) = V::peek(event) {
                apply(aggregate, variant);
            }
        };
        self.handlers.insert(V::EVENT_TYPE, Box::new(transition));
        self
    }

    pub(crate) fn dispatch(&self, aggregate: &mut A, event: &A::Event) -> Result<()> {
        let event_type = event.event_type();
        let transition =
            self.handlers
                .get(event_type)
                .ok_or_else(|| CqrsError::UnhandledEventVariant {
                    aggregate_type: A::AGGREGATE_TYPE,
                    event_type: event_type.to_string(),
                })?;

        transition(aggregate, event);
        Ok(())
    }
}

impl<A: Aggregate> Default for Transitions<A> {
    fn default() -> Self {
        Self::new()
    }
}
