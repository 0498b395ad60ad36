//! Typed publish/subscribe for calculator state changes.
use super::allocation::AllocationUpdate;
use super::asset::AssetKey;
use super::commission::TurnoverIndex;
use super::money::Money;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Principal,
    Allocation,
    Selection,
    Turnover,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    PrincipalChanged {
        previous: Money,
        current: Money,
    },
    Rebalanced {
        ratio: Decimal,
    },
    AllocationChanged {
        asset: AssetKey,
        update: AllocationUpdate,
    },
    AllocationCapped {
        asset: AssetKey,
        requested: Money,
        max_allowed: Money,
    },
    AssetSelected {
        asset: AssetKey,
    },
    AssetDeselected {
        asset: AssetKey,
    },
    AssetRemoved {
        asset: AssetKey,
    },
    TurnoverChanged {
        previous: TurnoverIndex,
        current: TurnoverIndex,
    },
    Reset,
}

impl StoreEvent {
    pub fn topic(&self) -> Topic {
        match self {
            StoreEvent::PrincipalChanged { .. } | StoreEvent::Rebalanced { .. } => Topic::Principal,
            StoreEvent::AllocationChanged { .. } | StoreEvent::AllocationCapped { .. } => {
                Topic::Allocation
            }
            StoreEvent::AssetSelected { .. }
            | StoreEvent::AssetDeselected { .. }
            | StoreEvent::AssetRemoved { .. }
            | StoreEvent::Reset => Topic::Selection,
            StoreEvent::TurnoverChanged { .. } => Topic::Turnover,
        }
    }
}

type Handler = Box<dyn FnMut(&StoreEvent)>;

/// Handlers run synchronously, in subscription order, before `publish` returns.
#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<Topic, Vec<Handler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, topic: Topic, handler: F)
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.handlers
            .entry(topic)
            .or_default()
            .push(Box::new(handler));
    }

    pub fn publish(&mut self, event: &StoreEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.topic()) {
            for handler in handlers.iter_mut() {
                handler(event);
            }
        }
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.handlers.get(&topic).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<_, _> = self
            .handlers
            .iter()
            .map(|(topic, handlers)| (*topic, handlers.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}
