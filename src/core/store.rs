//! Calculator state passed explicitly to every computation.
//!
//! The store owns the portfolio, the turnover index and the pricing tables,
//! and announces every mutation on its [`EventBus`].
use super::allocation::{AllocationUpdate, PortfolioState};
use super::asset::AssetKey;
use super::commission::TurnoverIndex;
use super::comparison::{ComparisonResult, FeeCalculator};
use super::events::{EventBus, StoreEvent, Topic};
use super::money::Money;
use tracing::debug;

#[derive(Debug)]
pub struct CalculatorStore {
    state: PortfolioState,
    turnover_index: TurnoverIndex,
    calculator: FeeCalculator,
    bus: EventBus,
}

impl CalculatorStore {
    pub fn new(
        calculator: FeeCalculator,
        total_principal: Money,
        turnover_index: TurnoverIndex,
    ) -> Self {
        CalculatorStore {
            state: PortfolioState::new(total_principal),
            turnover_index,
            calculator,
            bus: EventBus::new(),
        }
    }

    pub fn subscribe<F>(&mut self, topic: Topic, handler: F)
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.bus.subscribe(topic, handler);
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    pub fn turnover_index(&self) -> TurnoverIndex {
        self.turnover_index
    }

    pub fn calculator(&self) -> &FeeCalculator {
        &self.calculator
    }

    pub fn set_total_principal(&mut self, total_principal: Money) {
        let previous = self.state.total_principal();
        let ratio = self.state.set_total_principal(total_principal);
        debug!(%previous, current = %self.state.total_principal(), "Total principal changed");
        self.bus.publish(&StoreEvent::PrincipalChanged {
            previous,
            current: self.state.total_principal(),
        });
        if let Some(ratio) = ratio {
            self.bus.publish(&StoreEvent::Rebalanced { ratio });
        }
    }

    pub fn select(&mut self, asset: AssetKey) -> bool {
        let selected = self.state.select(asset.clone());
        if selected {
            self.bus.publish(&StoreEvent::AssetSelected { asset });
        }
        selected
    }

    pub fn deselect(&mut self, asset: &AssetKey) -> bool {
        let deselected = self.state.deselect(asset);
        if deselected {
            self.bus.publish(&StoreEvent::AssetDeselected {
                asset: asset.clone(),
            });
        }
        deselected
    }

    /// Resets a selected asset to zero, announced as an allocation change.
    pub fn clear(&mut self, asset: &AssetKey) -> bool {
        let cleared = self.state.clear(asset);
        if cleared {
            self.publish_allocation(asset);
        }
        cleared
    }

    pub fn remove(&mut self, asset: &AssetKey) -> bool {
        let removed = self.state.remove(asset).is_some();
        if removed {
            self.bus.publish(&StoreEvent::AssetRemoved {
                asset: asset.clone(),
            });
        }
        removed
    }

    pub fn reset(&mut self) {
        self.state.reset();
        self.bus.publish(&StoreEvent::Reset);
    }

    pub fn set_allocation(&mut self, asset: &AssetKey, requested: Money) -> Option<AllocationUpdate> {
        let update = self.state.set_allocation(asset, requested)?;
        if update.was_capped {
            self.bus.publish(&StoreEvent::AllocationCapped {
                asset: asset.clone(),
                requested,
                max_allowed: update.max_allowed,
            });
        }
        self.bus.publish(&StoreEvent::AllocationChanged {
            asset: asset.clone(),
            update,
        });
        Some(update)
    }

    pub fn set_turnover_index(&mut self, turnover_index: TurnoverIndex) {
        let previous = self.turnover_index;
        if previous == turnover_index {
            return;
        }
        self.turnover_index = turnover_index;
        self.bus.publish(&StoreEvent::TurnoverChanged {
            previous,
            current: turnover_index,
        });
    }

    /// Comparison of both models for the current state.
    pub fn comparison(&self) -> ComparisonResult {
        self.calculator.compare(
            self.state.total_principal(),
            &self.state.allocations(),
            self.turnover_index,
        )
    }

    fn publish_allocation(&mut self, asset: &AssetKey) {
        if let Some(item) = self.state.item(asset) {
            let update = AllocationUpdate {
                capped_value: item.capped_value,
                was_capped: false,
                max_allowed: self.state.remaining() + item.capped_value,
                percentage_of_total: item.percentage_of_total,
            };
            self.bus.publish(&StoreEvent::AllocationChanged {
                asset: asset.clone(),
                update,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store_with_log(total: Money) -> (CalculatorStore, Rc<RefCell<Vec<StoreEvent>>>) {
        let mut store = CalculatorStore::new(FeeCalculator::default(), total, TurnoverIndex::new(2));
        let log = Rc::new(RefCell::new(Vec::new()));
        for topic in [
            Topic::Principal,
            Topic::Allocation,
            Topic::Selection,
            Topic::Turnover,
        ] {
            let log = Rc::clone(&log);
            store.subscribe(topic, move |event| log.borrow_mut().push(event.clone()));
        }
        (store, log)
    }

    #[test]
    fn test_capped_allocation_publishes_notice() {
        let (mut store, log) = store_with_log(dec!(1000000));
        let cdb = AssetKey::new("Renda Fixa", "CDB");
        let lci = AssetKey::new("Renda Fixa", "LCI");
        store.select(cdb.clone());
        store.select(lci.clone());
        store.set_allocation(&cdb, dec!(600000));
        log.borrow_mut().clear();

        let update = store.set_allocation(&lci, dec!(600000)).unwrap();
        assert!(update.was_capped);

        let events = log.borrow();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            StoreEvent::AllocationCapped {
                asset: lci.clone(),
                requested: dec!(600000),
                max_allowed: dec!(400000),
            }
        );
        assert!(matches!(events[1], StoreEvent::AllocationChanged { .. }));
    }

    #[test]
    fn test_shrinking_total_publishes_rebalance() {
        let (mut store, log) = store_with_log(dec!(1000000));
        let cdb = AssetKey::new("Renda Fixa", "CDB");
        store.select(cdb.clone());
        store.set_allocation(&cdb, dec!(1000000));
        log.borrow_mut().clear();

        store.set_total_principal(dec!(250000));

        let events = log.borrow();
        assert_eq!(
            events[0],
            StoreEvent::PrincipalChanged {
                previous: dec!(1000000),
                current: dec!(250000),
            }
        );
        assert_eq!(events[1], StoreEvent::Rebalanced { ratio: dec!(0.25) });
        assert_eq!(store.state().allocated_total(), dec!(250000));
    }

    #[test]
    fn test_turnover_change_affects_comparison() {
        let (mut store, log) = store_with_log(dec!(2000000));
        let cdb = AssetKey::new("Renda Fixa", "CDB");
        store.select(cdb.clone());
        store.set_allocation(&cdb, dec!(2000000));
        assert_eq!(store.comparison().traditional, dec!(40000));

        log.borrow_mut().clear();
        store.set_turnover_index(TurnoverIndex::new(4));
        store.set_turnover_index(TurnoverIndex::new(4));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(store.comparison().traditional, dec!(80000));
        assert_eq!(store.comparison().reino, dec!(20000));
    }

    #[test]
    fn test_selection_lifecycle_events() {
        let (mut store, log) = store_with_log(dec!(1000));
        let cdb = AssetKey::new("Renda Fixa", "CDB");

        assert!(store.select(cdb.clone()));
        assert!(!store.select(cdb.clone()));
        store.set_allocation(&cdb, dec!(300));
        assert!(store.clear(&cdb));
        assert!(store.deselect(&cdb));
        assert!(store.remove(&cdb));
        assert!(!store.remove(&cdb));
        store.reset();

        let topics: Vec<Topic> = log.borrow().iter().map(StoreEvent::topic).collect();
        assert_eq!(
            topics,
            vec![
                Topic::Selection,
                Topic::Allocation,
                Topic::Allocation,
                Topic::Selection,
                Topic::Selection,
                Topic::Selection,
            ]
        );
        assert_eq!(store.state().allocated_total(), Decimal::ZERO);
    }

    #[test]
    fn test_allocation_to_unknown_asset_publishes_nothing() {
        let (mut store, log) = store_with_log(dec!(1000));
        assert!(
            store
                .set_allocation(&AssetKey::new("Renda Fixa", "CDB"), dec!(10))
                .is_none()
        );
        assert!(log.borrow().is_empty());
    }
}
