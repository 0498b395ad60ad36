//! Keeps per-product allocations within the total principal.
//!
//! Editing one item is greedy: it gets whatever the other selected items
//! leave free. Shrinking the total is proportional: every item is scaled by
//! the same ratio so none is zeroed out in favour of another.

use super::asset::AssetKey;
use super::commission::Allocation;
use super::money::{Money, Percent, non_negative, percentage_of};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Unselected,
    Selected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationItem {
    pub asset: AssetKey,
    pub status: ItemStatus,
    /// Last value the user asked for.
    pub requested_value: Money,
    /// Value actually held after capping and rebalancing.
    pub capped_value: Money,
    pub percentage_of_total: Percent,
}

impl AllocationItem {
    fn selected(asset: AssetKey) -> Self {
        AllocationItem {
            asset,
            status: ItemStatus::Selected,
            requested_value: Decimal::ZERO,
            capped_value: Decimal::ZERO,
            percentage_of_total: Decimal::ZERO,
        }
    }

    pub fn is_selected(&self) -> bool {
        self.status == ItemStatus::Selected
    }

    fn zero(&mut self) {
        self.requested_value = Decimal::ZERO;
        self.capped_value = Decimal::ZERO;
        self.percentage_of_total = Decimal::ZERO;
    }
}

/// Outcome of a single allocation edit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AllocationUpdate {
    pub capped_value: Money,
    pub was_capped: bool,
    /// Budget that was available to the edited item.
    pub max_allowed: Money,
    pub percentage_of_total: Percent,
}

/// Sum of the capped values of the selected items.
pub fn allocated_sum(items: &[AllocationItem]) -> Money {
    items
        .iter()
        .filter(|item| item.is_selected())
        .map(|item| item.capped_value)
        .sum()
}

/// Scales every selected item down so the allocations fit `total_principal`.
///
/// Does nothing when nothing is allocated or everything already fits.
/// Returns the ratio applied otherwise.
pub fn rebalance_proportionally(
    items: &mut [AllocationItem],
    total_principal: Money,
) -> Option<Decimal> {
    let total = total_principal.max(Decimal::ZERO);
    let allocated = allocated_sum(items);
    if allocated.is_zero() {
        return None;
    }
    let ratio = total / allocated;
    if ratio >= Decimal::ONE {
        return None;
    }

    for item in items.iter_mut().filter(|item| item.is_selected()) {
        item.capped_value *= ratio;
    }

    // The ratio is rounded at 28 digits, so the scaled sum can land a hair above total.
    let overshoot = allocated_sum(items) - total;
    if overshoot > Decimal::ZERO {
        if let Some(largest) = items
            .iter_mut()
            .filter(|item| item.is_selected())
            .max_by(|a, b| a.capped_value.cmp(&b.capped_value))
        {
            largest.capped_value = (largest.capped_value - overshoot).max(Decimal::ZERO);
        }
    }

    for item in items.iter_mut().filter(|item| item.is_selected()) {
        item.percentage_of_total = percentage_of(item.capped_value, total);
    }
    debug!(%ratio, %total, %allocated, "Rebalanced allocations proportionally");
    Some(ratio)
}

/// Total principal and the allocation items carved out of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioState {
    total_principal: Money,
    items: Vec<AllocationItem>,
}

impl PortfolioState {
    pub fn new(total_principal: Money) -> Self {
        PortfolioState {
            total_principal: non_negative(total_principal, "total principal"),
            items: Vec::new(),
        }
    }

    pub fn total_principal(&self) -> Money {
        self.total_principal
    }

    pub fn items(&self) -> &[AllocationItem] {
        &self.items
    }

    pub fn item(&self, asset: &AssetKey) -> Option<&AllocationItem> {
        self.items.iter().find(|item| item.asset == *asset)
    }

    pub fn allocated_total(&self) -> Money {
        allocated_sum(&self.items)
    }

    pub fn remaining(&self) -> Money {
        (self.total_principal - self.allocated_total()).max(Decimal::ZERO)
    }

    pub fn allocated_percentage(&self) -> Percent {
        percentage_of(self.allocated_total(), self.total_principal)
    }

    /// Selected items as the `(asset, value)` pairs the fee calculations consume.
    pub fn allocations(&self) -> Vec<Allocation> {
        self.items
            .iter()
            .filter(|item| item.is_selected())
            .map(|item| Allocation {
                asset: item.asset.clone(),
                value: item.capped_value,
            })
            .collect()
    }

    /// Changes the total, scaling allocations down if they no longer fit.
    ///
    /// Returns the rebalance ratio when one was applied.
    pub fn set_total_principal(&mut self, total_principal: Money) -> Option<Decimal> {
        self.total_principal = non_negative(total_principal, "total principal");
        let ratio = self.rebalance();
        if ratio.is_none() {
            let total = self.total_principal;
            for item in self.items.iter_mut().filter(|item| item.is_selected()) {
                item.percentage_of_total = percentage_of(item.capped_value, total);
            }
        }
        ratio
    }

    /// Proportional rebalance against the current total.
    pub fn rebalance(&mut self) -> Option<Decimal> {
        rebalance_proportionally(&mut self.items, self.total_principal)
    }

    /// Selects an asset with a zero allocation. Returns false if it already was selected.
    pub fn select(&mut self, asset: AssetKey) -> bool {
        match self.items.iter_mut().find(|item| item.asset == asset) {
            Some(item) if item.is_selected() => false,
            Some(item) => {
                item.status = ItemStatus::Selected;
                item.zero();
                true
            }
            None => {
                self.items.push(AllocationItem::selected(asset));
                true
            }
        }
    }

    /// Marks an asset unselected, releasing its allocation. The item stays in the set.
    pub fn deselect(&mut self, asset: &AssetKey) -> bool {
        match self.items.iter_mut().find(|item| item.asset == *asset) {
            Some(item) if item.is_selected() => {
                item.status = ItemStatus::Unselected;
                item.zero();
                true
            }
            _ => false,
        }
    }

    /// Sets a selected item back to a zero allocation.
    pub fn clear(&mut self, asset: &AssetKey) -> bool {
        match self
            .items
            .iter_mut()
            .find(|item| item.is_selected() && item.asset == *asset)
        {
            Some(item) => {
                item.zero();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, asset: &AssetKey) -> Option<AllocationItem> {
        let index = self.items.iter().position(|item| item.asset == *asset)?;
        Some(self.items.remove(index))
    }

    /// Drops every item, as when the form is reset. The total is kept.
    pub fn reset(&mut self) {
        self.items.clear();
    }

    /// Allocates up to `requested_value` to a selected asset.
    ///
    /// The edited item wins up to whatever the other selected items leave
    /// free; siblings are never touched. Returns `None` if the asset is not
    /// selected.
    pub fn set_allocation(
        &mut self,
        asset: &AssetKey,
        requested_value: Money,
    ) -> Option<AllocationUpdate> {
        let requested = non_negative(requested_value, "requested allocation");
        let total = self.total_principal;
        let others_total: Money = self
            .items
            .iter()
            .filter(|item| item.is_selected() && item.asset != *asset)
            .map(|item| item.capped_value)
            .sum();

        let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.is_selected() && item.asset == *asset)
        else {
            warn!(%asset, "Allocation requested for an asset that is not selected");
            return None;
        };

        let max_allowed = (total - others_total).max(Decimal::ZERO);
        let capped_value = requested.min(max_allowed);
        let was_capped = requested > max_allowed;

        item.requested_value = requested;
        item.capped_value = capped_value;
        item.percentage_of_total = percentage_of(capped_value, total);

        if was_capped {
            debug!(%asset, %requested, %max_allowed, "Allocation capped");
        }
        Some(AllocationUpdate {
            capped_value,
            was_capped,
            max_allowed,
            percentage_of_total: item.percentage_of_total,
        })
    }
}
