//! Fee and allocation calculations, free of any presentation concerns

pub mod allocation;
pub mod asset;
pub mod commission;
pub mod comparison;
pub mod config;
pub mod events;
pub mod log;
pub mod money;
pub mod store;
pub mod tiers;

// Re-export main types for cleaner imports
pub use allocation::{AllocationItem, AllocationUpdate, PortfolioState, rebalance_proportionally};
pub use asset::AssetKey;
pub use commission::{
    Allocation, CommissionResult, CommissionTable, PricingMode, TurnoverIndex,
    compute_traditional_commission, default_table,
};
pub use comparison::{ComparisonResult, FeeCalculator, compare_models, default_calculator};
pub use events::{EventBus, StoreEvent, Topic};
pub use money::{Money, Percent};
pub use store::CalculatorStore;
pub use tiers::{FeeResult, FeeSchedule, compute_flat_advisory_fee, default_schedule};
