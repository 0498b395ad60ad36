//! Flat-advisory versus traditional commission comparison.
use super::commission::{
    Allocation, CommissionResult, CommissionTable, PricingMode, TurnoverIndex,
};
use super::money::{Money, Percent, percentage_of};
use super::tiers::{FeeResult, FeeSchedule};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub traditional: Money,
    pub reino: Money,
    /// `traditional - reino`; negative when the flat-advisory model costs more.
    pub savings: Money,
    pub savings_percent: Percent,
    pub tier_label: String,
    pub commission: CommissionResult,
}

/// Both pricing models and the tables they read from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeeCalculator {
    pub schedule: FeeSchedule,
    pub commissions: CommissionTable,
    pub mode: PricingMode,
}

impl FeeCalculator {
    pub fn new(schedule: FeeSchedule, commissions: CommissionTable, mode: PricingMode) -> Self {
        FeeCalculator {
            schedule,
            commissions,
            mode,
        }
    }

    pub fn flat_advisory_fee(&self, principal: Money) -> FeeResult {
        self.schedule.compute(principal)
    }

    pub fn traditional_commission(
        &self,
        allocations: &[Allocation],
        turnover_index: TurnoverIndex,
    ) -> CommissionResult {
        self.commissions.compute(allocations, turnover_index, self.mode)
    }

    pub fn compare(
        &self,
        principal: Money,
        allocations: &[Allocation],
        turnover_index: TurnoverIndex,
    ) -> ComparisonResult {
        let advisory = self.flat_advisory_fee(principal);
        let commission = self.traditional_commission(allocations, turnover_index);
        let traditional = commission.total;
        let savings = traditional - advisory.annual_fee;
        let savings_percent = if traditional > Decimal::ZERO {
            percentage_of(savings, traditional)
        } else {
            Decimal::ZERO
        };

        debug!(%principal, %traditional, reino = %advisory.annual_fee, %savings, "Compared models");
        ComparisonResult {
            traditional,
            reino: advisory.annual_fee,
            savings,
            savings_percent,
            tier_label: advisory.tier_label,
            commission,
        }
    }
}

static DEFAULT_CALCULATOR: LazyLock<FeeCalculator> = LazyLock::new(FeeCalculator::default);

/// Calculator over the built-in tables, built once per process.
pub fn default_calculator() -> &'static FeeCalculator {
    &DEFAULT_CALCULATOR
}

/// Compares both models under the default tables and turnover-adjusted pricing.
pub fn compare_models(
    principal: Money,
    allocations: &[Allocation],
    turnover_index: TurnoverIndex,
) -> ComparisonResult {
    default_calculator().compare(principal, allocations, turnover_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_calculator_is_shared() {
        assert!(std::ptr::eq(default_calculator(), default_calculator()));
        assert_eq!(*default_calculator(), FeeCalculator::default());
    }

    #[test]
    fn test_compare_reports_savings() {
        let allocations = vec![Allocation::new("Renda Fixa", "CDB", dec!(2000000))];
        let result = compare_models(dec!(2000000), &allocations, TurnoverIndex::new(2));

        // CDB at index 2 costs 2%, flat advisory for 2M is 1%
        assert_eq!(result.traditional, dec!(40000));
        assert_eq!(result.reino, dec!(20000));
        assert_eq!(result.savings, dec!(20000));
        assert_eq!(result.savings_percent, dec!(50));
        assert_eq!(result.tier_label, "1M - 3M");
        assert_eq!(result.commission.per_item.len(), 1);
    }

    #[test]
    fn test_negative_savings_are_kept() {
        let allocations = vec![Allocation::new("Renda Fixa", "Tesouro Direto", dec!(100000))];
        let result = compare_models(dec!(100000), &allocations, TurnoverIndex::new(1));

        assert_eq!(result.traditional, dec!(250));
        assert_eq!(result.reino, dec!(799));
        assert_eq!(result.savings, dec!(-549));
        assert!(result.savings_percent < Decimal::ZERO);
    }

    #[test]
    fn test_zero_traditional_cost_gives_zero_percent() {
        let result = compare_models(dec!(500000), &[], TurnoverIndex::default());
        assert_eq!(result.traditional, Decimal::ZERO);
        assert_eq!(result.reino, dec!(799));
        assert_eq!(result.savings, dec!(-799));
        assert_eq!(result.savings_percent, Decimal::ZERO);
    }

    #[test]
    fn test_static_mode_calculator() {
        let calculator = FeeCalculator::new(
            FeeSchedule::default(),
            CommissionTable::default(),
            PricingMode::Static,
        );
        let allocations = vec![Allocation::new("Renda Fixa", "CDB", dec!(2000000))];
        let result = calculator.compare(dec!(2000000), &allocations, TurnoverIndex::new(4));
        assert_eq!(result.traditional, dec!(20000));
        assert_eq!(result.savings, Decimal::ZERO);
    }
}
