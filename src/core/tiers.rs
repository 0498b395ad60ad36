//! Tiered flat-advisory fee schedule.
//!
//! Below the first threshold the client pays a flat annual fee; above it the
//! fee is a percentage of the whole principal, decreasing band by band.

use super::money::{Money, Percent, apply_rate};
use anyhow::{Result, bail};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

/// Label reported for a principal that cannot be priced.
pub const INVALID_TIER_LABEL: &str = "invalid";

/// How a tier turns a principal into an annual fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierPricing {
    Flat(Money),
    Rate(Percent),
}

impl TierPricing {
    pub fn annual_fee(&self, principal: Money) -> Money {
        match self {
            TierPricing::Flat(fee) => *fee,
            TierPricing::Rate(rate) => apply_rate(principal, *rate),
        }
    }
}

/// One band of the schedule, covering `[min_inclusive, max_exclusive)`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "TierDefinition", into = "TierDefinition")]
pub struct FeeTier {
    pub label: String,
    pub min_inclusive: Money,
    /// `None` for the last, unbounded tier.
    pub max_exclusive: Option<Money>,
    pub pricing: TierPricing,
}

impl FeeTier {
    fn new(label: &str, min: Money, max: Option<Money>, pricing: TierPricing) -> Self {
        FeeTier {
            label: label.to_string(),
            min_inclusive: min,
            max_exclusive: max,
            pricing,
        }
    }

    pub fn contains(&self, principal: Money) -> bool {
        principal >= self.min_inclusive && self.max_exclusive.is_none_or(|max| principal < max)
    }
}

/// Configuration-file shape of a tier: exactly one of `rate` and `flat_fee`.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct TierDefinition {
    label: String,
    min: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rate: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    flat_fee: Option<Money>,
}

impl TryFrom<TierDefinition> for FeeTier {
    type Error = anyhow::Error;

    fn try_from(def: TierDefinition) -> Result<Self> {
        let pricing = match (def.rate, def.flat_fee) {
            (Some(rate), None) => TierPricing::Rate(rate),
            (None, Some(fee)) => TierPricing::Flat(fee),
            (Some(_), Some(_)) => bail!("Tier '{}' sets both rate and flat_fee", def.label),
            (None, None) => bail!("Tier '{}' sets neither rate nor flat_fee", def.label),
        };
        Ok(FeeTier {
            label: def.label,
            min_inclusive: def.min,
            max_exclusive: def.max,
            pricing,
        })
    }
}

impl From<FeeTier> for TierDefinition {
    fn from(tier: FeeTier) -> Self {
        let (rate, flat_fee) = match tier.pricing {
            TierPricing::Rate(rate) => (Some(rate), None),
            TierPricing::Flat(fee) => (None, Some(fee)),
        };
        TierDefinition {
            label: tier.label,
            min: tier.min_inclusive,
            max: tier.max_exclusive,
            rate,
            flat_fee,
        }
    }
}

/// Annual fee under the flat-advisory model and the tier that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeResult {
    pub annual_fee: Money,
    pub tier_label: String,
}

impl FeeResult {
    fn invalid() -> Self {
        FeeResult {
            annual_fee: Decimal::ZERO,
            tier_label: INVALID_TIER_LABEL.to_string(),
        }
    }
}

/// Ordered tiers partitioning `[0, ∞)`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FeeSchedule {
    tiers: Vec<FeeTier>,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        use TierPricing::{Flat, Rate};
        FeeSchedule {
            tiers: vec![
                FeeTier::new("< 1M", dec!(0), Some(dec!(1000000)), Flat(dec!(799))),
                FeeTier::new("1M - 3M", dec!(1000000), Some(dec!(3000000)), Rate(dec!(1.00))),
                FeeTier::new("3M - 5M", dec!(3000000), Some(dec!(5000000)), Rate(dec!(0.80))),
                FeeTier::new("5M - 10M", dec!(5000000), Some(dec!(10000000)), Rate(dec!(0.70))),
                FeeTier::new("10M - 20M", dec!(10000000), Some(dec!(20000000)), Rate(dec!(0.60))),
                FeeTier::new("20M - 50M", dec!(20000000), Some(dec!(50000000)), Rate(dec!(0.50))),
                FeeTier::new("50M+", dec!(50000000), None, Rate(dec!(0.40))),
            ],
        }
    }
}

impl FeeSchedule {
    /// Builds a schedule after checking that the tiers partition `[0, ∞)`.
    pub fn new(tiers: Vec<FeeTier>) -> Result<Self> {
        let schedule = FeeSchedule { tiers };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn tiers(&self) -> &[FeeTier] {
        &self.tiers
    }

    /// Checks contiguity, coverage and the flat-then-percentage layout.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.tiers.first() else {
            bail!("Fee schedule has no tiers");
        };
        if !first.min_inclusive.is_zero() {
            bail!(
                "First tier '{}' must start at 0, starts at {}",
                first.label,
                first.min_inclusive
            );
        }

        let last_index = self.tiers.len() - 1;
        for (i, tier) in self.tiers.iter().enumerate() {
            match tier.pricing {
                TierPricing::Flat(fee) if i == 0 => {
                    if fee.is_sign_negative() {
                        bail!("Tier '{}' has a negative flat fee", tier.label);
                    }
                }
                TierPricing::Flat(_) => {
                    bail!("Only the lowest tier may use a flat fee, '{}' does", tier.label)
                }
                TierPricing::Rate(_) if i == 0 && last_index > 0 => {
                    bail!("Lowest tier '{}' must use a flat fee", tier.label)
                }
                TierPricing::Rate(rate) => {
                    if rate.is_sign_negative() {
                        bail!("Tier '{}' has a negative rate", tier.label);
                    }
                }
            }

            match (tier.max_exclusive, i == last_index) {
                (None, true) => {}
                (None, false) => bail!("Only the last tier may be unbounded, '{}' is", tier.label),
                (Some(_), true) => bail!("Last tier '{}' must be unbounded", tier.label),
                (Some(max), false) => {
                    if max <= tier.min_inclusive {
                        bail!("Tier '{}' is empty: [{}, {})", tier.label, tier.min_inclusive, max);
                    }
                    let next = &self.tiers[i + 1];
                    if next.min_inclusive != max {
                        bail!(
                            "Tier '{}' ends at {} but '{}' starts at {}",
                            tier.label,
                            max,
                            next.label,
                            next.min_inclusive
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Tier covering `principal`, scanning in ascending order.
    pub fn tier_for(&self, principal: Money) -> Option<&FeeTier> {
        self.tiers.iter().find(|tier| tier.contains(principal))
    }

    /// Annual flat-advisory fee for `principal`. Non-positive principals price as invalid.
    pub fn compute(&self, principal: Money) -> FeeResult {
        if principal <= Decimal::ZERO {
            debug!(%principal, "Principal is not positive, no advisory fee");
            return FeeResult::invalid();
        }

        match self.tier_for(principal) {
            Some(tier) => {
                let annual_fee = tier.pricing.annual_fee(principal);
                debug!(%principal, tier = %tier.label, %annual_fee, "Priced flat-advisory fee");
                FeeResult {
                    annual_fee,
                    tier_label: tier.label.clone(),
                }
            }
            None => FeeResult::invalid(),
        }
    }
}

static DEFAULT_SCHEDULE: LazyLock<FeeSchedule> = LazyLock::new(FeeSchedule::default);

/// The built-in schedule, built once per process.
pub fn default_schedule() -> &'static FeeSchedule {
    &DEFAULT_SCHEDULE
}

/// Flat-advisory fee under the default schedule.
pub fn compute_flat_advisory_fee(principal: Money) -> FeeResult {
    default_schedule().compute(principal)
}
