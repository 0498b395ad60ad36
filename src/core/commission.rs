//! Traditional brokerage commission schedule.
//!
//! Each `(category, product)` pair carries a static commission band and a
//! turnover profile. Under turnover-adjusted pricing the effective annual
//! rate is `(average_brokerage_rate / average_term_years) * turnover_factor`,
//! multiplied by the user's turnover index unless the product's turnover is
//! fixed.

use super::asset::AssetKey;
use super::money::{Money, Percent, apply_rate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Commission band of a product, in percent per year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommissionRate {
    pub min: Percent,
    pub max: Percent,
    pub average: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TurnoverProfile {
    pub average_brokerage_rate: Percent,
    pub average_term_years: Decimal,
    pub turnover_factor: Decimal,
    pub is_fixed_turnover: bool,
}

impl TurnoverProfile {
    /// Effective annual rate for the given turnover index.
    pub fn effective_rate(&self, index: TurnoverIndex) -> Percent {
        if self.average_term_years <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let multiplier = if self.is_fixed_turnover {
            Decimal::ONE
        } else {
            Decimal::from(index.get())
        };
        self.average_brokerage_rate / self.average_term_years * self.turnover_factor * multiplier
    }
}

/// How often a portfolio is rebalanced, from 1 (rarely) to 4 (very often).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(from = "i64", into = "u8")]
pub struct TurnoverIndex(u8);

impl TurnoverIndex {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 4;

    /// Clamps `value` into `[MIN, MAX]`.
    pub fn new(value: i64) -> Self {
        let clamped = value.clamp(Self::MIN as i64, Self::MAX as i64);
        if clamped != value {
            warn!(value, clamped, "Turnover index out of range, clamped");
        }
        TurnoverIndex(clamped as u8)
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for TurnoverIndex {
    fn default() -> Self {
        TurnoverIndex(2)
    }
}

impl From<i64> for TurnoverIndex {
    fn from(value: i64) -> Self {
        TurnoverIndex::new(value)
    }
}

impl From<TurnoverIndex> for u8 {
    fn from(index: TurnoverIndex) -> Self {
        index.0
    }
}

impl Display for TurnoverIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which rate the traditional model charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// The static average of the commission band.
    Static,
    /// The turnover profile formula, scaled by the turnover index.
    #[default]
    TurnoverAdjusted,
}

/// Amount allocated to a product, as consumed by the fee calculations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Allocation {
    #[serde(flatten)]
    pub asset: AssetKey,
    pub value: Money,
}

impl Allocation {
    pub fn new(category: &str, product: &str, value: Money) -> Self {
        Allocation {
            asset: AssetKey::new(category, product),
            value,
        }
    }
}

/// Annual commission attributed to one allocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemCommission {
    pub asset: AssetKey,
    pub value: Money,
    /// `None` when the product is not in the table.
    pub effective_rate: Option<Percent>,
    pub annual_cost: Money,
    /// Cost at the band's `(min, max)` rates, when the product is known.
    pub cost_range: Option<(Money, Money)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommissionResult {
    pub total: Money,
    pub per_item: Vec<ItemCommission>,
}

/// Pricing data of a single product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPricing {
    pub asset: AssetKey,
    pub rate: CommissionRate,
    pub turnover: TurnoverProfile,
}

impl ProductPricing {
    pub fn rate_for(&self, index: TurnoverIndex, mode: PricingMode) -> Percent {
        match mode {
            PricingMode::Static => self.rate.average,
            PricingMode::TurnoverAdjusted => self.turnover.effective_rate(index),
        }
    }
}

/// Static lookup table of product pricing.
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionTable {
    products: Vec<ProductPricing>,
}

fn product(
    category: &str,
    name: &str,
    (min, max, average): (Decimal, Decimal, Decimal),
    (brokerage, term, factor, fixed): (Decimal, Decimal, Decimal, bool),
) -> ProductPricing {
    ProductPricing {
        asset: AssetKey::new(category, name),
        rate: CommissionRate { min, max, average },
        turnover: TurnoverProfile {
            average_brokerage_rate: brokerage,
            average_term_years: term,
            turnover_factor: factor,
            is_fixed_turnover: fixed,
        },
    }
}

impl Default for CommissionTable {
    fn default() -> Self {
        let bank_credit = (dec!(0.5), dec!(1.5), dec!(1.0));
        let bank_credit_turnover = (dec!(2.0), dec!(2), dec!(1.0), false);
        let structured_credit = (dec!(1.0), dec!(2.5), dec!(1.75));
        let structured_credit_turnover = (dec!(3.5), dec!(2), dec!(1.0), false);
        let exchange_traded = (dec!(0.3), dec!(1.0), dec!(0.65));
        let exchange_traded_turnover = (dec!(0.5), dec!(1), dec!(1.3), false);
        let active_fund = (dec!(1.5), dec!(2.5), dec!(2.0));
        let active_fund_turnover = (dec!(2.0), dec!(1), dec!(1.0), true);
        let pension = (dec!(1.0), dec!(2.0), dec!(1.5));
        let pension_turnover = (dec!(1.5), dec!(1), dec!(1.0), true);
        let offshore = (dec!(0.5), dec!(1.5), dec!(1.0));
        let offshore_turnover = (dec!(1.0), dec!(1), dec!(1.0), false);

        CommissionTable {
            products: vec![
                product("Renda Fixa", "CDB", bank_credit, bank_credit_turnover),
                product("Renda Fixa", "LCI", bank_credit, bank_credit_turnover),
                product("Renda Fixa", "LCA", bank_credit, bank_credit_turnover),
                product("Renda Fixa", "CRI", structured_credit, structured_credit_turnover),
                product("Renda Fixa", "CRA", structured_credit, structured_credit_turnover),
                product("Renda Fixa", "Debêntures", structured_credit, structured_credit_turnover),
                product(
                    "Renda Fixa",
                    "Tesouro Direto",
                    (dec!(0.0), dec!(0.5), dec!(0.25)),
                    (dec!(0.25), dec!(1), dec!(1.0), true),
                ),
                product("Fundo de Investimento", "Ações", active_fund, active_fund_turnover),
                product("Fundo de Investimento", "Multimercado", active_fund, active_fund_turnover),
                product(
                    "Fundo de Investimento",
                    "Renda Fixa",
                    (dec!(0.5), dec!(1.5), dec!(1.0)),
                    (dec!(1.0), dec!(1), dec!(1.0), true),
                ),
                product(
                    "Fundo de Investimento",
                    "Liquidez",
                    (dec!(0.2), dec!(1.0), dec!(0.6)),
                    (dec!(0.6), dec!(1), dec!(1.0), true),
                ),
                product("Renda Variável", "Ações", exchange_traded, exchange_traded_turnover),
                product("Renda Variável", "ETF", exchange_traded, exchange_traded_turnover),
                product("Renda Variável", "FII", exchange_traded, exchange_traded_turnover),
                product(
                    "Renda Variável",
                    "Estruturada",
                    (dec!(1.0), dec!(3.0), dec!(2.0)),
                    (dec!(2.0), dec!(1), dec!(1.0), false),
                ),
                product("Internacional", "ETF", offshore, offshore_turnover),
                product("Internacional", "Stocks", offshore, offshore_turnover),
                product(
                    "Internacional",
                    "Bonds",
                    (dec!(0.5), dec!(2.0), dec!(1.25)),
                    (dec!(2.5), dec!(2), dec!(1.0), false),
                ),
                product("Internacional", "Fundos", active_fund, active_fund_turnover),
                product(
                    "COE",
                    "COE",
                    (dec!(3.0), dec!(5.0), dec!(4.0)),
                    (dec!(20.0), dec!(5), dec!(1.0), true),
                ),
                product("Previdência", "PGBL", pension, pension_turnover),
                product("Previdência", "VGBL", pension, pension_turnover),
                product(
                    "Outros",
                    "Poupança",
                    (dec!(0), dec!(0), dec!(0)),
                    (dec!(0), dec!(1), dec!(1.0), true),
                ),
                product(
                    "Outros",
                    "Operação Compromissada",
                    (dec!(0.2), dec!(0.8), dec!(0.5)),
                    (dec!(0.5), dec!(1), dec!(1.0), false),
                ),
            ],
        }
    }
}

impl CommissionTable {
    pub fn products(&self) -> &[ProductPricing] {
        &self.products
    }

    pub fn lookup(&self, asset: &AssetKey) -> Option<&ProductPricing> {
        self.products.iter().find(|p| p.asset == *asset)
    }

    pub fn rate(&self, asset: &AssetKey) -> Option<&CommissionRate> {
        self.lookup(asset).map(|p| &p.rate)
    }

    pub fn turnover_profile(&self, asset: &AssetKey) -> Option<&TurnoverProfile> {
        self.lookup(asset).map(|p| &p.turnover)
    }

    /// Effective annual rate of a product, or `None` if it is not in the table.
    pub fn effective_rate(
        &self,
        asset: &AssetKey,
        index: TurnoverIndex,
        mode: PricingMode,
    ) -> Option<Percent> {
        self.lookup(asset).map(|p| p.rate_for(index, mode))
    }

    /// Annual commission of every positive allocation. Unknown products cost nothing.
    pub fn compute(
        &self,
        allocations: &[Allocation],
        index: TurnoverIndex,
        mode: PricingMode,
    ) -> CommissionResult {
        let mut per_item = Vec::new();
        let mut total = Decimal::ZERO;

        for allocation in allocations.iter().filter(|a| a.value > Decimal::ZERO) {
            let (effective_rate, annual_cost, cost_range) = match self.lookup(&allocation.asset) {
                Some(pricing) => {
                    let rate = pricing.rate_for(index, mode);
                    let range = (
                        apply_rate(allocation.value, pricing.rate.min),
                        apply_rate(allocation.value, pricing.rate.max),
                    );
                    (Some(rate), apply_rate(allocation.value, rate), Some(range))
                }
                None => {
                    warn!(
                        asset = %allocation.asset,
                        "No commission rate for product, counting it as zero cost"
                    );
                    (None, Decimal::ZERO, None)
                }
            };

            debug!(
                asset = %allocation.asset,
                value = %allocation.value,
                ?effective_rate,
                %annual_cost,
                "Priced commission"
            );
            total += annual_cost;
            per_item.push(ItemCommission {
                asset: allocation.asset.clone(),
                value: allocation.value,
                effective_rate,
                annual_cost,
                cost_range,
            });
        }

        CommissionResult { total, per_item }
    }
}

static DEFAULT_TABLE: LazyLock<CommissionTable> = LazyLock::new(CommissionTable::default);

/// The built-in product table, built once per process.
pub fn default_table() -> &'static CommissionTable {
    &DEFAULT_TABLE
}

/// Traditional commission under the built-in table with turnover-adjusted pricing.
pub fn compute_traditional_commission(
    allocations: &[Allocation],
    turnover_index: TurnoverIndex,
) -> CommissionResult {
    default_table().compute(allocations, turnover_index, PricingMode::TurnoverAdjusted)
}
