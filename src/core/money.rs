//! Decimal helpers shared by the fee and allocation calculations.
//!
//! Money is kept in major currency units as a [`Decimal`], so repeated
//! percentage calculations never drift the way binary floats do.

use rust_decimal::Decimal;
use tracing::warn;

/// An amount of money in major currency units.
pub type Money = Decimal;

/// A percentage expressed on a 0-100 scale.
pub type Percent = Decimal;

/// Share of `part` in `whole` on a 0-100 scale. Zero when `whole` is not positive.
pub fn percentage_of(part: Money, whole: Money) -> Percent {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part / whole * Decimal::ONE_HUNDRED
}

/// Applies a percentage rate to an amount.
pub fn apply_rate(amount: Money, rate: Percent) -> Money {
    amount * rate / Decimal::ONE_HUNDRED
}

/// Replaces negative amounts with zero, logging what was clamped.
pub fn non_negative(amount: Money, what: &str) -> Money {
    if amount.is_sign_negative() && !amount.is_zero() {
        warn!(%amount, what, "Negative amount clamped to zero");
        return Decimal::ZERO;
    }
    amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(dec!(250), dec!(1000)), dec!(25));
        assert_eq!(percentage_of(dec!(250), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percentage_of(dec!(250), dec!(-10)), Decimal::ZERO);
    }

    #[test]
    fn test_apply_rate() {
        assert_eq!(apply_rate(dec!(2000000), dec!(1.0)), dec!(20000));
        assert_eq!(apply_rate(dec!(1000), dec!(0.65)), dec!(6.5));
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(dec!(-5), "test"), Decimal::ZERO);
        assert_eq!(non_negative(dec!(5), "test"), dec!(5));
        assert_eq!(non_negative(Decimal::ZERO, "test"), Decimal::ZERO);
    }
}
