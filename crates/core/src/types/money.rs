//! Money arithmetic with exact decimal semantics.
//!
//! All monetary values in the platform are [`rust_decimal::Decimal`], never
//! binary floats. Intermediate amounts (line totals, subtotals, raw
//! discounts) stay unrounded; only a final presented amount goes through
//! [`quantize`]. Serialization at persistence and API boundaries uses
//! decimal strings (`rust_decimal::serde::str`).

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits in a presented monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to 2 fractional digits, half-up.
///
/// Half-up means 0.005 rounds to 0.01 (away from zero), not banker's
/// rounding. Idempotent: `quantize(quantize(x)) == quantize(x)`.
#[must_use]
pub fn quantize(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // round_dp leaves lower-scale values untouched; pad so 5 becomes 5.00.
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Compute `percent` percent of `amount`, unrounded.
///
/// Used for coupon discounts: the caller subtracts the result from the
/// subtotal and quantizes the final figure, so no rounding error
/// accumulates across steps.
#[must_use]
pub fn percentage(amount: Decimal, percent: u8) -> Decimal {
    amount * Decimal::from(percent) / Decimal::ONE_HUNDRED
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_quantize_rounds_half_up() {
        assert_eq!(quantize(d("0.005")), d("0.01"));
        assert_eq!(quantize(d("0.004")), d("0.00"));
        assert_eq!(quantize(d("40.482")), d("40.48"));
        assert_eq!(quantize(d("2.675")), d("2.68"));
    }

    #[test]
    fn test_quantize_is_idempotent() {
        let once = quantize(d("19.995"));
        assert_eq!(quantize(once), once);
        assert_eq!(once, d("20.00"));
    }

    #[test]
    fn test_quantize_always_two_digits() {
        assert_eq!(quantize(d("5")).scale(), MONEY_SCALE);
        assert_eq!(quantize(d("5.1")).scale(), MONEY_SCALE);
        assert_eq!(quantize(d("5.129")).scale(), MONEY_SCALE);
    }

    #[test]
    fn test_percentage_is_unrounded() {
        // 10% of 44.98 is 4.498 - the raw value is kept so the final
        // subtraction rounds once, to 40.48.
        let subtotal = d("44.98");
        let discount = percentage(subtotal, 10);
        assert_eq!(discount, d("4.498"));
        assert_eq!(quantize(subtotal - discount), d("40.48"));
    }

    #[test]
    fn test_percentage_zero_and_full() {
        assert_eq!(percentage(d("13.37"), 0), Decimal::ZERO);
        assert_eq!(percentage(d("13.37"), 100), d("13.37"));
    }
}
