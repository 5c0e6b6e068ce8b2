//! Common numeric helpers shared by every calculation.
//!
//! The legacy workbook rounds with Excel's `ROUND`, which sends halves away
//! from zero. Every currency and percentage figure produced by this crate goes
//! through [`round_half_away`]; banker's rounding diverges on exact halves and
//! breaks cell-for-cell parity.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use tracing::warn;

/// Largest basis, area or count the allocators accept: one trillion.
///
/// Every product and sum the residential and commercial models form from
/// values in `[0, MAX_INPUT_AMOUNT]` stays inside `Decimal`'s range.
pub const MAX_INPUT_AMOUNT: Decimal = dec!(1000000000000);

/// Rounds `value` to `digits` decimal places, sending halves away from zero.
///
/// Negative `digits` round to the left of the decimal point, as Excel's
/// `ROUND(x, -2)` does.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use costseg_core::calculations::common::round_half_away;
///
/// assert_eq!(round_half_away(dec!(0.5), 0), dec!(1));
/// assert_eq!(round_half_away(dec!(-0.5), 0), dec!(-1));
/// assert_eq!(round_half_away(dec!(2.5), 0), dec!(3));
/// assert_eq!(round_half_away(dec!(69.5213), 2), dec!(69.52));
/// assert_eq!(round_half_away(dec!(1250), -2), dec!(1300));
/// ```
pub fn round_half_away(
    value: Decimal,
    digits: i32,
) -> Decimal {
    if digits >= 0 {
        return value.round_dp_with_strategy(digits as u32, RoundingStrategy::MidpointAwayFromZero);
    }

    // Beyond 10^18 nothing representable survives the rounding.
    let Some(factor) = 10i64.checked_pow(digits.unsigned_abs()).map(Decimal::from) else {
        return Decimal::ZERO;
    };
    (value / factor).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero) * factor
}

/// Rounds a currency amount to whole dollars.
pub fn whole_dollars(value: Decimal) -> Decimal {
    round_half_away(value, 0)
}

/// Rounds a fraction to a percentage with two decimal places (`0.69521` → `69.52`).
pub fn percent(fraction: Decimal) -> Decimal {
    round_half_away(fraction * Decimal::ONE_HUNDRED, 2)
}

/// Clamps a fraction into `[0, 1]`.
///
/// Non-numeric request values never reach this function; see
/// [`FieldValue::as_fraction`](crate::models::FieldValue::as_fraction), which
/// maps them to zero first.
pub fn clamp_fraction(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}

/// Returns `value` when it lies in `[0, MAX_INPUT_AMOUNT]`, otherwise zero.
///
/// Out-of-range amounts are malformed input and degrade the same way a
/// non-numeric value does.
pub fn bounded_amount(
    field: &str,
    value: Decimal,
) -> Decimal {
    if value < Decimal::ZERO || value > MAX_INPUT_AMOUNT {
        warn!(field, %value, max = %MAX_INPUT_AMOUNT, "amount out of range, treating as 0");
        Decimal::ZERO
    } else {
        value
    }
}
