//! Rounding and clamping shared by the estimator and its callers.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps a value at zero from below.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::non_negative;
///
/// assert_eq!(non_negative(dec!(-10)), dec!(0));
/// assert_eq!(non_negative(dec!(10)), dec!(10));
/// ```
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Expresses `part` as a percentage of `whole`, rounded to two places.
///
/// Returns zero when either side is not positive. Divides before scaling so
/// that very large amounts cannot overflow.
pub fn percent_of(
    part: Decimal,
    whole: Decimal,
) -> Decimal {
    if part <= Decimal::ZERO || whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(round_half_up)
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // round_half_up tests
    // =========================================================================

    #[test]
    fn round_half_up_rounds_down_below_midpoint() {
        assert_eq!(round_half_up(dec!(650.004)), dec!(650.00));
    }

    #[test]
    fn round_half_up_rounds_up_at_midpoint() {
        assert_eq!(round_half_up(dec!(16250.005)), dec!(16250.01));
    }

    #[test]
    fn round_half_up_preserves_whole_amounts() {
        assert_eq!(round_half_up(dec!(22500)), dec!(22500));
    }

    #[test]
    fn round_half_up_handles_large_values() {
        assert_eq!(round_half_up(dec!(999999.999)), dec!(1000000.00));
    }

    // =========================================================================
    // non_negative tests
    // =========================================================================

    #[test]
    fn non_negative_clamps_negative_to_zero() {
        assert_eq!(non_negative(dec!(-0.01)), dec!(0));
    }

    #[test]
    fn non_negative_keeps_zero_and_positive() {
        assert_eq!(non_negative(dec!(0)), dec!(0));
        assert_eq!(non_negative(dec!(825000)), dec!(825000));
    }

    // =========================================================================
    // percent_of tests
    // =========================================================================

    #[test]
    fn percent_of_rounds_to_two_places() {
        assert_eq!(percent_of(dec!(23400), dec!(900000)), dec!(2.60));
        assert_eq!(percent_of(dec!(1), dec!(3)), dec!(33.33));
    }

    #[test]
    fn percent_of_is_zero_for_non_positive_inputs() {
        assert_eq!(percent_of(dec!(0), dec!(900000)), dec!(0));
        assert_eq!(percent_of(dec!(100), dec!(0)), dec!(0));
        assert_eq!(percent_of(dec!(-5), dec!(100)), dec!(0));
    }

    #[test]
    fn percent_of_handles_extreme_magnitudes() {
        let huge = Decimal::MAX;

        assert_eq!(percent_of(huge, huge), dec!(100));
    }
}
