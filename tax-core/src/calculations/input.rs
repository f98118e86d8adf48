//! Coercion of user-entered amounts.
//!
//! The estimator never rejects input: anything that is not a usable,
//! non-negative number becomes zero here, before calculation starts.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use super::common::non_negative;

/// Strips whitespace, thousands separators and a leading currency symbol.
fn normalize_amount_input(s: &str) -> String {
    let trimmed = s.trim();
    let unsigned = trimmed
        .strip_prefix(['$', '₹'])
        .unwrap_or(trimmed);
    unsigned
        .chars()
        .filter(|c| !matches!(c, ',' | '_') && !c.is_whitespace())
        .collect()
}

/// Coerces raw text into a non-negative amount.
///
/// Accepts plain (`1234.56`), grouped (`1,234.56`, `12,34,567`) and
/// scientific (`1.2e6`) notation. Empty, unparseable or out-of-range text
/// yields zero, as do negative values.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::input::coerce_amount;
///
/// assert_eq!(coerce_amount("₹9,00,000"), dec!(900000));
/// assert_eq!(coerce_amount("not a number"), dec!(0));
/// assert_eq!(coerce_amount("-42"), dec!(0));
/// ```
pub fn coerce_amount(s: &str) -> Decimal {
    let normalized = normalize_amount_input(s);
    if normalized.is_empty() {
        return Decimal::ZERO;
    }

    let parsed = normalized
        .parse::<Decimal>()
        .ok()
        .or_else(|| parse_scientific(&normalized));

    match parsed {
        Some(value) => non_negative(value),
        None => {
            tracing::warn!(input = %s, "unusable amount treated as zero");
            Decimal::ZERO
        }
    }
}

/// Parses `<mantissa>e<exponent>`, returning `None` on overflow.
fn parse_scientific(s: &str) -> Option<Decimal> {
    let (mantissa, exponent) = s.split_once(['e', 'E'])?;
    let mantissa: Decimal = mantissa.parse().ok()?;
    let exponent: i32 = exponent.parse().ok()?;

    // Decimal carries at most 28 significant digits either side of the point.
    if exponent.unsigned_abs() > 28 {
        return None;
    }
    let factor = (0..exponent.unsigned_abs())
        .try_fold(Decimal::ONE, |acc, _| acc.checked_mul(Decimal::TEN))?;

    if exponent >= 0 {
        mantissa.checked_mul(factor)
    } else {
        mantissa.checked_div(factor)
    }
}

/// Like [`coerce_amount`], treating a missing value as zero.
pub fn coerce_optional_amount(s: Option<&str>) -> Decimal {
    s.map(coerce_amount).unwrap_or(Decimal::ZERO)
}

/// Coerces a float into a non-negative amount. NaN and infinities yield zero.
pub fn coerce_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value)
        .map(non_negative)
        .unwrap_or(Decimal::ZERO)
}
