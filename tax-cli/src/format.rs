//! Presentation of amounts and rates.

use rust_decimal::{Decimal, RoundingStrategy};
use tax_core::calculations::common::round_half_up;

use crate::config::{DisplayConfig, Grouping};

/// Formats a currency amount with no fraction digits.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_cli::config::{DisplayConfig, Grouping};
/// use tax_cli::format::format_currency;
///
/// let western = DisplayConfig::default();
/// assert_eq!(format_currency(dec!(1234567.5), &western), "$1,234,568");
///
/// let indian = DisplayConfig { currency_symbol: "₹".into(), grouping: Grouping::Indian };
/// assert_eq!(format_currency(dec!(1234567), &indian), "₹12,34,567");
/// ```
pub fn format_currency(
    amount: Decimal,
    display: &DisplayConfig,
) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = rounded.abs().trunc().to_string();
    let grouped = match display.grouping {
        Grouping::Western => group_western(&digits),
        Grouping::Indian => group_indian(&digits),
    };
    format!("{sign}{}{grouped}", display.currency_symbol)
}

/// Formats a percentage value (12.5 means 12.5%) with two decimals.
pub fn format_percentage(rate: Decimal) -> String {
    format!("{:.2}%", round_half_up(rate))
}

fn group_western(digits: &str) -> String {
    group_from_right(digits, 3, 3)
}

fn group_indian(digits: &str) -> String {
    group_from_right(digits, 3, 2)
}

/// Inserts commas: the rightmost group has `first` digits, the rest `rest`.
fn group_from_right(
    digits: &str,
    first: usize,
    rest: usize,
) -> String {
    if digits.len() <= first {
        return digits.to_string();
    }

    let (head, tail) = digits.split_at(digits.len() - first);
    let mut groups = vec![tail];
    let mut remaining = head;
    while remaining.len() > rest {
        let (h, t) = remaining.split_at(remaining.len() - rest);
        groups.push(t);
        remaining = h;
    }
    groups.push(remaining);
    groups.reverse();
    groups.join(",")
}
