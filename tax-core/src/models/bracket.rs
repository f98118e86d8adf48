use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A contiguous income range taxed at a single marginal rate.
///
/// `upper_bound` is `None` for the final, unbounded bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bracket {
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
    /// Marginal rate as a fraction (0.05 = 5%).
    pub rate: Decimal,
}

impl Bracket {
    pub fn new(
        lower_bound: Decimal,
        upper_bound: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self {
            lower_bound,
            upper_bound,
            rate,
        }
    }

    /// Width of the bracket, or `None` when unbounded.
    pub fn width(&self) -> Option<Decimal> {
        self.upper_bound.map(|upper| upper - self.lower_bound)
    }

    /// Whether `income` falls in `(lower_bound, upper_bound]`.
    pub fn contains(
        &self,
        income: Decimal,
    ) -> bool {
        income > self.lower_bound && self.upper_bound.is_none_or(|upper| income <= upper)
    }
}
