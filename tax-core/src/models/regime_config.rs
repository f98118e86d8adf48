use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Bracket, DeductionPolicy, Regime, TaxYear};
use crate::table::RegimeTableError;

/// Identifies one entry of the regime table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegimeKey {
    pub regime: Regime,
    pub tax_year: TaxYear,
}

impl RegimeKey {
    pub fn new(
        regime: Regime,
        tax_year: impl Into<TaxYear>,
    ) -> Self {
        Self {
            regime,
            tax_year: tax_year.into(),
        }
    }
}

impl fmt::Display for RegimeKey {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}/{}", self.regime, self.tax_year)
    }
}

/// Full or partial credit granted when gross income is at or below a threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebateRule {
    pub income_threshold: Decimal,
    pub rebate_cap: Decimal,
}

impl RebateRule {
    /// Rebate owed against `base_tax` for the given gross income.
    pub fn rebate_for(
        &self,
        gross_income: Decimal,
        base_tax: Decimal,
    ) -> Decimal {
        if gross_income <= self.income_threshold {
            base_tax.min(self.rebate_cap)
        } else {
            Decimal::ZERO
        }
    }
}

/// Brackets and adjustment rules for one regime in one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeConfig {
    pub regime: Regime,
    pub tax_year: TaxYear,
    pub deduction_policy: DeductionPolicy,
    pub standard_deduction: Decimal,
    /// Ordered ascending; the last bracket is unbounded.
    pub brackets: Vec<Bracket>,
    pub rebate: Option<RebateRule>,
    /// Surcharge on tax after rebate, as a fraction (0.04 = 4%). Zero when the
    /// regime has no cess.
    pub cess_rate: Decimal,
}

impl RegimeConfig {
    pub fn key(&self) -> RegimeKey {
        RegimeKey {
            regime: self.regime,
            tax_year: self.tax_year,
        }
    }

    /// The bracket whose range holds `taxable_income`, if any.
    pub fn bracket_for(
        &self,
        taxable_income: Decimal,
    ) -> Option<&Bracket> {
        self.brackets.iter().find(|b| b.contains(taxable_income))
    }

    /// Checks the bracket partition and the adjustment amounts.
    ///
    /// Brackets must start at zero, be contiguous and ascending, carry rates
    /// in `0..=1` that never decrease, and end with exactly one unbounded
    /// bracket.
    pub fn validate(&self) -> Result<(), RegimeTableError> {
        let key = self.key();

        let Some(first) = self.brackets.first() else {
            return Err(RegimeTableError::NoBrackets(key));
        };
        if !first.lower_bound.is_zero() {
            return Err(RegimeTableError::FirstBracketNotAtZero {
                key,
                found: first.lower_bound,
            });
        }

        let last_index = self.brackets.len() - 1;
        let mut previous: Option<&Bracket> = None;

        for (index, bracket) in self.brackets.iter().enumerate() {
            if bracket.rate < Decimal::ZERO || bracket.rate > Decimal::ONE {
                return Err(RegimeTableError::RateOutOfRange {
                    key,
                    index,
                    rate: bracket.rate,
                });
            }

            if let Some(prev) = previous {
                // Only the last bracket may be unbounded, so prev has an upper bound.
                let expected = prev.upper_bound.unwrap_or(prev.lower_bound);
                if bracket.lower_bound != expected {
                    return Err(RegimeTableError::NonContiguous {
                        key,
                        index,
                        expected,
                        found: bracket.lower_bound,
                    });
                }
                if bracket.rate < prev.rate {
                    return Err(RegimeTableError::DecreasingRate {
                        key,
                        index,
                        rate: bracket.rate,
                        previous: prev.rate,
                    });
                }
            }

            match bracket.upper_bound {
                Some(upper) if index == last_index => {
                    return Err(RegimeTableError::BoundedFinalBracket { key, upper });
                }
                Some(upper) if upper <= bracket.lower_bound => {
                    return Err(RegimeTableError::EmptyBracket {
                        key,
                        index,
                        lower: bracket.lower_bound,
                        upper,
                    });
                }
                None if index != last_index => {
                    return Err(RegimeTableError::UnboundedInnerBracket { key, index });
                }
                _ => {}
            }

            previous = Some(bracket);
        }

        if self.standard_deduction < Decimal::ZERO {
            return Err(RegimeTableError::NegativeAmount {
                key,
                field: "standard_deduction",
            });
        }
        if let Some(rebate) = &self.rebate {
            if rebate.income_threshold < Decimal::ZERO {
                return Err(RegimeTableError::NegativeAmount {
                    key,
                    field: "rebate_threshold",
                });
            }
            if rebate.rebate_cap < Decimal::ZERO {
                return Err(RegimeTableError::NegativeAmount {
                    key,
                    field: "rebate_cap",
                });
            }
        }
        if self.cess_rate < Decimal::ZERO || self.cess_rate > Decimal::ONE {
            return Err(RegimeTableError::CessOutOfRange {
                key,
                rate: self.cess_rate,
            });
        }

        Ok(())
    }
}
