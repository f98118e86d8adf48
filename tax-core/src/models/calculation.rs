use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Regime, RegimeKey, TaxYear};
use crate::calculations::input::coerce_amount;

/// Input to a single tax estimate.
///
/// Amounts are expected to be non-negative already; [`CalculationInput::from_raw`]
/// performs the coercion from user-entered text. `regime` or `tax_year` set
/// to `None` defers to the table's fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationInput {
    pub gross_income: Decimal,
    pub deductions: Decimal,
    pub regime: Option<Regime>,
    pub tax_year: Option<TaxYear>,
}

impl CalculationInput {
    pub fn new(
        gross_income: Decimal,
        deductions: Decimal,
        regime: Regime,
        tax_year: impl Into<TaxYear>,
    ) -> Self {
        Self {
            gross_income,
            deductions,
            regime: Some(regime),
            tax_year: Some(tax_year.into()),
        }
    }

    /// Builds an input from raw form text.
    ///
    /// Unparseable amounts become zero; an unknown regime or year becomes
    /// `None`.
    pub fn from_raw(
        gross_income: &str,
        deductions: &str,
        regime: &str,
        tax_year: &str,
    ) -> Self {
        Self {
            gross_income: coerce_amount(gross_income),
            deductions: coerce_amount(deductions),
            regime: Regime::parse(regime),
            tax_year: tax_year.parse().ok(),
        }
    }
}

/// How the regime config used for a calculation was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedFrom {
    /// The requested regime and year were configured.
    Exact,
    /// Same regime, closest configured year.
    NearestYear,
    /// Same regime, latest configured year (no year requested).
    LatestYear,
    /// The table's global default.
    GlobalDefault,
}

/// Output of a single tax estimate.
///
/// Amounts are in currency units; `effective_rate` and `marginal_rate` are
/// percentages (12.5 = 12.5%).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub gross_income: Decimal,
    pub standard_deduction: Decimal,
    /// Deductions beyond the standard deduction that were actually applied.
    pub other_deductions: Decimal,
    pub taxable_income: Decimal,
    pub base_tax: Decimal,
    pub rebate_applied: Decimal,
    pub cess_amount: Decimal,
    pub total_tax: Decimal,
    pub effective_rate: Decimal,
    pub marginal_rate: Decimal,
    pub after_tax_income: Decimal,

    /// Regime config the figures were computed with.
    pub resolved: RegimeKey,
    pub source: ResolvedFrom,
}

impl CalculationResult {
    /// A result with every amount zero.
    pub fn empty(
        resolved: RegimeKey,
        source: ResolvedFrom,
    ) -> Self {
        Self {
            gross_income: Decimal::ZERO,
            standard_deduction: Decimal::ZERO,
            other_deductions: Decimal::ZERO,
            taxable_income: Decimal::ZERO,
            base_tax: Decimal::ZERO,
            rebate_applied: Decimal::ZERO,
            cess_amount: Decimal::ZERO,
            total_tax: Decimal::ZERO,
            effective_rate: Decimal::ZERO,
            marginal_rate: Decimal::ZERO,
            after_tax_income: Decimal::ZERO,
            resolved,
            source,
        }
    }
}
