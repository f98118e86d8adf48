//! Progressive income-tax estimate.
//!
//! # Calculation Steps
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Gross income and deductions, already coerced to non-negative amounts |
//! | 2    | Regime config resolved from the table (exact, nearest year, default) |
//! | 3    | Taxable income (gross - standard deduction - other deductions, minimum 0) |
//! | 4    | Base tax (progressive application of the brackets) |
//! | 5    | Rebate (when gross income is at or below the threshold, capped) |
//! | 6    | Cess (rate × tax after rebate) and total tax |
//! | 7    | Effective rate, marginal rate, after-tax income |
//!
//! Flat-deduction regimes skip other deductions in step 3 and report them as
//! zero.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::TaxEstimator;
//! use tax_core::{
//!     Bracket, CalculationInput, DeductionPolicy, RebateRule, Regime, RegimeConfig,
//!     RegimeKey, RegimeTable, TaxYear,
//! };
//!
//! let config = RegimeConfig {
//!     regime: Regime::Old,
//!     tax_year: TaxYear::new(2024),
//!     deduction_policy: DeductionPolicy::Itemized,
//!     standard_deduction: dec!(50000),
//!     brackets: vec![
//!         Bracket::new(dec!(0), Some(dec!(250000)), dec!(0)),
//!         Bracket::new(dec!(250000), Some(dec!(500000)), dec!(0.05)),
//!         Bracket::new(dec!(500000), Some(dec!(1000000)), dec!(0.20)),
//!         Bracket::new(dec!(1000000), None, dec!(0.30)),
//!     ],
//!     rebate: Some(RebateRule {
//!         income_threshold: dec!(500000),
//!         rebate_cap: dec!(12500),
//!     }),
//!     cess_rate: dec!(0.04),
//! };
//! let table = RegimeTable::new(vec![config], RegimeKey::new(Regime::Old, 2024)).unwrap();
//!
//! let estimator = TaxEstimator::new(&table);
//! let input = CalculationInput::new(dec!(600000), dec!(100000), Regime::Old, 2024);
//! let result = estimator.compute(&input);
//!
//! assert_eq!(result.taxable_income, dec!(450000));
//! assert_eq!(result.base_tax, dec!(10000));
//! assert_eq!(result.cess_amount, dec!(400));
//! assert_eq!(result.total_tax, dec!(10400));
//! ```

use rust_decimal::Decimal;
use tracing::trace;

use crate::calculations::common::{non_negative, percent_of, round_half_up};
use crate::models::{
    Bracket, CalculationInput, CalculationResult, DeductionPolicy, RebateRule, RegimeConfig,
};
use crate::table::RegimeTable;

/// Computes tax estimates against a regime table.
///
/// Holds no state besides the borrowed table, so one estimator can serve any
/// number of calculations.
#[derive(Debug, Clone, Copy)]
pub struct TaxEstimator<'a> {
    table: &'a RegimeTable,
}

impl<'a> TaxEstimator<'a> {
    pub fn new(table: &'a RegimeTable) -> Self {
        Self { table }
    }

    /// Computes the full estimate for `input`.
    ///
    /// Never fails. Negative amounts are clamped to zero; an absent or zero
    /// gross income yields an all-zero result tagged with the resolved config.
    pub fn compute(
        &self,
        input: &CalculationInput,
    ) -> CalculationResult {
        let resolution = self.table.resolve(input.regime, input.tax_year);
        let config = resolution.config;

        let gross_income = non_negative(input.gross_income);
        if gross_income.is_zero() {
            return CalculationResult::empty(config.key(), resolution.source);
        }

        let standard_deduction = config.standard_deduction;
        let other_deductions = self.other_deductions(config.deduction_policy, input.deductions);
        let taxable_income =
            self.taxable_income(gross_income, standard_deduction, other_deductions);

        let base_tax = self.base_tax(&config.brackets, taxable_income);
        let rebate_applied = self.rebate(config.rebate.as_ref(), gross_income, base_tax);
        let tax_after_rebate = base_tax - rebate_applied;

        let cess_amount = self.cess(tax_after_rebate, config.cess_rate);
        let total_tax = tax_after_rebate.saturating_add(cess_amount);

        let result = CalculationResult {
            gross_income,
            standard_deduction,
            other_deductions,
            taxable_income,
            base_tax,
            rebate_applied,
            cess_amount,
            total_tax,
            effective_rate: percent_of(total_tax, gross_income),
            marginal_rate: self.marginal_rate(config, taxable_income),
            after_tax_income: gross_income.saturating_sub(total_tax),
            resolved: config.key(),
            source: resolution.source,
        };

        trace!(
            regime = %result.resolved,
            %taxable_income,
            %total_tax,
            "tax estimate computed"
        );

        result
    }

    /// Deductions honoured beyond the standard deduction.
    fn other_deductions(
        &self,
        policy: DeductionPolicy,
        deductions: Decimal,
    ) -> Decimal {
        match policy {
            DeductionPolicy::Flat => Decimal::ZERO,
            DeductionPolicy::Itemized => non_negative(deductions),
        }
    }

    /// Gross income minus all deductions, minimum 0.
    fn taxable_income(
        &self,
        gross_income: Decimal,
        standard_deduction: Decimal,
        other_deductions: Decimal,
    ) -> Decimal {
        non_negative(
            gross_income
                .saturating_sub(standard_deduction)
                .saturating_sub(other_deductions),
        )
    }

    /// Applies the brackets in ascending order to `taxable_income`.
    fn base_tax(
        &self,
        brackets: &[Bracket],
        taxable_income: Decimal,
    ) -> Decimal {
        let mut remaining = taxable_income;
        let mut tax = Decimal::ZERO;

        for bracket in brackets {
            if remaining <= Decimal::ZERO {
                break;
            }
            let taxable_at_bracket = match bracket.width() {
                Some(width) => remaining.min(width),
                None => remaining,
            };
            tax = tax.saturating_add(taxable_at_bracket.saturating_mul(bracket.rate));
            remaining -= taxable_at_bracket;
        }

        round_half_up(tax)
    }

    fn rebate(
        &self,
        rule: Option<&RebateRule>,
        gross_income: Decimal,
        base_tax: Decimal,
    ) -> Decimal {
        rule.map_or(Decimal::ZERO, |rule| rule.rebate_for(gross_income, base_tax))
    }

    fn cess(
        &self,
        tax_after_rebate: Decimal,
        cess_rate: Decimal,
    ) -> Decimal {
        round_half_up(tax_after_rebate.saturating_mul(cess_rate))
    }

    /// Rate of the bracket holding the last unit of taxable income, as a percentage.
    fn marginal_rate(
        &self,
        config: &RegimeConfig,
        taxable_income: Decimal,
    ) -> Decimal {
        config
            .bracket_for(taxable_income)
            .map_or(Decimal::ZERO, |bracket| bracket.rate * Decimal::ONE_HUNDRED)
    }
}
