//! Command implementations behind the `tax-estimator` binary.
//!
//! Everything here writes to a caller-supplied writer so the commands can be
//! driven from tests as well as from `main`.

use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tax_core::{CalculationInput, CalculationResult, RegimeTable, ResolvedFrom, TaxEstimator};
use tax_data::RegimeTableLoader;
use tracing::{debug, info};

use crate::config::DisplayConfig;
use crate::format::{format_currency, format_percentage};
use crate::logging;
use crate::session::{Command, CommandError, Session};

const HELP: &str = "\
Commands:
  income <amount>       set gross income
  deductions <amount>   set deductions (used by itemized regimes only)
  regime <code>         set the regime, e.g. new, old, single, married_joint
  year <year>           set the tax year, e.g. 2025 or 2025-26
  show                  print the current estimate
  reset                 clear all fields
  log <filter>          change logging, e.g. debug or tax_core=trace
  help                  print this help
  quit                  leave the session
";

/// Loads the regime table from `dir`, or the built-in table when `None`.
pub fn load_table(dir: Option<&Path>) -> Result<RegimeTable> {
    let table = match dir {
        Some(dir) => RegimeTableLoader::load_dir(dir)
            .with_context(|| format!("Failed to load regime table from: {}", dir.display()))?,
        None => RegimeTableLoader::builtin().context("Built-in regime table is invalid")?,
    };
    debug!(configs = table.len(), default = %table.default_key(), "regime table ready");
    Ok(table)
}

fn source_label(source: ResolvedFrom) -> &'static str {
    match source {
        ResolvedFrom::Exact => "exact match",
        ResolvedFrom::NearestYear => "nearest configured year",
        ResolvedFrom::LatestYear => "latest configured year",
        ResolvedFrom::GlobalDefault => "default regime",
    }
}

/// Renders a result as an aligned, human-readable report.
pub fn render_report(
    result: &CalculationResult,
    display: &DisplayConfig,
) -> String {
    let money = |amount| format_currency(amount, display);
    let rows = [
        ("Gross income", money(result.gross_income)),
        ("Standard deduction", money(result.standard_deduction)),
        ("Other deductions", money(result.other_deductions)),
        ("Taxable income", money(result.taxable_income)),
        ("Base tax", money(result.base_tax)),
        ("Rebate", money(result.rebate_applied)),
        ("Cess", money(result.cess_amount)),
        ("Total tax", money(result.total_tax)),
        ("Effective rate", format_percentage(result.effective_rate)),
        ("Marginal rate", format_percentage(result.marginal_rate)),
        ("After-tax income", money(result.after_tax_income)),
    ];

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<20}{} ({}), {} [{}]",
        "Regime",
        result.resolved.regime.label(),
        result.resolved.regime,
        result.resolved.tax_year,
        source_label(result.source)
    );
    for (label, value) in rows {
        let _ = writeln!(out, "{label:<20}{value:>16}");
    }
    out
}

/// Renders a result as pretty-printed JSON.
pub fn render_json(result: &CalculationResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to serialize result")
}

/// Computes a single estimate from raw argument text.
pub fn estimate(
    table: &RegimeTable,
    income: &str,
    deductions: &str,
    regime: &str,
    tax_year: &str,
) -> CalculationResult {
    let input = CalculationInput::from_raw(income, deductions, regime, tax_year);
    let result = TaxEstimator::new(table).compute(&input);
    info!(
        resolved = %result.resolved,
        total_tax = %result.total_tax,
        "estimate computed"
    );
    result
}

/// Lists every configured regime and year, marking the default with `*`.
pub fn render_regimes(
    table: &RegimeTable,
    display: &DisplayConfig,
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<20} {:<6} {:<9} {:>14}  {:<28} {:>7}",
        "REGIME", "YEAR", "POLICY", "STD DEDUCTION", "REBATE", "CESS"
    );

    for config in table.configs() {
        let marker = if config.key() == table.default_key() {
            '*'
        } else {
            ' '
        };
        let rebate = config.rebate.as_ref().map_or_else(
            || "-".to_string(),
            |rule| {
                format!(
                    "{} up to {}",
                    format_currency(rule.rebate_cap, display),
                    format_currency(rule.income_threshold, display)
                )
            },
        );
        let _ = writeln!(
            out,
            "{marker} {:<20} {:<6} {:<9} {:>14}  {:<28} {:>7}",
            config.regime.as_str(),
            config.tax_year.to_string(),
            config.deduction_policy.as_str(),
            format_currency(config.standard_deduction, display),
            rebate,
            format_percentage(config.cess_rate * Decimal::ONE_HUNDRED),
        );
    }
    out
}

/// Runs a line-oriented session until `quit` or end of input.
pub fn run_interactive<R: BufRead, W: Write>(
    session: &mut Session<'_>,
    display: &DisplayConfig,
    input: R,
    mut out: W,
) -> Result<()> {
    writeln!(out, "Tax estimator. Type 'help' for commands.")?;

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(CommandError::Empty) => continue,
            Err(e) => {
                writeln!(out, "error: {e}")?;
                continue;
            }
        };

        match command {
            Command::Set(field, value) => {
                let rendered = session.set(field, &value).map(|r| render_report(r, display));
                write_estimate(&mut out, rendered.as_deref())?;
            }
            Command::Show => {
                let rendered = session.latest().map(|r| render_report(r, display));
                write_estimate(&mut out, rendered.as_deref())?;
            }
            Command::Log(filter) => match logging::set_log_level(&filter) {
                Ok(()) => writeln!(out, "Log filter set to '{filter}'.")?,
                Err(e) => writeln!(out, "error: {e}")?,
            },
            Command::Reset => {
                session.reset();
                writeln!(out, "Cleared.")?;
            }
            Command::Help => write!(out, "{HELP}")?,
            Command::Quit => break,
        }
    }

    out.flush()?;
    Ok(())
}

fn write_estimate<W: Write>(
    out: &mut W,
    report: Option<&str>,
) -> Result<()> {
    match report {
        Some(report) => write!(out, "{report}")?,
        None => writeln!(out, "Enter a positive income to see an estimate.")?,
    }
    Ok(())
}
