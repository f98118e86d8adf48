//! Deployment-time coverage checks for a regime table.

use std::fmt;

use tax_core::{Regime, RegimeKey, RegimeTable, TaxYear};

/// A required entry the table does not configure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingCoverage {
    /// The regime has no config for any year.
    Regime(Regime),
    /// The regime is configured, but not for this year.
    Config(RegimeKey),
}

impl fmt::Display for MissingCoverage {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            MissingCoverage::Regime(regime) => write!(f, "{regime} (no years configured)"),
            MissingCoverage::Config(key) => write!(f, "{key}"),
        }
    }
}

/// Everything in `regimes` × `years` that would be served by a fallback.
///
/// With no years given, only regimes lacking a config for every year are
/// reported.
pub fn missing_coverage(
    table: &RegimeTable,
    regimes: &[Regime],
    years: &[TaxYear],
) -> Vec<MissingCoverage> {
    if years.is_empty() {
        return regimes
            .iter()
            .filter(|&&regime| table.years(regime).is_empty())
            .map(|&regime| MissingCoverage::Regime(regime))
            .collect();
    }

    table
        .missing_configs(regimes, years)
        .into_iter()
        .map(MissingCoverage::Config)
        .collect()
}
