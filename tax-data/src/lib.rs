//! Regime table data: CSV loading, the built-in table, and coverage checks.

mod coverage;
mod loader;

pub use coverage::{MissingCoverage, missing_coverage};
pub use loader::{
    BRACKETS_FILE, BracketRecord, REGIMES_FILE, RegimeRecord, RegimeTableLoader,
    RegimeTableLoaderError,
};
