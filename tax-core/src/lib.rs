//! Income-tax estimation core.
//!
//! A [`RegimeTable`] holds the bracket schedules and adjustment rules per
//! regime and tax year; [`calculations::TaxEstimator`] turns a
//! [`CalculationInput`] into a [`CalculationResult`] against that table.

pub mod calculations;
pub mod models;
pub mod table;

pub use calculations::TaxEstimator;
pub use models::*;
pub use table::{RegimeTable, RegimeTableError, Resolution};
