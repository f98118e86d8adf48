//! Tax calculation logic.
//!
//! [`TaxEstimator`] is the single entry point; the submodules hold the
//! rounding helpers and the coercion of raw user input it relies on.

pub mod common;
pub mod estimator;
pub mod input;

pub use estimator::TaxEstimator;
