//! Terminal front end for the tax estimator: configuration, logging,
//! formatting, and the commands run by the `tax-estimator` binary.

pub mod app;
pub mod config;
pub mod format;
pub mod logging;
pub mod session;
