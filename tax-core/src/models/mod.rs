mod bracket;
mod calculation;
mod regime;
mod regime_config;
mod tax_year;

pub use bracket::Bracket;
pub use calculation::{CalculationInput, CalculationResult, ResolvedFrom};
pub use regime::{DeductionPolicy, Regime};
pub use regime_config::{RebateRule, RegimeConfig, RegimeKey};
pub use tax_year::{ParseTaxYearError, TaxYear};
