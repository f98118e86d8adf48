use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static TAX_YEAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i:fy)?\s*(\d{4})(?:\s*[-/]\s*(\d{2}|\d{4}))?$").expect("valid tax year pattern")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tax year '{0}'")]
pub struct ParseTaxYearError(String);

/// A tax year, identified by the calendar year it starts in.
///
/// Split-year labels such as `2024-25` or `FY 2024-25` resolve to their
/// starting year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxYear(i32);

impl TaxYear {
    pub const fn new(year: i32) -> Self {
        Self(year)
    }

    pub const fn year(self) -> i32 {
        self.0
    }

    /// Absolute distance in years.
    pub fn distance(
        self,
        other: TaxYear,
    ) -> u32 {
        self.0.abs_diff(other.0)
    }
}

impl FromStr for TaxYear {
    type Err = ParseTaxYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = TAX_YEAR_PATTERN
            .captures(s.trim())
            .ok_or_else(|| ParseTaxYearError(s.to_string()))?;

        let start: i32 = caps[1]
            .parse()
            .map_err(|_| ParseTaxYearError(s.to_string()))?;

        // A second component must be the following year.
        if let Some(end) = caps.get(2) {
            let end_str = end.as_str();
            let expected = if end_str.len() == 2 {
                (start + 1) % 100
            } else {
                start + 1
            };
            if end_str.parse::<i32>().ok() != Some(expected) {
                return Err(ParseTaxYearError(s.to_string()));
            }
        }

        Ok(Self(start))
    }
}

impl From<i32> for TaxYear {
    fn from(year: i32) -> Self {
        Self(year)
    }
}

impl fmt::Display for TaxYear {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
