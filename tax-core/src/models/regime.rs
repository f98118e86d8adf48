use std::fmt;

use serde::{Deserialize, Serialize};

/// A named rule-set selecting the bracket table and deduction treatment.
///
/// `New` and `Old` are the two personal income-tax regimes that carry a
/// rebate and a cess. The remaining variants are filing statuses of a
/// schedule that has neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    New,
    Old,
    Single,
    MarriedJoint,
    MarriedSeparate,
    HeadOfHousehold,
}

impl Regime {
    pub fn all() -> &'static [Regime] {
        &[
            Self::New,
            Self::Old,
            Self::Single,
            Self::MarriedJoint,
            Self::MarriedSeparate,
            Self::HeadOfHousehold,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Old => "old",
            Self::Single => "single",
            Self::MarriedJoint => "married_joint",
            Self::MarriedSeparate => "married_separate",
            Self::HeadOfHousehold => "head_of_household",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New Regime",
            Self::Old => "Old Regime",
            Self::Single => "Single",
            Self::MarriedJoint => "Married Filing Jointly",
            Self::MarriedSeparate => "Married Filing Separately",
            Self::HeadOfHousehold => "Head of Household",
        }
    }

    /// Parses a regime code.
    ///
    /// Matching ignores case, `-`, `_` and spaces, so `married_joint`,
    /// `marriedJoint` and `Married-Joint` are all accepted.
    pub fn parse(s: &str) -> Option<Self> {
        let folded: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match folded.as_str() {
            "new" | "newregime" => Some(Self::New),
            "old" | "oldregime" => Some(Self::Old),
            "single" | "s" => Some(Self::Single),
            "marriedjoint" | "mfj" => Some(Self::MarriedJoint),
            "marriedseparate" | "mfs" => Some(Self::MarriedSeparate),
            "headofhousehold" | "hoh" => Some(Self::HeadOfHousehold),
            _ => None,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a regime honours deductions beyond the standard deduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeductionPolicy {
    /// Only the standard deduction applies; other deductions are ignored.
    Flat,
    /// Other deductions are subtracted in addition to the standard deduction.
    Itemized,
}

impl DeductionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Itemized => "itemized",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Some(Self::Flat),
            "itemized" | "itemised" => Some(Self::Itemized),
            _ => None,
        }
    }
}
