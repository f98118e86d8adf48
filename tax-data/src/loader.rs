use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use tax_core::{
    Bracket, DeductionPolicy, RebateRule, Regime, RegimeConfig, RegimeKey, RegimeTable,
    RegimeTableError, TaxYear,
};
use thiserror::Error;
use tracing::{debug, info};

/// File holding one row per (regime, tax year) with its adjustment rules.
pub const REGIMES_FILE: &str = "regimes.csv";

/// File holding the brackets, one row each, in ascending order per group.
pub const BRACKETS_FILE: &str = "brackets.csv";

const BUILTIN_REGIMES: &str = include_str!("../data/regimes.csv");
const BUILTIN_BRACKETS: &str = include_str!("../data/brackets.csv");

/// Errors that can occur when loading a regime table.
#[derive(Debug, Error)]
pub enum RegimeTableLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid regime: {0}")]
    InvalidRegime(String),

    #[error("invalid tax year: {0}")]
    InvalidTaxYear(String),

    #[error("{key}: invalid deduction policy '{value}' (expected flat or itemized)")]
    InvalidDeductionPolicy { key: RegimeKey, value: String },

    #[error("{0}: rebate_threshold and rebate_cap must both be set or both be empty")]
    IncompleteRebate(RegimeKey),

    #[error("{0}: brackets have no matching row in regimes.csv")]
    OrphanBrackets(RegimeKey),

    #[error("no row in regimes.csv is marked is_default")]
    NoDefault,

    #[error("more than one default row: {0} and {1}")]
    MultipleDefaults(RegimeKey, RegimeKey),

    #[error("invalid regime table: {0}")]
    Table(#[from] RegimeTableError),
}

impl From<csv::Error> for RegimeTableLoaderError {
    fn from(err: csv::Error) -> Self {
        RegimeTableLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of `regimes.csv`.
///
/// - `regime`: regime code (`new`, `old`, `single`, ...)
/// - `tax_year`: `2025` or a split-year label such as `2025-26`
/// - `deduction_policy`: `flat` or `itemized`
/// - `standard_deduction`: amount subtracted before bracket application
/// - `rebate_threshold`, `rebate_cap`: both empty when the regime has no rebate
/// - `cess_rate`: fraction applied to tax after rebate (`0` for none)
/// - `is_default`: exactly one row is the global fallback
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RegimeRecord {
    pub regime: String,
    pub tax_year: String,
    pub deduction_policy: String,
    pub standard_deduction: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub rebate_threshold: Option<Decimal>,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub rebate_cap: Option<Decimal>,
    pub cess_rate: Decimal,
    pub is_default: bool,
}

/// A single row of `brackets.csv`.
///
/// `upper_bound` is empty for the final, unbounded bracket.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub regime: String,
    pub tax_year: String,
    pub lower_bound: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn parse_key(
    regime: &str,
    tax_year: &str,
) -> Result<RegimeKey, RegimeTableLoaderError> {
    let regime =
        Regime::parse(regime).ok_or_else(|| RegimeTableLoaderError::InvalidRegime(regime.to_string()))?;
    let tax_year: TaxYear = tax_year
        .parse()
        .map_err(|_| RegimeTableLoaderError::InvalidTaxYear(tax_year.to_string()))?;
    Ok(RegimeKey { regime, tax_year })
}

fn parse_records<R: Read, T: for<'de> Deserialize<'de>>(
    reader: R
) -> Result<Vec<T>, RegimeTableLoaderError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = Vec::new();

    for result in csv_reader.deserialize() {
        let record: T = result?;
        records.push(record);
    }

    Ok(records)
}

fn open(path: &Path) -> Result<File, RegimeTableLoaderError> {
    File::open(path).map_err(|source| RegimeTableLoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loader for regime tables stored as a pair of CSV files.
///
/// Columns are matched by header name. Bracket rows are grouped by
/// (regime, tax year) and kept in file order, so an out-of-order file is
/// rejected by validation rather than silently sorted.
pub struct RegimeTableLoader;

impl RegimeTableLoader {
    /// Parse `regimes.csv` rows from any reader.
    pub fn parse_regimes<R: Read>(reader: R) -> Result<Vec<RegimeRecord>, RegimeTableLoaderError> {
        parse_records(reader)
    }

    /// Parse `brackets.csv` rows from any reader.
    pub fn parse_brackets<R: Read>(
        reader: R
    ) -> Result<Vec<BracketRecord>, RegimeTableLoaderError> {
        parse_records(reader)
    }

    /// Assemble and validate a table from parsed rows.
    ///
    /// # Errors
    ///
    /// Fails on unknown codes, a half-specified rebate, brackets without a
    /// regime row, anything other than exactly one default row, and every
    /// [`RegimeTableError`] raised by table validation.
    pub fn build(
        regimes: &[RegimeRecord],
        brackets: &[BracketRecord],
    ) -> Result<RegimeTable, RegimeTableLoaderError> {
        let mut grouped: BTreeMap<RegimeKey, Vec<Bracket>> = BTreeMap::new();
        for record in brackets {
            let key = parse_key(&record.regime, &record.tax_year)?;
            grouped.entry(key).or_default().push(Bracket::new(
                record.lower_bound,
                record.upper_bound,
                record.rate,
            ));
        }

        let mut seen = HashSet::new();
        let mut default_key: Option<RegimeKey> = None;
        let mut configs = Vec::with_capacity(regimes.len());

        for record in regimes {
            let key = parse_key(&record.regime, &record.tax_year)?;
            if !seen.insert(key) {
                return Err(RegimeTableError::Duplicate(key).into());
            }

            let deduction_policy = DeductionPolicy::parse(&record.deduction_policy).ok_or_else(|| {
                RegimeTableLoaderError::InvalidDeductionPolicy {
                    key,
                    value: record.deduction_policy.clone(),
                }
            })?;

            let rebate = match (record.rebate_threshold, record.rebate_cap) {
                (Some(income_threshold), Some(rebate_cap)) => Some(RebateRule {
                    income_threshold,
                    rebate_cap,
                }),
                (None, None) => None,
                _ => return Err(RegimeTableLoaderError::IncompleteRebate(key)),
            };

            if record.is_default {
                if let Some(existing) = default_key {
                    return Err(RegimeTableLoaderError::MultipleDefaults(existing, key));
                }
                default_key = Some(key);
            }

            let brackets = grouped.remove(&key).unwrap_or_default();
            debug!(%key, brackets = brackets.len(), "regime config assembled");

            configs.push(RegimeConfig {
                regime: key.regime,
                tax_year: key.tax_year,
                deduction_policy,
                standard_deduction: record.standard_deduction,
                brackets,
                rebate,
                cess_rate: record.cess_rate,
            });
        }

        if let Some(orphan) = grouped.keys().next() {
            return Err(RegimeTableLoaderError::OrphanBrackets(*orphan));
        }

        let default_key = default_key.ok_or(RegimeTableLoaderError::NoDefault)?;
        Ok(RegimeTable::new(configs, default_key)?)
    }

    /// Load `regimes.csv` and `brackets.csv` from `dir`.
    pub fn load_dir(dir: &Path) -> Result<RegimeTable, RegimeTableLoaderError> {
        let regimes = Self::parse_regimes(open(&dir.join(REGIMES_FILE))?)?;
        let brackets = Self::parse_brackets(open(&dir.join(BRACKETS_FILE))?)?;

        let table = Self::build(&regimes, &brackets)?;
        info!(
            dir = %dir.display(),
            configs = table.len(),
            default = %table.default_key(),
            "regime table loaded"
        );
        Ok(table)
    }

    /// The table shipped with this crate.
    pub fn builtin() -> Result<RegimeTable, RegimeTableLoaderError> {
        let regimes = Self::parse_regimes(BUILTIN_REGIMES.as_bytes())?;
        let brackets = Self::parse_brackets(BUILTIN_BRACKETS.as_bytes())?;

        let table = Self::build(&regimes, &brackets)?;
        debug!(configs = table.len(), "built-in regime table loaded");
        Ok(table)
    }
}
