//! The static regime table and its lookup rules.
//!
//! A [`RegimeTable`] is built once, validated as a whole, and then only read.
//! Lookups never fail: [`RegimeTable::resolve`] walks a fixed fallback chain
//! that always ends at the table's global default.
//!
//! # Resolution order
//!
//! 1. The exact `(regime, year)` entry.
//! 2. Same regime, the configured year closest to the requested one. On a tie
//!    the later year wins.
//! 3. Same regime, the latest configured year, when no year was requested.
//! 4. The global default entry.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::models::{Regime, RegimeConfig, RegimeKey, ResolvedFrom, TaxYear};

/// Errors found while validating a regime table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegimeTableError {
    #[error("{0}: no brackets configured")]
    NoBrackets(RegimeKey),

    #[error("{key}: first bracket must start at 0, found {found}")]
    FirstBracketNotAtZero { key: RegimeKey, found: Decimal },

    #[error("{key}: bracket {index} starts at {found}, expected {expected}")]
    NonContiguous {
        key: RegimeKey,
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("{key}: bracket {index} upper bound {upper} is not above its lower bound {lower}")]
    EmptyBracket {
        key: RegimeKey,
        index: usize,
        lower: Decimal,
        upper: Decimal,
    },

    #[error("{key}: bracket {index} rate {rate} is below the previous rate {previous}")]
    DecreasingRate {
        key: RegimeKey,
        index: usize,
        rate: Decimal,
        previous: Decimal,
    },

    #[error("{key}: bracket {index} rate {rate} is outside 0..=1")]
    RateOutOfRange {
        key: RegimeKey,
        index: usize,
        rate: Decimal,
    },

    #[error("{key}: final bracket must be unbounded, found upper bound {upper}")]
    BoundedFinalBracket { key: RegimeKey, upper: Decimal },

    #[error("{key}: bracket {index} is unbounded but is not the final bracket")]
    UnboundedInnerBracket { key: RegimeKey, index: usize },

    #[error("{key}: {field} must not be negative")]
    NegativeAmount { key: RegimeKey, field: &'static str },

    #[error("{key}: cess rate {rate} is outside 0..=1")]
    CessOutOfRange { key: RegimeKey, rate: Decimal },

    #[error("{0}: configured more than once")]
    Duplicate(RegimeKey),

    #[error("default config {0} is not present in the table")]
    MissingDefault(RegimeKey),
}

/// The config chosen for a lookup, and how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub config: &'a RegimeConfig,
    pub source: ResolvedFrom,
}

/// Immutable map from `(regime, tax year)` to [`RegimeConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegimeTable {
    configs: BTreeMap<RegimeKey, RegimeConfig>,
    default_key: RegimeKey,
}

impl RegimeTable {
    /// Builds and validates a table.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegimeTableError`] found: an invalid config, a
    /// duplicate key, or a `default_key` with no matching config.
    pub fn new(
        configs: impl IntoIterator<Item = RegimeConfig>,
        default_key: RegimeKey,
    ) -> Result<Self, RegimeTableError> {
        let mut map = BTreeMap::new();

        for config in configs {
            config.validate()?;
            let key = config.key();
            if map.insert(key, config).is_some() {
                return Err(RegimeTableError::Duplicate(key));
            }
        }

        if !map.contains_key(&default_key) {
            return Err(RegimeTableError::MissingDefault(default_key));
        }

        Ok(Self {
            configs: map,
            default_key,
        })
    }

    pub fn default_key(&self) -> RegimeKey {
        self.default_key
    }

    pub fn default_config(&self) -> &RegimeConfig {
        // Presence is checked in `new` and the map is never mutated afterwards.
        &self.configs[&self.default_key]
    }

    pub fn get(
        &self,
        key: &RegimeKey,
    ) -> Option<&RegimeConfig> {
        self.configs.get(key)
    }

    /// Every config, ordered by regime then year.
    pub fn configs(&self) -> impl Iterator<Item = &RegimeConfig> {
        self.configs.values()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Distinct regimes with at least one config, in declaration order.
    pub fn regimes(&self) -> Vec<Regime> {
        let mut regimes: Vec<Regime> = self.configs.keys().map(|k| k.regime).collect();
        regimes.dedup();
        regimes
    }

    /// Configured years for `regime`, ascending.
    pub fn years(
        &self,
        regime: Regime,
    ) -> Vec<TaxYear> {
        self.configs_for(regime).map(|c| c.tax_year).collect()
    }

    fn configs_for(
        &self,
        regime: Regime,
    ) -> impl DoubleEndedIterator<Item = &RegimeConfig> {
        self.configs
            .range(RegimeKey::new(regime, i32::MIN)..=RegimeKey::new(regime, i32::MAX))
            .map(|(_, config)| config)
    }

    /// Picks the config for a calculation. See the module docs for the order.
    pub fn resolve(
        &self,
        regime: Option<Regime>,
        tax_year: Option<TaxYear>,
    ) -> Resolution<'_> {
        let found = regime.and_then(|regime| match tax_year {
            Some(year) => self.nearest(regime, year),
            None => self
                .configs_for(regime)
                .next_back()
                .map(|config| (config, ResolvedFrom::LatestYear)),
        });

        let (config, source) =
            found.unwrap_or_else(|| (self.default_config(), ResolvedFrom::GlobalDefault));

        if source != ResolvedFrom::Exact {
            debug!(
                requested_regime = ?regime,
                requested_year = ?tax_year,
                resolved = %config.key(),
                ?source,
                "regime config resolved by fallback"
            );
        }

        Resolution { config, source }
    }

    fn nearest(
        &self,
        regime: Regime,
        year: TaxYear,
    ) -> Option<(&RegimeConfig, ResolvedFrom)> {
        if let Some(config) = self.get(&RegimeKey::new(regime, year)) {
            return Some((config, ResolvedFrom::Exact));
        }

        // Ascending iteration with `<=` lets the later year win a tie.
        let mut best: Option<&RegimeConfig> = None;
        for config in self.configs_for(regime) {
            let closer = best.is_none_or(|b| config.tax_year.distance(year) <= b.tax_year.distance(year));
            if closer {
                best = Some(config);
            }
        }

        best.map(|config| (config, ResolvedFrom::NearestYear))
    }

    /// Requested combinations with no explicit config.
    ///
    /// Intended for deployment-time checks: anything listed here would be
    /// served by a fallback at calculation time.
    pub fn missing_configs(
        &self,
        regimes: &[Regime],
        years: &[TaxYear],
    ) -> Vec<RegimeKey> {
        regimes
            .iter()
            .flat_map(|&regime| years.iter().map(move |&year| RegimeKey::new(regime, year)))
            .filter(|key| !self.configs.contains_key(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{Bracket, DeductionPolicy};

    fn config(
        regime: Regime,
        year: i32,
    ) -> RegimeConfig {
        RegimeConfig {
            regime,
            tax_year: TaxYear::new(year),
            deduction_policy: DeductionPolicy::Itemized,
            standard_deduction: dec!(1000),
            brackets: vec![
                Bracket::new(dec!(0), Some(dec!(10000)), dec!(0.10)),
                Bracket::new(dec!(10000), None, dec!(0.20)),
            ],
            rebate: None,
            cess_rate: dec!(0),
        }
    }

    fn table() -> RegimeTable {
        RegimeTable::new(
            vec![
                config(Regime::New, 2024),
                config(Regime::New, 2025),
                config(Regime::Old, 2021),
                config(Regime::Old, 2023),
                config(Regime::Single, 2024),
            ],
            RegimeKey::new(Regime::New, 2025),
        )
        .expect("valid table")
    }

    // =========================================================================
    // construction tests
    // =========================================================================

    #[test]
    fn new_rejects_duplicate_keys() {
        let result = RegimeTable::new(
            vec![config(Regime::New, 2025), config(Regime::New, 2025)],
            RegimeKey::new(Regime::New, 2025),
        );

        assert_eq!(
            result,
            Err(RegimeTableError::Duplicate(RegimeKey::new(Regime::New, 2025)))
        );
    }

    #[test]
    fn new_rejects_missing_default() {
        let result = RegimeTable::new(
            vec![config(Regime::New, 2025)],
            RegimeKey::new(Regime::Old, 2025),
        );

        assert_eq!(
            result,
            Err(RegimeTableError::MissingDefault(RegimeKey::new(Regime::Old, 2025)))
        );
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut broken = config(Regime::Old, 2024);
        broken.brackets.pop();

        let result = RegimeTable::new(vec![broken], RegimeKey::new(Regime::Old, 2024));

        assert!(matches!(
            result,
            Err(RegimeTableError::BoundedFinalBracket { .. })
        ));
    }

    #[test]
    fn regimes_and_years_are_listed_in_order() {
        let table = table();

        assert_eq!(table.len(), 5);
        assert_eq!(table.regimes(), vec![Regime::New, Regime::Old, Regime::Single]);
        assert_eq!(
            table.years(Regime::Old),
            vec![TaxYear::new(2021), TaxYear::new(2023)]
        );
        assert!(table.years(Regime::HeadOfHousehold).is_empty());
    }

    // =========================================================================
    // resolve tests
    // =========================================================================

    #[test]
    fn resolve_exact_match() {
        let table = table();

        let resolution = table.resolve(Some(Regime::Old), Some(TaxYear::new(2023)));

        assert_eq!(resolution.config.key(), RegimeKey::new(Regime::Old, 2023));
        assert_eq!(resolution.source, ResolvedFrom::Exact);
    }

    #[test]
    fn resolve_nearest_year_below() {
        let table = table();

        let resolution = table.resolve(Some(Regime::Old), Some(TaxYear::new(2020)));

        assert_eq!(resolution.config.key(), RegimeKey::new(Regime::Old, 2021));
        assert_eq!(resolution.source, ResolvedFrom::NearestYear);
    }

    #[test]
    fn resolve_nearest_year_above() {
        let table = table();

        let resolution = table.resolve(Some(Regime::New), Some(TaxYear::new(2030)));

        assert_eq!(resolution.config.key(), RegimeKey::new(Regime::New, 2025));
        assert_eq!(resolution.source, ResolvedFrom::NearestYear);
    }

    #[test]
    fn resolve_nearest_year_tie_prefers_later_year() {
        let table = table();

        let resolution = table.resolve(Some(Regime::Old), Some(TaxYear::new(2022)));

        assert_eq!(resolution.config.key(), RegimeKey::new(Regime::Old, 2023));
    }

    #[test]
    fn resolve_without_year_uses_latest() {
        let table = table();

        let resolution = table.resolve(Some(Regime::Old), None);

        assert_eq!(resolution.config.key(), RegimeKey::new(Regime::Old, 2023));
        assert_eq!(resolution.source, ResolvedFrom::LatestYear);
    }

    #[test]
    fn resolve_unconfigured_regime_uses_global_default() {
        let table = table();

        let resolution = table.resolve(Some(Regime::HeadOfHousehold), Some(TaxYear::new(2024)));

        assert_eq!(resolution.config.key(), RegimeKey::new(Regime::New, 2025));
        assert_eq!(resolution.source, ResolvedFrom::GlobalDefault);
    }

    #[test]
    fn resolve_without_regime_uses_global_default() {
        let table = table();

        let resolution = table.resolve(None, Some(TaxYear::new(2024)));

        assert_eq!(resolution.config.key(), table.default_key());
        assert_eq!(resolution.source, ResolvedFrom::GlobalDefault);
    }

    // =========================================================================
    // missing_configs tests
    // =========================================================================

    #[test]
    fn missing_configs_lists_uncovered_combinations() {
        let table = table();

        let missing = table.missing_configs(
            &[Regime::New, Regime::Single],
            &[TaxYear::new(2024), TaxYear::new(2025)],
        );

        assert_eq!(missing, vec![RegimeKey::new(Regime::Single, 2025)]);
    }

    #[test]
    fn missing_configs_empty_when_covered() {
        let table = table();

        let missing = table.missing_configs(&[Regime::New], &[TaxYear::new(2025)]);

        assert!(missing.is_empty());
    }
}
