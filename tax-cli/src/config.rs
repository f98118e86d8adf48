//! Application configuration, read from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Command-line flags are applied on top by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tax_core::{Regime, TaxYear};
use thiserror::Error;
use tracing::debug;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "tax-estimator.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown default regime '{0}'")]
    InvalidRegime(String),

    #[error("invalid default tax year '{0}'")]
    InvalidTaxYear(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub defaults: DefaultsConfig,
    pub data: DataConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// Values pre-filled when the user does not give one.
///
/// Kept as the text the user wrote; it goes through the same coercion as
/// interactive input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    pub regime: Option<String>,
    pub tax_year: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Directory holding `regimes.csv` and `brackets.csv`. The built-in
    /// table is used when unset.
    pub dir: Option<PathBuf>,
}

/// Digit grouping for formatted amounts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// `1,234,567`
    #[default]
    Western,
    /// `12,34,567`
    Indian,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub currency_symbol: String,
    pub grouping: Grouping,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            grouping: Grouping::Western,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Bare level or any `EnvFilter` directive. `RUST_LOG` takes precedence.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    /// Parse and check a configuration from TOML text.
    pub fn from_toml(
        text: &str,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text, path)?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Resolve the configuration to use.
    ///
    /// An explicit path must exist. Otherwise [`DEFAULT_CONFIG_FILE`] in
    /// `cwd` is used when present, and the built-in defaults when not.
    pub fn discover(
        explicit: Option<&Path>,
        cwd: &Path,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = cwd.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            debug!("no config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Default regime and year must be recognisable when given.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(regime) = &self.defaults.regime {
            if Regime::parse(regime).is_none() {
                return Err(ConfigError::InvalidRegime(regime.clone()));
            }
        }
        if let Some(year) = &self.defaults.tax_year {
            if year.parse::<TaxYear>().is_err() {
                return Err(ConfigError::InvalidTaxYear(year.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(text: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::from_toml(text, Path::new("test.toml"))
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse("").unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.display.currency_symbol, "$");
        assert_eq!(config.display.grouping, Grouping::Western);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parses_every_section() {
        let config = parse(
            r#"
            [defaults]
            regime = "old"
            tax_year = "2025-26"

            [data]
            dir = "/srv/tax-data"

            [display]
            currency_symbol = "₹"
            grouping = "indian"

            [logging]
            level = "debug"
            file = "estimator.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.defaults.regime.as_deref(), Some("old"));
        assert_eq!(config.defaults.tax_year.as_deref(), Some("2025-26"));
        assert_eq!(config.data.dir, Some(PathBuf::from("/srv/tax-data")));
        assert_eq!(config.display.currency_symbol, "₹");
        assert_eq!(config.display.grouping, Grouping::Indian);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, Some(PathBuf::from("estimator.log")));
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = parse("[display]\ngrouping = \"indian\"\n").unwrap();

        assert_eq!(config.display.currency_symbol, "$");
        assert_eq!(config.display.grouping, Grouping::Indian);
    }

    #[test]
    fn rejects_unknown_keys() {
        let result = parse("[display]\ncolour = \"blue\"\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn rejects_unknown_grouping() {
        let result = parse("[display]\ngrouping = \"swiss\"\n");
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn rejects_unknown_default_regime() {
        let result = parse("[defaults]\nregime = \"flat_tax\"\n");
        assert!(matches!(result, Err(ConfigError::InvalidRegime(r)) if r == "flat_tax"));
    }

    #[test]
    fn rejects_invalid_default_year() {
        let result = parse("[defaults]\ntax_year = \"2024-26\"\n");
        assert!(matches!(result, Err(ConfigError::InvalidTaxYear(_))));
    }

    #[test]
    fn load_missing_explicit_file_is_an_error() {
        let result = AppConfig::discover(Some(Path::new("/no/such/config.toml")), Path::new("."));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn discover_without_file_uses_defaults() {
        let config = AppConfig::discover(None, Path::new("/no/such/dir")).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
