//! Interactive estimate session.
//!
//! A [`Session`] holds the raw text of each form field and the latest
//! result. Every field change recomputes immediately, so the result always
//! reflects the most recent input and nothing older is kept.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use tax_core::{CalculationInput, CalculationResult, RegimeTable, TaxEstimator};
use thiserror::Error;
use tracing::debug;

/// An editable input field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Income,
    Deductions,
    Regime,
    Year,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Income => "income",
            Field::Deductions => "deductions",
            Field::Regime => "regime",
            Field::Year => "year",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "income" | "gross" => Ok(Field::Income),
            "deductions" | "deduction" => Ok(Field::Deductions),
            "regime" | "status" => Ok(Field::Regime),
            "year" | "tax_year" => Ok(Field::Year),
            _ => Err(CommandError::Unknown(s.to_string())),
        }
    }
}

/// One line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Replace a field's text. An empty value clears the field.
    Set(Field, String),
    /// Replace the active log filter, e.g. `debug` or `tax_core=trace`.
    Log(String),
    Show,
    Reset,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}' (type 'help' for a list)")]
    Unknown(String),

    #[error("'{0}' needs a value")]
    MissingValue(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(w, r)| (w, r.trim()));

        match word.to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "show" => Ok(Command::Show),
            "reset" => Ok(Command::Reset),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "log" if rest.is_empty() => Err(CommandError::MissingValue("log")),
            "log" => Ok(Command::Log(rest.to_string())),
            _ => Ok(Command::Set(word.parse()?, rest.to_string())),
        }
    }
}

/// Raw form state plus the latest estimate computed from it.
#[derive(Debug, Clone)]
pub struct Session<'a> {
    estimator: TaxEstimator<'a>,
    default_regime: String,
    default_year: String,

    income: String,
    deductions: String,
    regime: String,
    tax_year: String,

    latest: Option<CalculationResult>,
}

impl<'a> Session<'a> {
    /// Starts an empty session. `regime` and `tax_year` pre-fill their
    /// fields and are restored by [`Session::reset`].
    pub fn new(
        table: &'a RegimeTable,
        regime: impl Into<String>,
        tax_year: impl Into<String>,
    ) -> Self {
        let default_regime = regime.into();
        let default_year = tax_year.into();
        Self {
            estimator: TaxEstimator::new(table),
            regime: default_regime.clone(),
            tax_year: default_year.clone(),
            default_regime,
            default_year,
            income: String::new(),
            deductions: String::new(),
            latest: None,
        }
    }

    /// Replaces one field and recomputes.
    pub fn set(
        &mut self,
        field: Field,
        value: &str,
    ) -> Option<&CalculationResult> {
        let slot = match field {
            Field::Income => &mut self.income,
            Field::Deductions => &mut self.deductions,
            Field::Regime => &mut self.regime,
            Field::Year => &mut self.tax_year,
        };
        value.trim().clone_into(slot);
        debug!(%field, value = %slot, "field updated");
        self.recompute()
    }

    pub fn set_income(
        &mut self,
        value: &str,
    ) -> Option<&CalculationResult> {
        self.set(Field::Income, value)
    }

    pub fn set_deductions(
        &mut self,
        value: &str,
    ) -> Option<&CalculationResult> {
        self.set(Field::Deductions, value)
    }

    pub fn set_regime(
        &mut self,
        value: &str,
    ) -> Option<&CalculationResult> {
        self.set(Field::Regime, value)
    }

    pub fn set_tax_year(
        &mut self,
        value: &str,
    ) -> Option<&CalculationResult> {
        self.set(Field::Year, value)
    }

    /// Clears amounts and the result; regime and year go back to their
    /// defaults.
    pub fn reset(&mut self) {
        self.income.clear();
        self.deductions.clear();
        self.regime.clone_from(&self.default_regime);
        self.tax_year.clone_from(&self.default_year);
        self.latest = None;
    }

    /// The current text of a field.
    pub fn field(
        &self,
        field: Field,
    ) -> &str {
        match field {
            Field::Income => &self.income,
            Field::Deductions => &self.deductions,
            Field::Regime => &self.regime,
            Field::Year => &self.tax_year,
        }
    }

    /// The input the current fields coerce to.
    pub fn input(&self) -> CalculationInput {
        CalculationInput::from_raw(&self.income, &self.deductions, &self.regime, &self.tax_year)
    }

    /// Result for the current fields, or `None` while income is missing or
    /// not positive.
    pub fn latest(&self) -> Option<&CalculationResult> {
        self.latest.as_ref()
    }

    fn recompute(&mut self) -> Option<&CalculationResult> {
        let input = self.input();
        self.latest = if input.gross_income > Decimal::ZERO {
            Some(self.estimator.compute(&input))
        } else {
            None
        };
        self.latest.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tax_core::{Regime, RegimeKey};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tax_data::RegimeTableLoader;
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;

    fn table() -> RegimeTable {
        RegimeTableLoader::builtin().expect("built-in table is valid")
    }

    #[test]
    fn parses_field_commands() {
        assert_eq!(
            "income 9,00,000".parse(),
            Ok(Command::Set(Field::Income, "9,00,000".to_string()))
        );
        assert_eq!(
            "  Regime   old ".parse(),
            Ok(Command::Set(Field::Regime, "old".to_string()))
        );
        assert_eq!(
            "year FY 2024-25".parse(),
            Ok(Command::Set(Field::Year, "FY 2024-25".to_string()))
        );
        assert_eq!(
            "deductions".parse(),
            Ok(Command::Set(Field::Deductions, String::new()))
        );
    }

    #[test]
    fn parses_control_commands() {
        assert_eq!("show".parse(), Ok(Command::Show));
        assert_eq!("RESET".parse(), Ok(Command::Reset));
        assert_eq!("?".parse(), Ok(Command::Help));
        assert_eq!("exit".parse(), Ok(Command::Quit));
        assert_eq!("log debug".parse(), Ok(Command::Log("debug".to_string())));
        assert_eq!("log".parse::<Command>(), Err(CommandError::MissingValue("log")));
    }

    #[test]
    fn rejects_empty_and_unknown_commands() {
        assert_eq!("   ".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "salary 100".parse::<Command>(),
            Err(CommandError::Unknown("salary".to_string()))
        );
    }

    #[test]
    fn no_result_until_income_is_positive() {
        let table = table();
        let mut session = Session::new(&table, "new", "2025");

        assert!(session.latest().is_none());
        assert!(session.set_deductions("50000").is_none());
        assert!(session.set_income("0").is_none());
        assert!(session.set_income("garbage").is_none());
        assert!(session.set_income("-5").is_none());
        assert!(session.set_income("900000").is_some());
    }

    #[test]
    fn every_change_recomputes() {
        let table = table();
        let mut session = Session::new(&table, "new", "2025");

        let total = session.set_income("900000").map(|r| r.total_tax);
        assert_eq!(total, Some(dec!(23400)));

        session.set_regime("old");
        session.set_deductions("100000");
        let total = session.set_income("600000").map(|r| r.total_tax);
        assert_eq!(total, Some(dec!(10400)));
        assert_eq!(
            session.latest().map(|r| r.resolved),
            Some(RegimeKey::new(Regime::Old, 2025))
        );
    }

    #[test]
    fn last_write_wins() {
        let table = table();
        let mut session = Session::new(&table, "new", "2025");

        session.set_income("100000");
        session.set_income("900000");

        assert_eq!(session.latest().map(|r| r.gross_income), Some(dec!(900000)));
    }

    #[test]
    fn clearing_income_drops_the_result() {
        let table = table();
        let mut session = Session::new(&table, "new", "2025");

        session.set_income("900000");
        assert!(session.set_income("").is_none());
        assert!(session.latest().is_none());
    }

    #[test]
    fn reset_restores_defaults() {
        let table = table();
        let mut session = Session::new(&table, "old", "2024");

        session.set_regime("single");
        session.set_tax_year("2023");
        session.set_income("75000");
        session.reset();

        assert_eq!(session.field(Field::Income), "");
        assert_eq!(session.field(Field::Regime), "old");
        assert_eq!(session.field(Field::Year), "2024");
        assert!(session.latest().is_none());
    }

    #[test]
    fn input_reflects_raw_fields() {
        let table = table();
        let mut session = Session::new(&table, "", "");

        session.set_income("$75,000");
        session.set_regime("mfj");

        let input = session.input();
        assert_eq!(input.gross_income, dec!(75000));
        assert_eq!(input.deductions, dec!(0));
        assert_eq!(input.regime, Some(Regime::MarriedJoint));
        assert_eq!(input.tax_year, None);
    }

    #[derive(Clone, Default)]
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: Subscriber> Layer<S> for WarnCounter {
        fn on_event(
            &self,
            event: &Event<'_>,
            _ctx: Context<'_, S>,
        ) {
            if *event.metadata().level() == Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[test]
    fn unusable_income_warns_once_per_change() {
        let table = table();
        let mut session = Session::new(&table, "new", "2025");
        let counter = WarnCounter::default();
        let subscriber = tracing_subscriber::registry().with(counter.clone());

        tracing::subscriber::with_default(subscriber, || {
            assert!(session.set_income("twelve lakh").is_none());
        });

        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }
}
