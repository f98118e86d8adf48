use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use tax_cli::config::AppConfig;
use tax_cli::session::Session;
use tax_cli::{app, logging};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Income tax estimator.
///
/// Computes tax owed under a configurable regime table: progressive
/// brackets, standard and itemized deductions, rebate, and cess.
#[derive(Debug, Parser)]
#[command(name = "tax-estimator", version, about)]
struct Cli {
    /// Configuration file. Defaults to `tax-estimator.toml` in the working
    /// directory when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding `regimes.csv` and `brackets.csv`.
    /// The built-in table is used when neither this nor the config sets one.
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `tax_core=trace`. `RUST_LOG` takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute a single estimate.
    Estimate(EstimateArgs),
    /// Edit inputs line by line and watch the estimate update.
    Interactive,
    /// List every configured regime and tax year.
    Regimes,
}

#[derive(Debug, Args)]
struct EstimateArgs {
    /// Gross annual income.
    #[arg(long)]
    income: String,

    /// Deductions claimed (ignored by flat-deduction regimes).
    #[arg(long, default_value = "")]
    deductions: String,

    /// Regime code, e.g. `new`, `old`, `single`, `married_joint`.
    #[arg(long)]
    regime: Option<String>,

    /// Tax year, e.g. `2025` or `2025-26`.
    #[arg(long)]
    year: Option<String>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("Failed to determine working directory")?;
    let config = AppConfig::discover(cli.config.as_deref(), &cwd)?;

    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    logging::init_logging(level);
    if let Some(path) = cli.log_file.as_ref().or(config.logging.file.as_ref()) {
        logging::enable_file_logging(path)?;
    }
    debug!(?config, "configuration resolved");

    let data_dir = cli.data.as_ref().or(config.data.dir.as_ref());
    let table = app::load_table(data_dir.map(PathBuf::as_path))?;

    let default_regime = config.defaults.regime.as_deref().unwrap_or_default();
    let default_year = config.defaults.tax_year.as_deref().unwrap_or_default();

    match cli.command {
        Command::Estimate(args) => {
            let result = app::estimate(
                &table,
                &args.income,
                &args.deductions,
                args.regime.as_deref().unwrap_or(default_regime),
                args.year.as_deref().unwrap_or(default_year),
            );
            if args.json {
                println!("{}", app::render_json(&result)?);
            } else {
                print!("{}", app::render_report(&result, &config.display));
            }
        }
        Command::Interactive => {
            let mut session = Session::new(&table, default_regime, default_year);
            let stdin = io::stdin();
            app::run_interactive(&mut session, &config.display, stdin.lock(), io::stdout())?;
        }
        Command::Regimes => {
            print!("{}", app::render_regimes(&table, &config.display));
        }
    }

    Ok(())
}
