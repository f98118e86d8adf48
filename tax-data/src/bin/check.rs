use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use tax_core::{Regime, RegimeTable, TaxYear};
use tax_data::{RegimeTableLoader, missing_coverage};
use tracing_subscriber::EnvFilter;

/// Validate a regime table and report missing (regime, year) combinations.
///
/// The directory must contain `regimes.csv` and `brackets.csv`. Without
/// `--dir` the table shipped with the estimator is checked.
#[derive(Parser, Debug)]
#[command(name = "tax-data-check")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding regimes.csv and brackets.csv
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Tax year that must be configured for every checked regime (e.g. 2025 or 2025-26)
    #[arg(short = 'y', long = "require-year")]
    require_year: Vec<String>,

    /// Regime that must be configured (defaults to every regime in the table)
    #[arg(short = 'r', long = "require-regime")]
    require_regime: Vec<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(args: &Args) -> Result<RegimeTable> {
    match &args.dir {
        Some(dir) => RegimeTableLoader::load_dir(dir)
            .with_context(|| format!("Failed to load regime table from: {}", dir.display())),
        None => RegimeTableLoader::builtin().context("Built-in regime table is invalid"),
    }
}

fn parse_requirements(
    args: &Args,
    table: &RegimeTable,
) -> Result<(Vec<Regime>, Vec<TaxYear>)> {
    let regimes = if args.require_regime.is_empty() {
        table.regimes()
    } else {
        args.require_regime
            .iter()
            .map(|code| Regime::parse(code).ok_or_else(|| anyhow!("Unknown regime: {code}")))
            .collect::<Result<Vec<_>>>()?
    };

    let years = args
        .require_year
        .iter()
        .map(|year| {
            year.parse::<TaxYear>()
                .with_context(|| format!("Invalid tax year: {year}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((regimes, years))
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let source = args
        .dir
        .as_ref()
        .map_or_else(|| "built-in".to_string(), |dir| dir.display().to_string());
    println!("Checking regime table: {source}");

    let table = load(&args)?;
    println!(
        "Table is valid: {} configs, default {}",
        table.len(),
        table.default_key()
    );

    for regime in table.regimes() {
        let years: Vec<String> = table
            .years(regime)
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("  {:<20} {}", regime.as_str(), years.join(", "));
    }

    let (regimes, years) = parse_requirements(&args, &table)?;
    let missing = missing_coverage(&table, &regimes, &years);
    if missing.is_empty() {
        println!("All required regimes and years are configured.");
        return Ok(());
    }

    println!("Missing configs (would be served by a fallback):");
    for entry in &missing {
        println!("  {entry}");
    }
    bail!("incomplete coverage: {} missing", missing.len());
}
