//! End-to-end runs of the `tax-data-check` binary.

use std::path::{Path, PathBuf};
use std::process::Output;

use assert_cmd::cargo::cargo_bin_cmd;

fn fixture_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("test-data")
        .join(name)
}

fn run(args: &[&str]) -> Output {
    cargo_bin_cmd!("tax-data-check")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run tax-data-check")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_valid_table_without_requirements_succeeds() {
    let dir = fixture_dir("minimal");
    let output = run(&["--dir", dir.to_str().unwrap()]);

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Table is valid: 2 configs, default old/2025"), "{out}");
    assert!(out.contains("All required regimes and years are configured."), "{out}");
}

#[test]
fn test_required_regime_without_any_year_fails() {
    let dir = fixture_dir("minimal");
    let output = run(&["--dir", dir.to_str().unwrap(), "--require-regime", "new"]);

    assert!(!output.status.success());
    assert!(stdout(&output).contains("  new (no years configured)"));
    assert!(stderr(&output).contains("incomplete coverage: 1 missing"));
}

#[test]
fn test_required_regime_and_year_present_succeeds() {
    let dir = fixture_dir("minimal");
    let output = run(&[
        "--dir",
        dir.to_str().unwrap(),
        "--require-regime",
        "old",
        "--require-year",
        "2025-26",
    ]);

    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn test_required_year_checks_every_table_regime_by_default() {
    let dir = fixture_dir("minimal");
    let output = run(&["--dir", dir.to_str().unwrap(), "--require-year", "2025"]);

    assert!(!output.status.success());
    let out = stdout(&output);
    assert!(out.contains("  single/2025"), "{out}");
    assert!(!out.contains("  old/2025\n"), "{out}");
}

#[test]
fn test_invalid_table_fails_with_context() {
    let dir = fixture_dir("gap");
    let output = run(&["--dir", dir.to_str().unwrap()]);

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Failed to load regime table from"), "{err}");
}

#[test]
fn test_unknown_required_regime_is_rejected() {
    let output = run(&["--require-regime", "flat_tax"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unknown regime: flat_tax"));
}

#[test]
fn test_builtin_table_covers_2024() {
    let output = run(&["--require-year", "2024"]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Checking regime table: built-in"));
}
