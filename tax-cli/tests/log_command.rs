//! The interactive `log` command against a real subscriber.
//!
//! Kept in its own test binary: the subscriber is process-wide.

use std::io::Cursor;

use tax_cli::config::DisplayConfig;
use tax_cli::session::Session;
use tax_cli::{app, logging};

#[test]
fn test_log_command_reloads_filter() {
    logging::init_logging("warn");
    let table = app::load_table(None).expect("built-in table loads");
    let mut session = Session::new(&table, "new", "2025");

    let mut out = Vec::new();
    app::run_interactive(
        &mut session,
        &DisplayConfig::default(),
        Cursor::new("log debug\nlog tax_core=loudest\nlog\n"),
        &mut out,
    )
    .expect("session runs to completion");
    let output = String::from_utf8(out).expect("output is UTF-8");

    assert!(output.contains("Log filter set to 'debug'."), "{output}");
    assert!(output.contains("error: invalid log level 'tax_core=loudest'"), "{output}");
    assert!(output.contains("error: 'log' needs a value"), "{output}");
}
