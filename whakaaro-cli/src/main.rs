//! `whakaaro` entry point.
//!
//! Installs logging, runs the requested experiment, writes its CSV summary to
//! stdout and turns failures into a logged error with stable codes and a
//! non-zero exit status.

use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, field};
use whakaaro_cli::{
    cli::{Cli, CliError, render_summary, run_cli},
    logging::{self, LoggingError},
};

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let summary = run_cli(cli).context("experiment failed")?;
    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    render_summary(&summary, &mut writer).context("failed to write results")?;
    writer.flush().context("failed to flush results")?;
    Ok(())
}

/// Stable code of the failing layer and, for estimator failures caused by
/// the graph, the graph code underneath.
fn error_codes(err: &anyhow::Error) -> (Option<&'static str>, Option<&'static str>) {
    match err.downcast_ref::<CliError>() {
        Some(CliError::Estimate(estimate)) => (
            Some(estimate.code().as_str()),
            estimate.graph_code().map(|code| code.as_str()),
        ),
        Some(CliError::Graph(graph)) => (Some(graph.code().as_str()), None),
        Some(CliError::Oracle(oracle)) => (Some(oracle.code().as_str()), None),
        _ => (None, None),
    }
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        report_logging_init_error(&err);
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        let (code, graph_code) = error_codes(&err);
        error!(
            error = %format_args!("{err:#}"),
            code = code.map(field::display),
            graph_code = graph_code.map(field::display),
            "whakaaro failed"
        );
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

#[expect(
    clippy::print_stderr,
    reason = "logging is unavailable when its own setup fails"
)]
fn report_logging_init_error(err: &LoggingError) {
    eprintln!("failed to initialise logging: {err}");
}
