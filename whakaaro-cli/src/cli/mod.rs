//! Experiment drivers behind the `whakaaro` binary.
//!
//! Each subcommand loads a dataset, samples vertices or edges, obtains the
//! opinions it needs and returns a summary that renders as CSV.

mod commands;
mod experiments;
mod render;

pub use commands::{
    BucketsCommand, Cli, CliError, Command, DatasetArgs, DisagreementCommand, Given,
    MeasuresCommand, OpinionSourceArgs, OracleArgs, ScaleArg, run_cli,
};
pub use render::{
    BucketRow, BucketsSummary, DisagreementRow, DisagreementSummary, MeasureRow, MeasuresSummary,
    RunSummary, render_buckets, render_disagreement, render_measures, render_summary,
};

#[cfg(test)]
mod test_helpers;
