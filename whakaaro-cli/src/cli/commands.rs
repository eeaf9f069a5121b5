//! Argument parsing and dispatch for the `whakaaro` CLI.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand, ValueEnum, builder::RangedU64ValueParser};
use thiserror::Error;
use tracing::{Span, field, info, instrument};
use whakaaro_core::{
    EstimateError, GraphError, Measure, OracleError, SampleScale, WalkConfig,
};
use whakaaro_providers_text::{DatasetPaths, TextProviderError};
use whakaaro_providers_walk::ProcessOracle;

use super::{
    experiments::{run_buckets, run_disagreement, run_measures},
    render::RunSummary,
};

const DEFAULT_SAMPLE_SIZES: &str = "500,1000,2000,3000,4000,5000,7500,10000";
const DEFAULT_EDGE_COUNTS: &str = "1000,2500,5000,10000,20000";

/// Rejects counts of zero while parsing.
fn positive() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}

/// Top-level options.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "whakaaro",
    about = "Estimate opinion-dynamics measures from small vertex and edge samples."
)]
pub struct Cli {
    /// Experiment to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Experiments offered by the CLI.
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Estimate every measure from vertex samples of increasing size.
    Measures(MeasuresCommand),
    /// Estimate disagreement from uniformly sampled edges.
    Disagreement(DisagreementCommand),
    /// Compare opinion-estimation error across degree buckets.
    Buckets(BucketsCommand),
}

impl Command {
    const fn label(&self) -> &'static str {
        match self {
            Self::Measures(_) => "measures",
            Self::Disagreement(_) => "disagreement",
            Self::Buckets(_) => "buckets",
        }
    }
}

/// The four files describing a dataset.
#[derive(Debug, Args, Clone)]
pub struct DatasetArgs {
    /// Weighted graph: vertex count, then `u v [w]` lines.
    #[arg(long)]
    pub graph: PathBuf,
    /// Expressed opinions, one per line.
    #[arg(long)]
    pub expressed: PathBuf,
    /// Innate opinions, one per line.
    #[arg(long)]
    pub innate: PathBuf,
    /// Exact measures as `key value` lines.
    #[arg(long)]
    pub measures: PathBuf,
}

impl DatasetArgs {
    pub(super) fn paths(&self) -> DatasetPaths {
        DatasetPaths {
            graph: self.graph.clone(),
            expressed: self.expressed.clone(),
            innate: self.innate.clone(),
            measures: self.measures.clone(),
        }
    }
}

/// Which opinion vector is known exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Given {
    /// Expressed opinions are known; innate ones are estimated locally.
    #[default]
    Expressed,
    /// Innate opinions are known; expressed ones come from the walk oracle.
    Innate,
}

/// How duplicate draws of a vertex count towards the sample size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ScaleArg {
    /// Each distinct vertex counts once.
    #[default]
    Distinct,
    /// Every draw counts.
    Draws,
}

impl From<ScaleArg> for SampleScale {
    fn from(value: ScaleArg) -> Self {
        match value {
            ScaleArg::Distinct => Self::DistinctVertices,
            ScaleArg::Draws => Self::Draws,
        }
    }
}

/// External random-walk oracle settings.
#[derive(Debug, Args, Clone)]
pub struct OracleArgs {
    /// Oracle program, invoked as `<oracle> <graph> <steps> <walks> <innate> <v>...`.
    #[arg(long)]
    pub oracle: Option<PathBuf>,
    /// Argument placed before the oracle arguments; repeatable.
    #[arg(long = "oracle-arg", allow_hyphen_values = true)]
    pub oracle_args: Vec<String>,
    /// Steps per random walk.
    #[arg(long, default_value_t = 600, value_parser = positive())]
    pub num_steps: usize,
    /// Walks per vertex.
    #[arg(long, default_value_t = 4000, value_parser = positive())]
    pub num_walks: usize,
    /// Seconds an oracle call may take before it is killed.
    #[arg(long, default_value_t = 600)]
    pub oracle_timeout_secs: u64,
}

impl OracleArgs {
    pub(super) fn walk_config(&self) -> Result<WalkConfig, CliError> {
        Ok(WalkConfig::new(self.num_steps, self.num_walks)?)
    }

    /// Builds the oracle when a program was named.
    pub(super) fn process_oracle(
        &self,
        graph: PathBuf,
        innate: PathBuf,
    ) -> Option<ProcessOracle> {
        let program = self.oracle.clone()?;
        let oracle = self
            .oracle_args
            .iter()
            .fold(ProcessOracle::new(program, graph, innate), |oracle, arg| {
                oracle.with_leading_arg(arg)
            })
            .with_timeout(Duration::from_secs(self.oracle_timeout_secs));
        Some(oracle)
    }
}

/// Where vertex opinions come from.
#[derive(Debug, Args, Clone)]
pub struct OpinionSourceArgs {
    /// Opinion vector treated as known.
    #[arg(long, value_enum, default_value_t = Given::Expressed)]
    pub given: Given,
    /// Neighbour draws per median group of the innate estimator.
    #[arg(long, default_value_t = 200, value_parser = positive())]
    pub num_samples: usize,
    /// Median groups of the innate estimator.
    #[arg(long, default_value_t = 3, value_parser = positive())]
    pub median_repetitions: usize,
    /// Walk oracle used when `--given innate`.
    #[command(flatten)]
    pub oracle: OracleArgs,
}

/// Options of the `measures` experiment.
#[derive(Debug, Args, Clone)]
pub struct MeasuresCommand {
    /// Input dataset.
    #[command(flatten)]
    pub dataset: DatasetArgs,
    /// Opinion source.
    #[command(flatten)]
    pub source: OpinionSourceArgs,
    /// Vertex sample sizes, comma separated.
    #[arg(
        long,
        value_delimiter = ',',
        num_args = 1..,
        default_value = DEFAULT_SAMPLE_SIZES,
        value_parser = positive()
    )]
    pub sample_sizes: Vec<usize>,
    /// Treatment of repeated draws.
    #[arg(long, value_enum, default_value_t = ScaleArg::Distinct)]
    pub scale: ScaleArg,
    /// Seed of the sampling RNG.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

/// Options of the `disagreement` experiment.
#[derive(Debug, Args, Clone)]
pub struct DisagreementCommand {
    /// Graph file read as an unweighted edge list.
    #[arg(long)]
    pub edges: PathBuf,
    /// Expressed opinions, one per line.
    #[arg(long)]
    pub expressed: PathBuf,
    /// Exact measures; must contain `ad`.
    #[arg(long)]
    pub measures: PathBuf,
    /// Innate opinions handed to the walk oracle.
    #[arg(long)]
    pub innate: Option<PathBuf>,
    /// Edge sample sizes, comma separated.
    #[arg(
        long,
        value_delimiter = ',',
        num_args = 1..,
        default_value = DEFAULT_EDGE_COUNTS,
        value_parser = positive()
    )]
    pub edge_counts: Vec<usize>,
    /// Estimates per edge count.
    #[arg(long, default_value_t = 10, value_parser = positive())]
    pub repetitions: usize,
    /// Walk oracle labelling sampled endpoints instead of the expressed file.
    #[command(flatten)]
    pub oracle: OracleArgs,
    /// Seed of the sampling RNG.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

/// Options of the `buckets` experiment.
#[derive(Debug, Args, Clone)]
pub struct BucketsCommand {
    /// Input dataset.
    #[command(flatten)]
    pub dataset: DatasetArgs,
    /// Opinion source.
    #[command(flatten)]
    pub source: OpinionSourceArgs,
    /// Number of degree buckets.
    #[arg(long, default_value_t = 20)]
    pub buckets: usize,
    /// Vertices drawn from each bucket per repetition.
    #[arg(long, default_value_t = 500, value_parser = positive())]
    pub per_bucket: usize,
    /// Repetitions of the whole sweep.
    #[arg(long, default_value_t = 10, value_parser = positive())]
    pub repetitions: usize,
    /// Seed of the sampling RNG.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// `--given innate` or `--innate` was used without `--oracle`.
    #[error("`{command}` needs `--oracle` to estimate expressed opinions")]
    MissingOracle {
        /// Command that needed the oracle.
        command: &'static str,
    },
    /// `--oracle` was used without the innate-opinion file it reads.
    #[error("`--oracle` needs `--innate` for the innate opinions")]
    MissingInnate,
    /// The measures file lacks a value the experiment compares against.
    #[error("measures file has no value for `{}`", .measure.key())]
    MissingMeasure {
        /// Absent measure.
        measure: Measure,
    },
    /// Reading an input file failed.
    #[error(transparent)]
    Text(#[from] TextProviderError),
    /// Graph construction or inspection failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
    /// An estimator rejected its input.
    #[error(transparent)]
    Estimate(#[from] EstimateError),
    /// The opinion oracle failed.
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

/// Runs the command described by `cli`.
///
/// # Errors
/// Returns [`CliError`] when an input cannot be read, an estimator rejects
/// its input or the oracle fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clap::Parser;
/// # use whakaaro_cli::cli::{Cli, RunSummary, run_cli};
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = tempfile::tempdir()?;
/// let edges = dir.path().join("g.txt");
/// let expressed = dir.path().join("z.txt");
/// let measures = dir.path().join("m.txt");
/// std::fs::write(&edges, "2\n0 1\n")?;
/// std::fs::write(&expressed, "0.0\n1.0\n")?;
/// std::fs::write(&measures, "ad 1.0\n")?;
///
/// let cli = Cli::try_parse_from([
///     "whakaaro", "disagreement",
///     "--edges", edges.to_str().ok_or("path")?,
///     "--expressed", expressed.to_str().ok_or("path")?,
///     "--measures", measures.to_str().ok_or("path")?,
///     "--edge-counts", "5", "--repetitions", "2",
/// ])?;
/// let RunSummary::Disagreement(summary) = run_cli(cli)? else {
///     return Err("wrong summary".into());
/// };
/// assert_eq!(summary.rows[0].errors.mean, 0.0);
/// # Ok(())
/// # }
/// ```
#[instrument(name = "cli.run", err, skip(cli), fields(command = field::Empty))]
pub fn run_cli(cli: Cli) -> Result<RunSummary, CliError> {
    Span::current().record("command", field::display(cli.command.label()));
    let summary = match cli.command {
        Command::Measures(command) => RunSummary::Measures(run_measures(&command)?),
        Command::Disagreement(command) => RunSummary::Disagreement(run_disagreement(&command)?),
        Command::Buckets(command) => RunSummary::Buckets(run_buckets(&command)?),
    };
    info!(rows = summary.len(), "command completed");
    Ok(summary)
}
