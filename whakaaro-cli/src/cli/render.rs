//! Run summaries and their CSV rendering.

use std::io::{self, Write};

use whakaaro_core::{ErrorSummary, MeasureComparison};

/// One estimated measure at one sample size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureRow {
    /// Estimate against the exact value.
    pub comparison: MeasureComparison,
    /// Vertices drawn for this estimate.
    pub sampled_vertices: usize,
}

/// Output of the `measures` experiment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeasuresSummary {
    /// Rows in sample-size order, measures in estimation order within each.
    pub rows: Vec<MeasureRow>,
    /// Distinct vertices whose opinions were obtained.
    pub labelled_vertices: usize,
    /// Seconds spent obtaining those opinions.
    pub opinion_seconds: f64,
}

/// Relative disagreement error at one edge sample size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisagreementRow {
    /// Edges drawn per estimate.
    pub number_of_edges: usize,
    /// Relative errors over the repetitions.
    pub errors: ErrorSummary,
}

/// Output of the `disagreement` experiment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisagreementSummary {
    /// One row per edge sample size.
    pub rows: Vec<DisagreementRow>,
}

/// Opinion-estimation error within one degree bucket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BucketRow {
    /// Bucket index, low degrees first.
    pub bucket: usize,
    /// Mean absolute opinion error.
    pub mean_error: f64,
    /// Standard deviation of the absolute opinion error.
    pub std_error: f64,
    /// `mean_error` over the mean error of all buckets, when that is
    /// non-zero.
    pub normalized_mean_error: Option<f64>,
    /// `std_error` over the error deviation of all buckets, when that is
    /// non-zero.
    pub normalized_std_error: Option<f64>,
    /// Mean seconds per estimation call.
    pub mean_seconds: f64,
    /// Standard deviation of the seconds per estimation call.
    pub std_seconds: f64,
    /// `mean_seconds` relative to all buckets.
    pub normalized_mean_seconds: Option<f64>,
    /// `std_seconds` relative to all buckets.
    pub normalized_std_seconds: Option<f64>,
}

/// Output of the `buckets` experiment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BucketsSummary {
    /// One row per non-empty bucket.
    pub rows: Vec<BucketRow>,
}

/// Output of any command.
#[derive(Clone, Debug, PartialEq)]
pub enum RunSummary {
    /// See [`MeasuresSummary`].
    Measures(MeasuresSummary),
    /// See [`DisagreementSummary`].
    Disagreement(DisagreementSummary),
    /// See [`BucketsSummary`].
    Buckets(BucketsSummary),
}

impl RunSummary {
    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Measures(summary) => summary.rows.len(),
            Self::Disagreement(summary) => summary.rows.len(),
            Self::Buckets(summary) => summary.rows.len(),
        }
    }

    /// Whether the summary has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes `measure,trueValue,estimatedValue,relativeError,numSampledVertices`
/// rows. An undefined relative error is left empty.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
pub fn render_measures(summary: &MeasuresSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(
        writer,
        "measure,trueValue,estimatedValue,relativeError,numSampledVertices"
    )?;
    for row in &summary.rows {
        let comparison = &row.comparison;
        writeln!(
            writer,
            "{},{},{},{},{}",
            comparison.measure.label(),
            comparison.truth,
            comparison.estimate,
            optional(comparison.relative_error),
            row.sampled_vertices
        )?;
    }
    Ok(())
}

/// Writes `numberOfEdges,meanError,stdError` rows.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use whakaaro_cli::cli::{DisagreementRow, DisagreementSummary, render_disagreement};
/// # use whakaaro_core::ErrorSummary;
/// #
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let summary = DisagreementSummary {
///     rows: vec![DisagreementRow {
///         number_of_edges: 1000,
///         errors: ErrorSummary::from_samples(&[0.5, 0.25])?,
///     }],
/// };
/// let mut out = Vec::new();
/// render_disagreement(&summary, &mut out)?;
/// assert_eq!(String::from_utf8(out)?, "numberOfEdges,meanError,stdError\n1000,0.375,0.125\n");
/// # Ok(())
/// # }
/// ```
pub fn render_disagreement(summary: &DisagreementSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(writer, "numberOfEdges,meanError,stdError")?;
    for row in &summary.rows {
        writeln!(
            writer,
            "{},{},{}",
            row.number_of_edges, row.errors.mean, row.errors.std_dev
        )?;
    }
    Ok(())
}

/// Writes one row per bucket: raw error and timing statistics, then the same
/// statistics relative to all buckets. Undefined ratios are left empty.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
pub fn render_buckets(summary: &BucketsSummary, mut writer: impl Write) -> io::Result<()> {
    writeln!(
        writer,
        "bucket,meanError,stdError,normalizedMeanError,normalizedStdError,\
         meanSeconds,stdSeconds,normalizedMeanSeconds,normalizedStdSeconds"
    )?;
    for row in &summary.rows {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{}",
            row.bucket,
            row.mean_error,
            row.std_error,
            optional(row.normalized_mean_error),
            optional(row.normalized_std_error),
            row.mean_seconds,
            row.std_seconds,
            optional(row.normalized_mean_seconds),
            optional(row.normalized_std_seconds),
        )?;
    }
    Ok(())
}

/// Renders any summary as CSV.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
pub fn render_summary(summary: &RunSummary, writer: impl Write) -> io::Result<()> {
    match summary {
        RunSummary::Measures(measures) => render_measures(measures, writer),
        RunSummary::Disagreement(disagreement) => render_disagreement(disagreement, writer),
        RunSummary::Buckets(buckets) => render_buckets(buckets, writer),
    }
}
