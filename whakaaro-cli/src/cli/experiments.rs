//! The three experiments: measure estimation, edge-sampled disagreement and
//! degree-bucket opinion error.

use std::{collections::BTreeMap, time::Duration};

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{Span, debug, field, info, instrument, warn};
use whakaaro_core::{
    EdgeDisagreementEstimator, ErrorSummary, EstimateError, GroundTruthOracle,
    InnateOpinionEstimator, Measure, OpinionOracle, OpinionSample, SumSource, VertexEstimator,
    absolute_error, resample, sample_edge_indices, sample_vertices,
};
use whakaaro_providers_text::{Dataset, DatasetPaths, load_edge_list, load_measures, load_opinions};

use super::{
    commands::{BucketsCommand, CliError, DisagreementCommand, Given, MeasuresCommand, OpinionSourceArgs},
    render::{
        BucketRow, BucketsSummary, DisagreementRow, DisagreementSummary, MeasureRow,
        MeasuresSummary,
    },
};

/// Opinions of a set of vertices, one side known and the other estimated.
struct LabelledVertices {
    expressed: BTreeMap<usize, f64>,
    innate: BTreeMap<usize, f64>,
    elapsed: Duration,
    given: Given,
}

impl LabelledVertices {
    /// The side that was estimated rather than looked up.
    const fn estimated(&self) -> &BTreeMap<usize, f64> {
        match self.given {
            Given::Expressed => &self.innate,
            Given::Innate => &self.expressed,
        }
    }

    const fn sum_source(&self) -> SumSource {
        match self.given {
            Given::Expressed => SumSource::Expressed,
            Given::Innate => SumSource::Innate,
        }
    }
}

/// Labels `vertices` with both opinions: the known side from the dataset,
/// the other from the innate estimator or the walk oracle.
#[instrument(
    name = "cli.label_vertices",
    err,
    skip(dataset, paths, source, vertices),
    fields(given = ?source.given, vertices = vertices.len(), seconds = field::Empty),
)]
fn label_vertices(
    dataset: &Dataset,
    paths: &DatasetPaths,
    source: &OpinionSourceArgs,
    vertices: &[usize],
    seed: u64,
) -> Result<LabelledVertices, CliError> {
    let walk = source.oracle.walk_config()?;
    let labelled = match source.given {
        Given::Expressed => {
            let known = GroundTruthOracle::new("expressed", &dataset.expressed)
                .estimate_opinions(vertices, &walk)?;
            let estimator = InnateOpinionEstimator::builder()
                .with_num_samples(source.num_samples)
                .with_repetitions(source.median_repetitions)
                .build()?;
            let batch =
                estimator.estimate_many_parallel(&dataset.graph, &dataset.expressed, vertices, seed)?;
            LabelledVertices {
                expressed: known.opinions,
                innate: batch.opinions,
                elapsed: batch.elapsed,
                given: Given::Expressed,
            }
        }
        Given::Innate => {
            let oracle = source
                .oracle
                .process_oracle(paths.graph.clone(), paths.innate.clone())
                .ok_or(CliError::MissingOracle {
                    command: "--given innate",
                })?;
            let known = GroundTruthOracle::new("innate", &dataset.innate)
                .estimate_opinions(vertices, &walk)?;
            let answer = oracle.estimate_opinions(vertices, &walk)?;
            LabelledVertices {
                expressed: answer.opinions,
                innate: known.opinions,
                elapsed: answer.elapsed,
                given: Given::Innate,
            }
        }
    };
    Span::current().record("seconds", labelled.elapsed.as_secs_f64());
    Ok(labelled)
}

/// Draws the largest sample once, labels it, then estimates every measure
/// from a resample of each requested size.
#[instrument(
    name = "cli.measures",
    err,
    skip(command),
    fields(graph = %command.dataset.graph.display(), sizes = command.sample_sizes.len()),
)]
pub(super) fn run_measures(command: &MeasuresCommand) -> Result<MeasuresSummary, CliError> {
    let paths = command.dataset.paths();
    let dataset = Dataset::load(&paths)?;
    let mut rng = SmallRng::seed_from_u64(command.seed);

    let largest = command.sample_sizes.iter().copied().max().unwrap_or(0);
    let pool = sample_vertices(dataset.graph.num_vertices(), largest, &mut rng)?;
    let labelled = label_vertices(&dataset, &paths, &command.source, &pool, rng.r#gen())?;

    let estimator = VertexEstimator::new(&dataset.graph).with_scale(command.scale.into());
    let mut rows = Vec::new();
    for &size in &command.sample_sizes {
        let draws = resample(&pool, size, &mut rng)?;
        let expressed =
            OpinionSample::from_draws(draws.iter().copied(), |v| labelled.expressed.get(&v).copied());
        let innate =
            OpinionSample::from_draws(draws.iter().copied(), |v| labelled.innate.get(&v).copied());
        let estimates = estimator.estimate_all(&expressed, &innate, labelled.sum_source())?;
        rows.extend(
            estimates
                .compare(&dataset.truth)
                .into_iter()
                .map(|comparison| MeasureRow {
                    comparison,
                    sampled_vertices: size,
                }),
        );
        debug!(size, distinct = expressed.len(), "sample size estimated");
    }
    if rows.is_empty() {
        warn!("measures file matched no estimated measure");
    }

    let labelled_vertices = labelled.estimated().len();
    let opinion_seconds = labelled.elapsed.as_secs_f64();
    info!(labelled_vertices, opinion_seconds, "opinions obtained");
    Ok(MeasuresSummary {
        rows,
        labelled_vertices,
        opinion_seconds,
    })
}

/// Repeatedly estimates disagreement from `k` sampled edges for each `k` and
/// summarises the relative error.
#[instrument(
    name = "cli.disagreement",
    err,
    skip(command),
    fields(edges = %command.edges.display(), oracle = field::Empty),
)]
pub(super) fn run_disagreement(
    command: &DisagreementCommand,
) -> Result<DisagreementSummary, CliError> {
    let edge_list = load_edge_list(&command.edges)?;
    let expressed = load_opinions(&command.expressed)?;
    let truth = load_measures(&command.measures)?
        .get(Measure::Disagreement)
        .ok_or(CliError::MissingMeasure {
            measure: Measure::Disagreement,
        })?;
    if expressed.len() != edge_list.num_vertices {
        return Err(EstimateError::OpinionCountMismatch {
            expected: edge_list.num_vertices,
            actual: expressed.len(),
        }
        .into());
    }

    let oracle = match (&command.oracle.oracle, &command.innate) {
        (Some(_), Some(innate)) => command
            .oracle
            .process_oracle(command.edges.clone(), innate.clone()),
        (Some(_), None) => return Err(CliError::MissingInnate),
        (None, Some(_)) => {
            return Err(CliError::MissingOracle {
                command: "disagreement",
            });
        }
        (None, None) => None,
    };
    if let Some(oracle) = &oracle {
        Span::current().record("oracle", field::display(oracle.name()));
    }
    let walk = command.oracle.walk_config()?;

    let estimator = EdgeDisagreementEstimator::new(&edge_list.edges);
    let mut rng = SmallRng::seed_from_u64(command.seed);
    let mut rows = Vec::with_capacity(command.edge_counts.len());
    for &number_of_edges in &command.edge_counts {
        let mut errors = Vec::with_capacity(command.repetitions);
        for _ in 0..command.repetitions {
            let indices = sample_edge_indices(estimator.num_edges(), number_of_edges, &mut rng)?;
            let estimate = match &oracle {
                Some(oracle) => {
                    let endpoints: Vec<usize> = estimator
                        .endpoints(&indices)?
                        .into_iter()
                        .flat_map(|(left, right)| [left, right])
                        .collect();
                    let answer = oracle.estimate_opinions(&endpoints, &walk)?;
                    estimator.estimate_indices(&indices, |v| answer.opinions.get(&v).copied())?
                }
                None => estimator.estimate_indices(&indices, |v| expressed.get(v).copied())?,
            };
            errors.push(EdgeDisagreementEstimator::relative_error(&estimate, truth)?);
        }
        let errors = ErrorSummary::from_samples(&errors)?;
        debug!(number_of_edges, mean = errors.mean, "edge count finished");
        rows.push(DisagreementRow {
            number_of_edges,
            errors,
        });
    }
    Ok(DisagreementSummary { rows })
}

/// Absolute opinion errors and per-call seconds collected for one bucket.
#[derive(Debug, Default)]
pub(super) struct BucketTally {
    pub(super) errors: Vec<f64>,
    pub(super) seconds: Vec<f64>,
}

/// Samples vertices from each degree bucket, estimates their opinions and
/// reports the absolute error per bucket.
#[instrument(
    name = "cli.buckets",
    err,
    skip(command),
    fields(graph = %command.dataset.graph.display(), buckets = command.buckets),
)]
pub(super) fn run_buckets(command: &BucketsCommand) -> Result<BucketsSummary, CliError> {
    let paths = command.dataset.paths();
    let dataset = Dataset::load(&paths)?;
    let buckets = dataset.graph.degree_buckets(command.buckets)?;
    let truth = match command.source.given {
        Given::Expressed => &dataset.innate,
        Given::Innate => &dataset.expressed,
    };

    let mut rng = SmallRng::seed_from_u64(command.seed);
    let mut tallies: Vec<BucketTally> = buckets.iter().map(|_| BucketTally::default()).collect();
    for repetition in 0..command.repetitions {
        for (members, tally) in buckets.iter().zip(&mut tallies) {
            if members.is_empty() {
                continue;
            }
            let draws = resample(members, command.per_bucket, &mut rng)?;
            let labelled = label_vertices(&dataset, &paths, &command.source, &draws, rng.r#gen())?;
            let errors: Vec<f64> = labelled
                .estimated()
                .iter()
                .filter_map(|(&vertex, &estimate)| {
                    truth.get(vertex).map(|&exact| absolute_error(estimate, exact))
                })
                .collect();
            tally.errors.extend(errors);
            tally.seconds.push(labelled.elapsed.as_secs_f64());
        }
        debug!(repetition, "bucket sweep finished");
    }

    Ok(BucketsSummary {
        rows: summarise_buckets(&tallies)?,
    })
}

/// `value / overall`, or `None` when the overall statistic is zero.
fn relative_to(value: f64, overall: f64) -> Option<f64> {
    (overall > 0.0).then(|| value / overall)
}

/// One row per bucket that collected errors, each statistic also expressed
/// relative to the same statistic over every bucket.
pub(super) fn summarise_buckets(tallies: &[BucketTally]) -> Result<Vec<BucketRow>, CliError> {
    let all_errors: Vec<f64> = tallies.iter().flat_map(|tally| tally.errors.iter().copied()).collect();
    let all_seconds: Vec<f64> = tallies.iter().flat_map(|tally| tally.seconds.iter().copied()).collect();
    let overall_errors = ErrorSummary::from_samples(&all_errors)?;
    let overall_seconds = ErrorSummary::from_samples(&all_seconds)?;

    let mut rows = Vec::new();
    for (bucket, tally) in tallies.iter().enumerate() {
        if tally.errors.is_empty() {
            continue;
        }
        let errors = ErrorSummary::from_samples(&tally.errors)?;
        let seconds = ErrorSummary::from_samples(&tally.seconds)?;
        rows.push(BucketRow {
            bucket,
            mean_error: errors.mean,
            std_error: errors.std_dev,
            normalized_mean_error: relative_to(errors.mean, overall_errors.mean),
            normalized_std_error: relative_to(errors.std_dev, overall_errors.std_dev),
            mean_seconds: seconds.mean,
            std_seconds: seconds.std_dev,
            normalized_mean_seconds: relative_to(seconds.mean, overall_seconds.mean),
            normalized_std_seconds: relative_to(seconds.std_dev, overall_seconds.std_dev),
        });
    }
    Ok(rows)
}
