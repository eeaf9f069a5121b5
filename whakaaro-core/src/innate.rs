//! Innate-opinion reconstruction from expressed opinions.
//!
//! At the Friedkin–Johnsen equilibrium `z_u = (s_u + Σ w(u,v) z_v) / (1 + W_u)`,
//! so `s_u = (1 + W_u) z_u − Σ w(u,v) z_v`. Low-degree vertices evaluate the
//! neighbour sum exactly. High-degree vertices estimate it with a
//! median-of-means over weighted neighbour draws.

use std::{
    collections::{BTreeMap, HashSet},
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::{debug, instrument};

use crate::{
    error::{EstimateError, GraphError, Result},
    graph::WeightedGraph,
};

const VERTEX_SEED_SPACING: u64 = 0x9E37_79B9_7F4A_7C15;
const SPLITMIX_MULT_A: u64 = 0xBF58_476D_1CE4_E5B9;
const SPLITMIX_MULT_B: u64 = 0x94D0_49BB_1331_11EB;

#[inline]
fn mix_vertex_seed(base_seed: u64, vertex: usize) -> u64 {
    splitmix64(base_seed ^ ((vertex as u64).wrapping_add(1)).wrapping_mul(VERTEX_SEED_SPACING))
}

#[inline]
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(VERTEX_SEED_SPACING);
    state = (state ^ (state >> 30)).wrapping_mul(SPLITMIX_MULT_A);
    state = (state ^ (state >> 27)).wrapping_mul(SPLITMIX_MULT_B);
    state ^ (state >> 31)
}

/// Configures and validates an [`InnateOpinionEstimator`].
///
/// # Examples
/// ```
/// use whakaaro_core::InnateEstimatorBuilder;
///
/// let estimator = InnateEstimatorBuilder::new()
///     .with_num_samples(400)
///     .with_repetitions(5)
///     .build()?;
/// assert_eq!(estimator.num_samples().get(), 400);
/// assert_eq!(estimator.repetitions().get(), 5);
/// # Ok::<(), whakaaro_core::EstimateError>(())
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InnateEstimatorBuilder {
    num_samples: usize,
    repetitions: usize,
}

impl Default for InnateEstimatorBuilder {
    fn default() -> Self {
        Self {
            num_samples: 200,
            repetitions: 3,
        }
    }
}

impl InnateEstimatorBuilder {
    /// Creates a builder with 200 neighbour draws and 3 repetitions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the number of neighbour draws per repetition.
    #[must_use]
    pub const fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    /// Overrides the number of repetitions whose median is taken.
    #[must_use]
    pub const fn with_repetitions(mut self, repetitions: usize) -> Self {
        self.repetitions = repetitions;
        self
    }

    /// Returns the configured number of draws per repetition.
    #[must_use]
    pub const fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Returns the configured number of repetitions.
    #[must_use]
    pub const fn repetitions(&self) -> usize {
        self.repetitions
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns [`EstimateError::InvalidParameter`] when either count is zero.
    pub fn build(self) -> Result<InnateOpinionEstimator> {
        let num_samples =
            NonZeroUsize::new(self.num_samples).ok_or(EstimateError::InvalidParameter {
                parameter: "num_samples",
                got: self.num_samples,
            })?;
        let repetitions =
            NonZeroUsize::new(self.repetitions).ok_or(EstimateError::InvalidParameter {
                parameter: "repetitions",
                got: self.repetitions,
            })?;
        Ok(InnateOpinionEstimator {
            num_samples,
            repetitions,
        })
    }
}

/// Innate opinions estimated for a batch of vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InnateBatch {
    /// Estimated innate opinion per distinct requested vertex.
    pub opinions: BTreeMap<usize, f64>,
    /// Wall-clock time spent estimating.
    pub elapsed: Duration,
}

/// Reconstructs innate opinions with a closed form and a median-of-means
/// neighbour sum.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InnateOpinionEstimator {
    num_samples: NonZeroUsize,
    repetitions: NonZeroUsize,
}

impl InnateOpinionEstimator {
    /// Returns a builder populated with the default parameters.
    #[must_use]
    pub fn builder() -> InnateEstimatorBuilder {
        InnateEstimatorBuilder::new()
    }

    /// Neighbour draws per repetition.
    #[must_use]
    pub const fn num_samples(&self) -> NonZeroUsize {
        self.num_samples
    }

    /// Repetitions whose median is taken.
    #[must_use]
    pub const fn repetitions(&self) -> NonZeroUsize {
        self.repetitions
    }

    /// Estimates the innate opinion of `vertex`, clamped to `[0, 1]`.
    ///
    /// When `num_samples` is at least the degree of `vertex` the neighbour
    /// sum is exact and `rng` is not consulted.
    ///
    /// # Errors
    /// Returns [`EstimateError::OpinionCountMismatch`] when `expressed` does
    /// not hold one opinion per vertex, and [`EstimateError::Graph`] for an
    /// unknown vertex.
    ///
    /// # Examples
    /// ```
    /// use rand::{SeedableRng, rngs::SmallRng};
    /// use whakaaro_core::{InnateOpinionEstimator, WeightedEdge, WeightedGraph};
    ///
    /// let graph = WeightedGraph::from_edges(2, [WeightedEdge::new(0, 1, 0.5)])?;
    /// let estimator = InnateOpinionEstimator::builder().build()?;
    /// let mut rng = SmallRng::seed_from_u64(1);
    /// // (1 + 0.5) × 0.6 − 0.5 × 0.4
    /// let innate = estimator.estimate(&graph, &[0.6, 0.4], 0, &mut rng)?;
    /// assert!((innate - 0.7).abs() < 1e-12);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn estimate<R>(
        &self,
        graph: &WeightedGraph,
        expressed: &[f64],
        vertex: usize,
        rng: &mut R,
    ) -> Result<f64>
    where
        R: Rng + ?Sized,
    {
        check_opinion_count(graph, expressed)?;
        self.estimate_checked(graph, expressed, vertex, rng)
    }

    fn estimate_checked<R>(
        &self,
        graph: &WeightedGraph,
        expressed: &[f64],
        vertex: usize,
        rng: &mut R,
    ) -> Result<f64>
    where
        R: Rng + ?Sized,
    {
        let own = opinion_of(expressed, vertex)?;
        let incident = graph.incident_weight(vertex)?;
        let degree = graph.degree(vertex)?;
        let neighbour_sum = if self.num_samples.get() >= degree {
            record_exact_evaluation();
            weighted_neighbor_sum(graph, expressed, vertex, 0..degree)?
        } else {
            self.median_of_means(graph, expressed, vertex, incident, rng)?
        };
        let innate = (1.0 + incident) * own - neighbour_sum;
        Ok(innate.clamp(0.0, 1.0))
    }

    fn median_of_means<R>(
        &self,
        graph: &WeightedGraph,
        expressed: &[f64],
        vertex: usize,
        incident: f64,
        rng: &mut R,
    ) -> Result<f64>
    where
        R: Rng + ?Sized,
    {
        let draws = self.num_samples.get();
        let mut sums = Vec::with_capacity(self.repetitions.get());
        for _ in 0..self.repetitions.get() {
            let indices = (0..draws)
                .map(|_| graph.weighted_random_neighbor_index(vertex, rng))
                .collect::<core::result::Result<Vec<_>, GraphError>>()?;
            let sum = weighted_neighbor_sum(graph, expressed, vertex, indices)?;
            sums.push(sum * incident / draws as f64);
        }
        record_weighted_draws(draws * self.repetitions.get());
        Ok(median(&mut sums))
    }

    /// Estimates every distinct vertex of `vertices` from one RNG stream and
    /// reports the elapsed time.
    ///
    /// # Errors
    /// Propagates the first error of [`Self::estimate`].
    #[instrument(
        name = "core.estimate_innate_batch",
        err,
        skip(self, graph, expressed, vertices, rng),
        fields(
            vertices = vertices.len(),
            num_samples = self.num_samples.get(),
            repetitions = self.repetitions.get(),
        ),
    )]
    pub fn estimate_many<R>(
        &self,
        graph: &WeightedGraph,
        expressed: &[f64],
        vertices: &[usize],
        rng: &mut R,
    ) -> Result<InnateBatch>
    where
        R: Rng + ?Sized,
    {
        check_opinion_count(graph, expressed)?;
        let started = Instant::now();
        let mut opinions = BTreeMap::new();
        for &vertex in vertices {
            if opinions.contains_key(&vertex) {
                continue;
            }
            let innate = self.estimate_checked(graph, expressed, vertex, rng)?;
            opinions.insert(vertex, innate);
        }
        Ok(finish_batch(opinions, started))
    }

    /// Estimates every distinct vertex of `vertices`, giving each vertex its
    /// own RNG derived from `seed` and the vertex id.
    ///
    /// The result depends only on `seed`, never on evaluation order, and
    /// matches the `parallel` variant exactly.
    ///
    /// # Errors
    /// Propagates the first error of [`Self::estimate`].
    pub fn estimate_many_seeded(
        &self,
        graph: &WeightedGraph,
        expressed: &[f64],
        vertices: &[usize],
        seed: u64,
    ) -> Result<InnateBatch> {
        check_opinion_count(graph, expressed)?;
        let started = Instant::now();
        let opinions = distinct(vertices)
            .into_iter()
            .map(|vertex| self.estimate_seeded(graph, expressed, vertex, seed))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(finish_batch(opinions, started))
    }

    /// Parallel counterpart of [`Self::estimate_many_seeded`] running on the
    /// rayon pool.
    ///
    /// # Errors
    /// Propagates an error of [`Self::estimate`].
    #[cfg(feature = "parallel")]
    #[cfg_attr(docsrs, doc(cfg(feature = "parallel")))]
    #[instrument(
        name = "core.estimate_innate_batch_parallel",
        err,
        skip(self, graph, expressed, vertices),
        fields(vertices = vertices.len(), threads = rayon::current_num_threads()),
    )]
    pub fn estimate_many_parallel(
        &self,
        graph: &WeightedGraph,
        expressed: &[f64],
        vertices: &[usize],
        seed: u64,
    ) -> Result<InnateBatch> {
        use rayon::prelude::*;

        check_opinion_count(graph, expressed)?;
        let started = Instant::now();
        let opinions = distinct(vertices)
            .into_par_iter()
            .map(|vertex| self.estimate_seeded(graph, expressed, vertex, seed))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .collect();
        Ok(finish_batch(opinions, started))
    }

    fn estimate_seeded(
        &self,
        graph: &WeightedGraph,
        expressed: &[f64],
        vertex: usize,
        seed: u64,
    ) -> Result<(usize, f64)> {
        let mut rng = SmallRng::seed_from_u64(mix_vertex_seed(seed, vertex));
        let innate = self.estimate_checked(graph, expressed, vertex, &mut rng)?;
        Ok((vertex, innate))
    }
}

fn check_opinion_count(graph: &WeightedGraph, expressed: &[f64]) -> Result<()> {
    if expressed.len() == graph.num_vertices() {
        Ok(())
    } else {
        Err(EstimateError::OpinionCountMismatch {
            expected: graph.num_vertices(),
            actual: expressed.len(),
        })
    }
}

fn opinion_of(expressed: &[f64], vertex: usize) -> Result<f64> {
    expressed.get(vertex).copied().ok_or_else(|| {
        GraphError::VertexOutOfRange {
            vertex,
            num_vertices: expressed.len(),
        }
        .into()
    })
}

fn weighted_neighbor_sum<I>(
    graph: &WeightedGraph,
    expressed: &[f64],
    vertex: usize,
    indices: I,
) -> Result<f64>
where
    I: IntoIterator<Item = usize>,
{
    let neighbors = graph.neighbors(vertex)?;
    let mut sum = 0.0;
    for index in indices {
        let neighbor = *neighbors
            .get(index)
            .ok_or(GraphError::NeighborIndexOutOfRange {
                vertex,
                index,
                degree: neighbors.len(),
            })?;
        sum += graph.edge_weight(vertex, index)? * opinion_of(expressed, neighbor)?;
    }
    Ok(sum)
}

/// Median of `values`; the mean of the two middle values for even counts.
fn median(values: &mut [f64]) -> f64 {
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    match (values.len() % 2, values.get(mid)) {
        (_, None) => 0.0,
        (1, Some(&middle)) => middle,
        (_, Some(&upper)) => {
            let lower = mid.checked_sub(1).and_then(|i| values.get(i)).copied().unwrap_or(upper);
            (lower + upper) / 2.0
        }
    }
}

fn distinct(vertices: &[usize]) -> Vec<usize> {
    let mut seen = HashSet::with_capacity(vertices.len());
    vertices
        .iter()
        .copied()
        .filter(|vertex| seen.insert(*vertex))
        .collect()
}

fn finish_batch(opinions: BTreeMap<usize, f64>, started: Instant) -> InnateBatch {
    let elapsed = started.elapsed();
    debug!(estimated = opinions.len(), elapsed_ms = elapsed.as_millis(), "innate batch finished");
    InnateBatch { opinions, elapsed }
}

#[cfg(feature = "metrics")]
fn record_weighted_draws(count: usize) {
    metrics::counter!("innate_weighted_draws").increment(count as u64);
}

#[cfg(not(feature = "metrics"))]
fn record_weighted_draws(_count: usize) {}

#[cfg(feature = "metrics")]
fn record_exact_evaluation() {
    metrics::counter!("innate_exact_evaluations").increment(1);
}

#[cfg(not(feature = "metrics"))]
fn record_exact_evaluation() {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::WeightedEdge;
    use rstest::rstest;

    #[rstest]
    #[case(vec![3.0, 1.0, 2.0], 2.0)]
    #[case(vec![4.0, 1.0, 3.0, 2.0], 2.5)]
    #[case(vec![7.0], 7.0)]
    fn median_averages_middle_pair(#[case] mut values: Vec<f64>, #[case] expected: f64) {
        assert_eq!(median(&mut values), expected);
    }

    #[rstest]
    #[case(0, 3, "num_samples")]
    #[case(10, 0, "repetitions")]
    fn builder_rejects_zero_counts(
        #[case] num_samples: usize,
        #[case] repetitions: usize,
        #[case] parameter: &str,
    ) {
        let err = InnateEstimatorBuilder::new()
            .with_num_samples(num_samples)
            .with_repetitions(repetitions)
            .build()
            .expect_err("zero counts must be rejected");
        assert!(matches!(
            err,
            EstimateError::InvalidParameter { parameter: p, got: 0 } if p == parameter
        ));
    }

    #[test]
    fn builder_defaults_follow_experiment_settings() {
        let builder = InnateOpinionEstimator::builder();
        assert_eq!(builder.num_samples(), 200);
        assert_eq!(builder.repetitions(), 3);
    }

    /// Replays the estimator's RNG stream and checks that the median of the
    /// rescaled repetition sums is what gets returned.
    #[rstest]
    #[case(3)]
    #[case(4)]
    fn median_of_means_takes_median_of_rescaled_repetitions(#[case] repetitions: usize) {
        let graph = WeightedGraph::from_edges(
            7,
            (1..=6).map(|leaf| WeightedEdge::new(0, leaf, leaf as f64)),
        )
        .expect("star edges are valid");
        let expressed = [0.5, 0.9, 0.1, 0.7, 0.3, 0.6, 0.2];
        let incident = graph.incident_weight(0).expect("centre exists");
        let estimator = InnateOpinionEstimator::builder()
            .with_num_samples(2)
            .with_repetitions(repetitions)
            .build()
            .expect("positive counts");

        let mut replay = SmallRng::seed_from_u64(21);
        let mut sums: Vec<f64> = (0..repetitions)
            .map(|_| {
                let indices: Vec<usize> = (0..2)
                    .map(|_| graph.weighted_random_neighbor_index(0, &mut replay).expect("centre has neighbours"))
                    .collect();
                weighted_neighbor_sum(&graph, &expressed, 0, indices).expect("indices exist") * incident
                    / 2.0
            })
            .collect();
        sums.sort_unstable_by(f64::total_cmp);
        let expected = if repetitions % 2 == 1 {
            sums[repetitions / 2]
        } else {
            (sums[repetitions / 2 - 1] + sums[repetitions / 2]) / 2.0
        };

        let mut rng = SmallRng::seed_from_u64(21);
        let actual = estimator
            .median_of_means(&graph, &expressed, 0, incident, &mut rng)
            .expect("centre has neighbours");
        assert_eq!(actual, expected);
    }

    #[test]
    fn vertex_seeds_differ_per_vertex() {
        assert_ne!(mix_vertex_seed(7, 0), mix_vertex_seed(7, 1));
        assert_eq!(mix_vertex_seed(7, 4), mix_vertex_seed(7, 4));
    }

    #[test]
    fn isolated_vertex_keeps_its_expressed_opinion() {
        let graph = WeightedGraph::from_edges(3, [WeightedEdge::unit(0, 1)]).expect("valid edge");
        let estimator = InnateOpinionEstimator::builder().build().expect("defaults");
        let mut rng = SmallRng::seed_from_u64(0);
        let innate = estimator
            .estimate(&graph, &[0.1, 0.2, 0.35], 2, &mut rng)
            .expect("vertex exists");
        assert_eq!(innate, 0.35);
    }

    #[test]
    fn opinion_vector_must_cover_graph() {
        let graph = WeightedGraph::from_edges(3, [WeightedEdge::unit(0, 1)]).expect("valid edge");
        let estimator = InnateOpinionEstimator::builder().build().expect("defaults");
        let mut rng = SmallRng::seed_from_u64(0);
        assert_eq!(
            estimator.estimate(&graph, &[0.1, 0.2], 0, &mut rng),
            Err(EstimateError::OpinionCountMismatch {
                expected: 3,
                actual: 2
            })
        );
    }
}
