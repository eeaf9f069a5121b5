//! Population statistics estimated from vertex subsamples.
//!
//! Every estimator scales a sample sum by `n / k`, where `n` is the number
//! of vertices and `k` the sample size under the configured
//! [`SampleScale`]. Paired estimators walk the expressed sample and use the
//! vertices that also carry an innate opinion.

#[cfg(test)]
mod tests;

use tracing::{debug, instrument};

use crate::{
    error::{EstimateError, Result},
    graph::WeightedGraph,
    measure::{GroundTruth, Measure, MeasureComparison},
    sample::{OpinionSample, SampleScale},
};

/// Which sample the sum of opinions is estimated from.
///
/// Under the Friedkin–Johnsen equilibrium expressed and innate opinions have
/// the same sum, so either sample estimates it. Experiments prefer the exact
/// one.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SumSource {
    /// Use the expressed opinions.
    #[default]
    Expressed,
    /// Use the innate opinions.
    Innate,
}

/// Stateless estimators over one graph's scale factors.
///
/// # Examples
/// ```
/// use whakaaro_core::{OpinionSample, VertexEstimator, WeightedEdge, WeightedGraph};
///
/// let graph = WeightedGraph::from_edges(4, [WeightedEdge::unit(0, 1), WeightedEdge::unit(2, 3)])?;
/// let estimator = VertexEstimator::new(&graph);
/// let expressed = OpinionSample::from_values([(0, 0.5), (3, 1.0)]);
/// // (4 / 2) × (0.25 + 1.0)
/// assert_eq!(estimator.controversy(&expressed)?, 2.5);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct VertexEstimator<'g> {
    graph: &'g WeightedGraph,
    scale: SampleScale,
}

impl<'g> VertexEstimator<'g> {
    /// Creates an estimator that counts distinct sampled vertices.
    #[must_use]
    pub const fn new(graph: &'g WeightedGraph) -> Self {
        Self {
            graph,
            scale: SampleScale::DistinctVertices,
        }
    }

    /// Overrides how the sample size is counted.
    #[must_use]
    pub const fn with_scale(mut self, scale: SampleScale) -> Self {
        self.scale = scale;
        self
    }

    /// Returns the configured sample-size policy.
    #[must_use]
    pub const fn scale(&self) -> SampleScale {
        self.scale
    }

    /// Returns the graph the estimates are scaled to.
    #[must_use]
    pub const fn graph(&self) -> &'g WeightedGraph {
        self.graph
    }

    /// Mean of the sampled opinions.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when the sample is empty.
    pub fn average_opinion(&self, sample: &OpinionSample) -> Result<f64> {
        let (sum, k) = self.single_sum(sample, |z| z);
        if k == 0 {
            return Err(empty("average opinion"));
        }
        Ok(sum / k as f64)
    }

    /// `n × average_opinion`.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when the sample is empty.
    pub fn sum_of_opinions(&self, sample: &OpinionSample) -> Result<f64> {
        Ok(self.graph.num_vertices() as f64 * self.average_opinion(sample)?)
    }

    /// `(n / k) Σ z²`.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when the sample is empty.
    pub fn controversy(&self, expressed: &OpinionSample) -> Result<f64> {
        self.scaled_single(expressed, "controversy", |z| z * z)
    }

    /// Squared norm of the innate opinions, `(n / k) Σ s²`.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when the sample is empty.
    pub fn squared_norm(&self, innate: &OpinionSample) -> Result<f64> {
        self.scaled_single(innate, "squared norm", |s| s * s)
    }

    /// `(n / k) Σ (z − average)²`.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when the sample is empty.
    pub fn polarization(&self, expressed: &OpinionSample, average: f64) -> Result<f64> {
        self.scaled_single(expressed, "polarization", |z| (z - average).powi(2))
    }

    /// `(n / k) Σ (z − s)²`.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when no expressed vertex carries
    /// an innate opinion.
    pub fn internal_conflict(&self, expressed: &OpinionSample, innate: &OpinionSample) -> Result<f64> {
        self.scaled_paired(expressed, innate, "internal conflict", |z, s| (z - s).powi(2))
    }

    /// `(n / k) Σ z·s`, clamped to `[0, n]`.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when no expressed vertex carries
    /// an innate opinion.
    pub fn disagreement_controversy(
        &self,
        expressed: &OpinionSample,
        innate: &OpinionSample,
    ) -> Result<f64> {
        let raw = self.scaled_paired(expressed, innate, "disagreement-controversy", |z, s| z * s)?;
        Ok(raw.clamp(0.0, self.graph.num_vertices() as f64))
    }

    /// `(squared_norm − controversy − internal_conflict) / 2`, clamped to
    /// `[0, total_edge_weight]`.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when any of the three terms
    /// has no usable sample.
    ///
    /// # Examples
    /// ```
    /// use whakaaro_core::{OpinionSample, VertexEstimator, WeightedEdge, WeightedGraph};
    ///
    /// let graph = WeightedGraph::from_edges(2, [WeightedEdge::unit(0, 1)])?;
    /// let estimator = VertexEstimator::new(&graph);
    /// let expressed = OpinionSample::from_values([(0, 0.0), (1, 0.0)]);
    /// let innate = OpinionSample::from_values([(0, 1.0), (1, 1.0)]);
    /// // (2 − 0 − 2) / 2
    /// assert_eq!(estimator.disagreement(&expressed, &innate)?, 0.0);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn disagreement(&self, expressed: &OpinionSample, innate: &OpinionSample) -> Result<f64> {
        let squared_norm = self.squared_norm(innate)?;
        let controversy = self.controversy(expressed)?;
        let internal_conflict = self.internal_conflict(expressed, innate)?;
        let raw = (squared_norm - controversy - internal_conflict) / 2.0;
        Ok(raw.clamp(0.0, self.graph.total_edge_weight()))
    }

    /// Estimates every [`Measure`] from one pair of samples.
    ///
    /// Polarization is centred on `sum_of_opinions / n`, with the sum taken
    /// from the sample named by `sum_source`.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when either sample is empty
    /// or the two share no vertex.
    #[instrument(
        name = "core.estimate_measures",
        skip(self, expressed, innate),
        fields(expressed = expressed.len(), innate = innate.len()),
    )]
    pub fn estimate_all(
        &self,
        expressed: &OpinionSample,
        innate: &OpinionSample,
        sum_source: SumSource,
    ) -> Result<MeasureEstimates> {
        let controversy = self.controversy(expressed)?;
        let sum_of_opinions = match sum_source {
            SumSource::Expressed => self.sum_of_opinions(expressed)?,
            SumSource::Innate => self.sum_of_opinions(innate)?,
        };
        let average = sum_of_opinions / self.graph.num_vertices() as f64;
        let estimates = MeasureEstimates {
            controversy,
            sum_of_opinions,
            polarization: self.polarization(expressed, average)?,
            internal_conflict: self.internal_conflict(expressed, innate)?,
            disagreement_controversy: self.disagreement_controversy(expressed, innate)?,
            squared_norm: self.squared_norm(innate)?,
            disagreement: self.disagreement(expressed, innate)?,
        };
        debug!(controversy, sum_of_opinions, "measures estimated");
        Ok(estimates)
    }

    fn single_sum<F>(&self, sample: &OpinionSample, term: F) -> (f64, usize)
    where
        F: Fn(f64) -> f64,
    {
        sample
            .weighted(self.scale)
            .fold((0.0, 0), |(sum, k), (_, value, multiplicity)| {
                (sum + multiplicity as f64 * term(value), k + multiplicity)
            })
    }

    fn scaled_single<F>(&self, sample: &OpinionSample, estimator: &'static str, term: F) -> Result<f64>
    where
        F: Fn(f64) -> f64,
    {
        let (sum, k) = self.single_sum(sample, term);
        self.scale_to_population(sum, k, estimator)
    }

    fn scaled_paired<F>(
        &self,
        expressed: &OpinionSample,
        innate: &OpinionSample,
        estimator: &'static str,
        term: F,
    ) -> Result<f64>
    where
        F: Fn(f64, f64) -> f64,
    {
        let (sum, k) = expressed
            .weighted(self.scale)
            .filter_map(|(vertex, z, multiplicity)| {
                innate.get(vertex).map(|s| (z, s, multiplicity))
            })
            .fold((0.0, 0), |(sum, k), (z, s, multiplicity)| {
                (sum + multiplicity as f64 * term(z, s), k + multiplicity)
            });
        self.scale_to_population(sum, k, estimator)
    }

    fn scale_to_population(&self, sum: f64, k: usize, estimator: &'static str) -> Result<f64> {
        if k == 0 {
            return Err(empty(estimator));
        }
        Ok(self.graph.num_vertices() as f64 / k as f64 * sum)
    }
}

const fn empty(estimator: &'static str) -> EstimateError {
    EstimateError::EmptySample { estimator }
}

/// Estimates of every [`Measure`] from one pair of samples.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureEstimates {
    /// Estimated controversy.
    pub controversy: f64,
    /// Estimated sum of opinions.
    pub sum_of_opinions: f64,
    /// Estimated polarization.
    pub polarization: f64,
    /// Estimated internal conflict.
    pub internal_conflict: f64,
    /// Estimated disagreement-controversy.
    pub disagreement_controversy: f64,
    /// Estimated squared norm of the innate opinions.
    pub squared_norm: f64,
    /// Estimated disagreement.
    pub disagreement: f64,
}

impl MeasureEstimates {
    /// Returns the estimate of `measure`.
    #[must_use]
    pub const fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Controversy => self.controversy,
            Measure::SumOfOpinions => self.sum_of_opinions,
            Measure::Polarization => self.polarization,
            Measure::InternalConflict => self.internal_conflict,
            Measure::DisagreementControversy => self.disagreement_controversy,
            Measure::SquaredNorm => self.squared_norm,
            Measure::Disagreement => self.disagreement,
        }
    }

    /// Iterates `(measure, estimate)` in [`Measure::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Measure, f64)> + '_ {
        Measure::ALL.into_iter().map(|measure| (measure, self.get(measure)))
    }

    /// Pairs every estimate that has a known true value with it.
    #[must_use]
    pub fn compare(&self, truth: &GroundTruth) -> Vec<MeasureComparison> {
        self.iter()
            .filter_map(|(measure, estimate)| {
                truth
                    .get(measure)
                    .map(|value| MeasureComparison::new(measure, value, estimate))
            })
            .collect()
    }
}
