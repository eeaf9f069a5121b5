//! Disagreement estimated from a uniform sample of edges.

use rand::Rng;
use tracing::{debug, instrument};

use crate::{
    error::{EstimateError, Result},
    measure::relative_error,
    sample::sample_edge_indices,
};

/// Outcome of one edge-sampled disagreement estimate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeEstimate {
    /// Estimated disagreement, `m / evaluated × Σ (z_u − z_v)²`.
    pub disagreement: f64,
    /// Sampled edges whose endpoints both carried an opinion.
    pub evaluated: usize,
    /// Sampled edges skipped for a missing endpoint opinion.
    pub skipped: usize,
}

/// Estimates disagreement over an unweighted edge list.
///
/// # Examples
/// ```
/// use whakaaro_core::EdgeDisagreementEstimator;
///
/// let edges = [(0, 1), (1, 2), (2, 3), (3, 0)];
/// let opinions = [0.1, 0.9, 0.2, 0.8];
/// let estimator = EdgeDisagreementEstimator::new(&edges);
/// let estimate = estimator.estimate_indices(&[0, 1, 2, 3], |v| opinions.get(v).copied())?;
/// assert!((estimate.disagreement - 1.98).abs() < 1e-12);
/// # Ok::<(), whakaaro_core::EstimateError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct EdgeDisagreementEstimator<'e> {
    edges: &'e [(usize, usize)],
}

impl<'e> EdgeDisagreementEstimator<'e> {
    /// Wraps an edge list, each undirected edge listed once.
    #[must_use]
    pub const fn new(edges: &'e [(usize, usize)]) -> Self {
        Self { edges }
    }

    /// Number of edges `m` in the list.
    #[must_use]
    pub const fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Resolves sampled indices to their endpoint pairs.
    ///
    /// # Errors
    /// Returns [`EstimateError::EdgeIndexOutOfRange`] for an index past the
    /// end of the list.
    pub fn endpoints(&self, indices: &[usize]) -> Result<Vec<(usize, usize)>> {
        indices.iter().map(|&index| self.edge(index)).collect()
    }

    fn edge(&self, index: usize) -> Result<(usize, usize)> {
        self.edges
            .get(index)
            .copied()
            .ok_or(EstimateError::EdgeIndexOutOfRange {
                index,
                num_edges: self.edges.len(),
            })
    }

    /// Estimates disagreement from already drawn edge indices.
    ///
    /// Edges with an endpoint lacking an opinion are skipped and the scale
    /// factor uses the number of edges actually evaluated.
    ///
    /// # Errors
    /// Returns [`EstimateError::EdgeIndexOutOfRange`] for unknown indices and
    /// [`EstimateError::EmptySample`] when no sampled edge could be
    /// evaluated.
    #[instrument(
        name = "core.estimate_edge_disagreement",
        err,
        skip(self, indices, opinion),
        fields(sampled = indices.len(), num_edges = self.edges.len()),
    )]
    pub fn estimate_indices<F>(&self, indices: &[usize], opinion: F) -> Result<EdgeEstimate>
    where
        F: Fn(usize) -> Option<f64>,
    {
        let mut sum = 0.0;
        let mut evaluated = 0_usize;
        let mut skipped = 0_usize;
        for &index in indices {
            let (left, right) = self.edge(index)?;
            match (opinion(left), opinion(right)) {
                (Some(z_left), Some(z_right)) => {
                    sum += (z_left - z_right).powi(2);
                    evaluated += 1;
                }
                _ => skipped += 1,
            }
        }
        if evaluated == 0 {
            return Err(EstimateError::EmptySample {
                estimator: "edge disagreement",
            });
        }
        if skipped > 0 {
            debug!(skipped, evaluated, "edges without endpoint opinions were skipped");
        }
        Ok(EdgeEstimate {
            disagreement: sum * self.edges.len() as f64 / evaluated as f64,
            evaluated,
            skipped,
        })
    }

    /// Draws `number_of_edges` indices uniformly with replacement and
    /// estimates disagreement from them.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when the edge list is empty,
    /// `number_of_edges` is zero, or no sampled edge could be evaluated.
    pub fn estimate<R, F>(&self, number_of_edges: usize, opinion: F, rng: &mut R) -> Result<EdgeEstimate>
    where
        R: Rng + ?Sized,
        F: Fn(usize) -> Option<f64>,
    {
        let indices = sample_edge_indices(self.edges.len(), number_of_edges, rng)?;
        self.estimate_indices(&indices, opinion)
    }

    /// `|estimate − truth| / truth` for a disagreement estimate.
    ///
    /// # Errors
    /// Returns [`EstimateError::UndefinedRelativeError`] when `truth` is zero.
    pub fn relative_error(estimate: &EdgeEstimate, truth: f64) -> Result<f64> {
        relative_error(estimate.disagreement, truth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};

    const CYCLE: [(usize, usize); 4] = [(0, 1), (1, 2), (2, 3), (3, 0)];
    const OPINIONS: [f64; 4] = [0.1, 0.9, 0.2, 0.8];

    #[test]
    fn repeated_edges_are_scaled_by_sample_size() {
        let estimator = EdgeDisagreementEstimator::new(&CYCLE);
        let estimate = estimator
            .estimate_indices(&[0, 0], |v| OPINIONS.get(v).copied())
            .expect("edges have opinions");
        // 4 / 2 × 2 × 0.64
        assert!((estimate.disagreement - 2.56).abs() < 1e-12);
        assert_eq!(estimate.evaluated, 2);
    }

    #[test]
    fn missing_endpoint_opinions_shrink_the_denominator() {
        let estimator = EdgeDisagreementEstimator::new(&CYCLE);
        let estimate = estimator
            .estimate_indices(&[0, 1, 2], |v| (v != 3).then(|| OPINIONS[v]))
            .expect("two edges have opinions");
        assert_eq!(estimate.skipped, 1);
        assert_eq!(estimate.evaluated, 2);
        // 4 / 2 × (0.64 + 0.49)
        assert!((estimate.disagreement - 2.26).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_and_empty_inputs_are_errors() {
        let estimator = EdgeDisagreementEstimator::new(&CYCLE);
        assert_eq!(
            estimator.estimate_indices(&[4], |_| Some(0.0)),
            Err(EstimateError::EdgeIndexOutOfRange {
                index: 4,
                num_edges: 4
            })
        );
        assert!(matches!(
            estimator.estimate_indices(&[0], |_| None),
            Err(EstimateError::EmptySample { .. })
        ));
        let mut rng = SmallRng::seed_from_u64(2);
        assert!(EdgeDisagreementEstimator::new(&[]).estimate(10, |_| Some(0.5), &mut rng).is_err());
    }

    #[test]
    fn zero_truth_has_no_relative_error() {
        let estimate = EdgeEstimate {
            disagreement: 1.0,
            evaluated: 1,
            skipped: 0,
        };
        assert!(EdgeDisagreementEstimator::relative_error(&estimate, 0.0).is_err());
        assert_eq!(
            EdgeDisagreementEstimator::relative_error(&estimate, 2.0),
            Ok(0.5)
        );
    }
}
