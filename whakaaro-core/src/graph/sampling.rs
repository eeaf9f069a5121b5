//! Random neighbour selection over the prefix-sum adjacency.

use rand::{Rng, seq::SliceRandom};

use super::WeightedGraph;
use crate::error::GraphError;

impl WeightedGraph {
    /// Resolves a target weight to a neighbour position of `vertex`.
    ///
    /// Returns the smallest index `i` with `cumulative_weights[i] >= target`,
    /// so ties resolve toward the smaller index. A target at or beyond the
    /// incident weight resolves to the last index. Runs in `O(log degree)`.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for unknown vertices and
    /// [`GraphError::IsolatedVertex`] when `vertex` has no neighbours.
    ///
    /// # Examples
    /// ```
    /// use whakaaro_core::{WeightedEdge, WeightedGraph};
    ///
    /// let graph = WeightedGraph::from_edges(
    ///     4,
    ///     [
    ///         WeightedEdge::new(0, 1, 1.0),
    ///         WeightedEdge::new(0, 2, 2.0),
    ///         WeightedEdge::new(0, 3, 1.0),
    ///     ],
    /// )?;
    /// assert_eq!(graph.neighbor_index_for_target(0, 0.0)?, 0);
    /// assert_eq!(graph.neighbor_index_for_target(0, 1.0)?, 0);
    /// assert_eq!(graph.neighbor_index_for_target(0, 2.5)?, 1);
    /// assert_eq!(graph.neighbor_index_for_target(0, 4.0)?, 2);
    /// # Ok::<(), whakaaro_core::GraphError>(())
    /// ```
    pub fn neighbor_index_for_target(&self, vertex: usize, target: f64) -> Result<usize, GraphError> {
        let totals = self.cumulative_weights(vertex)?;
        let last = totals
            .len()
            .checked_sub(1)
            .ok_or(GraphError::IsolatedVertex { vertex })?;
        // Invariant: every index below the partition point has a running
        // total strictly smaller than `target`.
        let index = totals.partition_point(|&total| total < target);
        Ok(index.min(last))
    }

    /// Draws a neighbour position of `vertex` with probability proportional
    /// to the weight of the connecting edge.
    ///
    /// The target weight is drawn uniformly from `[0, incident_weight]` and
    /// resolved with [`Self::neighbor_index_for_target`]. Neighbour `i` is
    /// therefore returned with probability `w_i / Σw`.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for unknown vertices and
    /// [`GraphError::IsolatedVertex`] when `vertex` has no neighbours.
    ///
    /// # Examples
    /// ```
    /// use rand::{SeedableRng, rngs::SmallRng};
    /// use whakaaro_core::{WeightedEdge, WeightedGraph};
    ///
    /// let graph = WeightedGraph::from_edges(
    ///     3,
    ///     [WeightedEdge::new(0, 1, 0.0), WeightedEdge::new(0, 2, 5.0)],
    /// )?;
    /// let mut rng = SmallRng::seed_from_u64(7);
    /// let index = graph.weighted_random_neighbor_index(0, &mut rng)?;
    /// assert_eq!(graph.neighbors(0)?[index], 2);
    /// # Ok::<(), whakaaro_core::GraphError>(())
    /// ```
    pub fn weighted_random_neighbor_index<R>(
        &self,
        vertex: usize,
        rng: &mut R,
    ) -> Result<usize, GraphError>
    where
        R: Rng + ?Sized,
    {
        let total = self.incident_weight(vertex)?;
        let target = rng.gen_range(0.0..=total);
        self.neighbor_index_for_target(vertex, target)
    }

    /// Draws a neighbour of `vertex` uniformly, ignoring edge weights.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for unknown vertices and
    /// [`GraphError::IsolatedVertex`] when `vertex` has no neighbours.
    pub fn random_neighbor<R>(&self, vertex: usize, rng: &mut R) -> Result<usize, GraphError>
    where
        R: Rng + ?Sized,
    {
        self.neighbors(vertex)?
            .choose(rng)
            .copied()
            .ok_or(GraphError::IsolatedVertex { vertex })
    }
}
