//! Read-only structural queries: degree buckets and vertex-set boundaries.

use std::collections::HashSet;

use tracing::{debug, instrument};

use super::WeightedGraph;
use crate::error::GraphError;

impl WeightedGraph {
    /// Partitions all vertices into `num_buckets` groups of nearly equal size,
    /// ordered by increasing degree.
    ///
    /// Vertices are stably sorted by degree and split into contiguous runs;
    /// the first `n % num_buckets` buckets receive one extra vertex. Buckets
    /// may be empty when there are fewer vertices than buckets.
    ///
    /// # Errors
    /// Returns [`GraphError::ZeroBuckets`] when `num_buckets` is zero.
    ///
    /// # Examples
    /// ```
    /// use whakaaro_core::{WeightedEdge, WeightedGraph};
    ///
    /// let graph = WeightedGraph::from_edges(
    ///     5,
    ///     [WeightedEdge::unit(0, 1), WeightedEdge::unit(0, 2), WeightedEdge::unit(3, 0)],
    /// )?;
    /// let buckets = graph.degree_buckets(2)?;
    /// assert_eq!(buckets, [vec![4, 1, 2], vec![3, 0]]);
    /// # Ok::<(), whakaaro_core::GraphError>(())
    /// ```
    #[instrument(name = "core.degree_buckets", skip(self), fields(vertices = self.num_vertices()))]
    pub fn degree_buckets(&self, num_buckets: usize) -> Result<Vec<Vec<usize>>, GraphError> {
        if num_buckets == 0 {
            return Err(GraphError::ZeroBuckets);
        }
        let mut order: Vec<usize> = (0..self.num_vertices()).collect();
        order.sort_by_key(|&vertex| self.neighbors[vertex].len());

        let base = order.len() / num_buckets;
        let remainder = order.len() % num_buckets;
        let mut buckets = Vec::with_capacity(num_buckets);
        let mut rest = order.as_slice();
        for bucket in 0..num_buckets {
            let size = base + usize::from(bucket < remainder);
            let (head, tail) = rest.split_at(size);
            buckets.push(head.to_vec());
            rest = tail;
        }
        debug!(buckets = num_buckets, base_size = base, "vertices bucketed by degree");
        Ok(buckets)
    }

    /// Counts the edges with exactly one endpoint in `set`.
    ///
    /// Runs in `O(volume(set))`. Repeated members are counted once.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] when `set` names an unknown
    /// vertex.
    ///
    /// # Examples
    /// ```
    /// use whakaaro_core::{WeightedEdge, WeightedGraph};
    ///
    /// let graph = WeightedGraph::from_edges(
    ///     4,
    ///     [WeightedEdge::unit(0, 1), WeightedEdge::unit(1, 2), WeightedEdge::unit(2, 3)],
    /// )?;
    /// assert_eq!(graph.num_edges_leaving_set(&[1, 2])?, 2);
    /// assert_eq!(graph.num_edges_leaving_set(&[0, 1, 2, 3])?, 0);
    /// # Ok::<(), whakaaro_core::GraphError>(())
    /// ```
    pub fn num_edges_leaving_set(&self, set: &[usize]) -> Result<usize, GraphError> {
        let members = self.membership(set)?;
        let mut leaving = 0_usize;
        for &vertex in &members {
            leaving += self.neighbors[vertex]
                .iter()
                .filter(|neighbor| !members.contains(neighbor))
                .count();
        }
        Ok(leaving)
    }

    /// Returns the volume of `set`, the sum of its members' degrees.
    ///
    /// Repeated members contribute once.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] when `set` names an unknown
    /// vertex.
    pub fn volume(&self, set: &[usize]) -> Result<usize, GraphError> {
        let members = self.membership(set)?;
        Ok(members
            .iter()
            .map(|&vertex| self.neighbors[vertex].len())
            .sum())
    }

    fn membership(&self, set: &[usize]) -> Result<HashSet<usize>, GraphError> {
        let num_vertices = self.num_vertices();
        set.iter()
            .map(|&vertex| {
                if vertex < num_vertices {
                    Ok(vertex)
                } else {
                    Err(GraphError::VertexOutOfRange {
                        vertex,
                        num_vertices,
                    })
                }
            })
            .collect()
    }
}
