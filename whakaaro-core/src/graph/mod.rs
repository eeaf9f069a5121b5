//! Weighted undirected graph with prefix-sum adjacency.
//!
//! Every vertex stores its neighbours in insertion order together with the
//! running total of the incident edge weights. The running totals turn a
//! weighted neighbour draw into a binary search, and the last entry doubles
//! as the vertex's incident weight.

mod sampling;
mod structure;


use crate::error::GraphError;

/// An undirected edge with a non-negative weight.
///
/// # Examples
/// ```
/// use whakaaro_core::WeightedEdge;
///
/// let edge = WeightedEdge::new(0, 3, 2.5);
/// assert_eq!(edge.endpoints(), (0, 3));
/// assert_eq!(edge.weight(), 2.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedEdge {
    left: usize,
    right: usize,
    weight: f64,
}

impl WeightedEdge {
    /// Creates an edge between `left` and `right`.
    #[rustfmt::skip]
    #[must_use]
    pub const fn new(left: usize, right: usize, weight: f64) -> Self { Self { left, right, weight } }

    /// Creates an edge of weight `1.0`.
    #[rustfmt::skip]
    #[must_use]
    pub const fn unit(left: usize, right: usize) -> Self { Self::new(left, right, 1.0) }

    /// Returns both endpoints in the order they were supplied.
    #[must_use]
    pub const fn endpoints(&self) -> (usize, usize) {
        (self.left, self.right)
    }

    /// Returns the edge weight.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}

/// Immutable weighted graph supporting weighted neighbour sampling.
///
/// Parallel edges are expected to be aggregated before construction; the
/// graph stores whatever edges it is given.
///
/// # Examples
/// ```
/// use whakaaro_core::{WeightedEdge, WeightedGraph};
///
/// let graph = WeightedGraph::from_edges(
///     3,
///     [WeightedEdge::new(0, 1, 2.0), WeightedEdge::new(1, 2, 0.5)],
/// )?;
/// assert_eq!(graph.num_vertices(), 3);
/// assert_eq!(graph.num_edges(), 2);
/// assert_eq!(graph.degree(1)?, 2);
/// assert_eq!(graph.incident_weight(1)?, 2.5);
/// assert_eq!(graph.total_edge_weight(), 2.5);
/// # Ok::<(), whakaaro_core::GraphError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedGraph {
    neighbors: Vec<Vec<usize>>,
    cumulative_weights: Vec<Vec<f64>>,
    num_edges: usize,
    total_edge_weight: f64,
}

impl WeightedGraph {
    /// Builds a graph with `num_vertices` vertices from an edge list.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] when an endpoint is not below
    /// `num_vertices`, [`GraphError::SelfLoop`] for loops,
    /// [`GraphError::InvalidWeight`] for negative or non-finite weights, and
    /// [`GraphError::WeightOverflow`] or [`GraphError::TotalWeightOverflow`]
    /// when the weights sum past the range of `f64`.
    pub fn from_edges<I>(num_vertices: usize, edges: I) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = WeightedEdge>,
    {
        let mut builder = GraphBuilder::new(num_vertices);
        for edge in edges {
            builder.add_edge(edge)?;
        }
        Ok(builder.build())
    }

    /// Rebuilds a graph from raw adjacency and running-total lists.
    ///
    /// The lists are validated rather than trusted: a binary search over a
    /// non-monotonic running total would silently return wrong neighbours.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexCountMismatch`] or
    /// [`GraphError::AdjacencyLengthMismatch`] when the lists disagree in
    /// shape, [`GraphError::VertexOutOfRange`] for neighbour ids outside the
    /// graph, [`GraphError::NonMonotonicWeights`] when a running total
    /// decreases or is not finite, and [`GraphError::TotalWeightOverflow`]
    /// when the incident weights sum past the range of `f64`.
    ///
    /// # Examples
    /// ```
    /// use whakaaro_core::{GraphError, WeightedGraph};
    ///
    /// let graph = WeightedGraph::from_adjacency(
    ///     vec![vec![1], vec![0]],
    ///     vec![vec![3.0], vec![3.0]],
    /// )?;
    /// assert_eq!(graph.total_edge_weight(), 3.0);
    ///
    /// let err = WeightedGraph::from_adjacency(
    ///     vec![vec![1, 1], vec![0, 0]],
    ///     vec![vec![2.0, 1.0], vec![2.0, 3.0]],
    /// )
    /// .expect_err("decreasing totals must be rejected");
    /// assert!(matches!(err, GraphError::NonMonotonicWeights { vertex: 0, index: 1 }));
    /// # Ok::<(), GraphError>(())
    /// ```
    pub fn from_adjacency(
        neighbors: Vec<Vec<usize>>,
        cumulative_weights: Vec<Vec<f64>>,
    ) -> Result<Self, GraphError> {
        if neighbors.len() != cumulative_weights.len() {
            return Err(GraphError::VertexCountMismatch {
                expected: neighbors.len(),
                actual: cumulative_weights.len(),
            });
        }
        let num_vertices = neighbors.len();
        let mut endpoint_count = 0_usize;
        let mut total_edge_weight = 0.0_f64;
        for (vertex, (adjacent, totals)) in neighbors.iter().zip(&cumulative_weights).enumerate() {
            if adjacent.len() != totals.len() {
                return Err(GraphError::AdjacencyLengthMismatch {
                    vertex,
                    neighbors: adjacent.len(),
                    weights: totals.len(),
                });
            }
            if let Some(&neighbor) = adjacent.iter().find(|&&v| v >= num_vertices) {
                return Err(GraphError::VertexOutOfRange {
                    vertex: neighbor,
                    num_vertices,
                });
            }
            let mut previous = 0.0_f64;
            for (index, &total) in totals.iter().enumerate() {
                if !total.is_finite() || total < previous {
                    return Err(GraphError::NonMonotonicWeights { vertex, index });
                }
                previous = total;
            }
            endpoint_count += adjacent.len();
            // Halve per vertex so a total just below `f64::MAX` still fits.
            total_edge_weight += previous / 2.0;
        }
        if !total_edge_weight.is_finite() {
            return Err(GraphError::TotalWeightOverflow);
        }

        Ok(Self {
            neighbors,
            cumulative_weights,
            num_edges: endpoint_count / 2,
            total_edge_weight,
        })
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.neighbors.len()
    }

    /// Returns the number of undirected edges.
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Returns the sum of all edge weights, each undirected edge counted once.
    #[must_use]
    pub fn total_edge_weight(&self) -> f64 {
        self.total_edge_weight
    }

    /// Returns the number of neighbours of `vertex`.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for unknown vertices.
    pub fn degree(&self, vertex: usize) -> Result<usize, GraphError> {
        Ok(self.neighbors(vertex)?.len())
    }

    /// Returns the total weight of the edges incident upon `vertex`, or `0.0`
    /// for an isolated vertex.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for unknown vertices.
    pub fn incident_weight(&self, vertex: usize) -> Result<f64, GraphError> {
        Ok(self
            .cumulative_weights(vertex)?
            .last()
            .copied()
            .unwrap_or(0.0))
    }

    /// Returns the neighbours of `vertex` in insertion order.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for unknown vertices.
    pub fn neighbors(&self, vertex: usize) -> Result<&[usize], GraphError> {
        self.neighbors
            .get(vertex)
            .map(Vec::as_slice)
            .ok_or(GraphError::VertexOutOfRange {
                vertex,
                num_vertices: self.num_vertices(),
            })
    }

    /// Returns the running totals of the weights incident upon `vertex`,
    /// index-aligned with [`Self::neighbors`].
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] for unknown vertices.
    pub fn cumulative_weights(&self, vertex: usize) -> Result<&[f64], GraphError> {
        self.cumulative_weights
            .get(vertex)
            .map(Vec::as_slice)
            .ok_or(GraphError::VertexOutOfRange {
                vertex,
                num_vertices: self.num_vertices(),
            })
    }

    /// Returns the weight of the edge at position `index` of the neighbour
    /// list of `vertex`, recovered from consecutive running totals.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`] when `vertex` is unknown and
    /// [`GraphError::NeighborIndexOutOfRange`] when `index` is not below its
    /// degree.
    pub fn edge_weight(&self, vertex: usize, index: usize) -> Result<f64, GraphError> {
        let totals = self.cumulative_weights(vertex)?;
        let upper = totals
            .get(index)
            .ok_or(GraphError::NeighborIndexOutOfRange {
                vertex,
                index,
                degree: totals.len(),
            })?;
        let lower = index
            .checked_sub(1)
            .and_then(|previous| totals.get(previous))
            .copied()
            .unwrap_or(0.0);
        Ok(upper - lower)
    }

    /// Iterates every undirected edge once, as `(u, v, weight)` with `u < v`.
    ///
    /// # Examples
    /// ```
    /// use whakaaro_core::{WeightedEdge, WeightedGraph};
    ///
    /// let graph = WeightedGraph::from_edges(3, [WeightedEdge::new(2, 0, 1.5)])?;
    /// let edges: Vec<_> = graph.edges().collect();
    /// assert_eq!(edges, [WeightedEdge::new(0, 2, 1.5)]);
    /// # Ok::<(), whakaaro_core::GraphError>(())
    /// ```
    pub fn edges(&self) -> impl Iterator<Item = WeightedEdge> + '_ {
        self.neighbors
            .iter()
            .zip(&self.cumulative_weights)
            .enumerate()
            .flat_map(|(vertex, (adjacent, totals))| {
                let mut previous = 0.0_f64;
                adjacent
                    .iter()
                    .zip(totals)
                    .filter_map(move |(&neighbor, &total)| {
                        let weight = total - previous;
                        previous = total;
                        (vertex < neighbor).then(|| WeightedEdge::new(vertex, neighbor, weight))
                    })
            })
    }

    /// Returns the unweighted endpoint pairs of every edge, `u < v`.
    #[must_use]
    pub fn edge_list(&self) -> Vec<(usize, usize)> {
        self.edges().map(|edge| edge.endpoints()).collect()
    }
}

/// Accumulates edges before freezing them into a [`WeightedGraph`].
///
/// # Examples
/// ```
/// use whakaaro_core::{GraphBuilder, WeightedEdge};
///
/// let mut builder = GraphBuilder::new(4);
/// builder.add_edge(WeightedEdge::unit(0, 1))?;
/// builder.add_edge(WeightedEdge::unit(1, 2))?;
/// let graph = builder.build();
/// assert_eq!(graph.neighbors(1)?, [0, 2]);
/// assert_eq!(graph.cumulative_weights(1)?, [1.0, 2.0]);
/// # Ok::<(), whakaaro_core::GraphError>(())
/// ```
#[derive(Clone, Debug)]
pub struct GraphBuilder {
    neighbors: Vec<Vec<usize>>,
    cumulative_weights: Vec<Vec<f64>>,
    num_edges: usize,
    total_edge_weight: f64,
}

impl GraphBuilder {
    /// Creates a builder for a graph with `num_vertices` isolated vertices.
    #[must_use]
    pub fn new(num_vertices: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); num_vertices],
            cumulative_weights: vec![Vec::new(); num_vertices],
            num_edges: 0,
            total_edge_weight: 0.0,
        }
    }

    /// Appends an undirected edge to both endpoints' adjacency lists.
    ///
    /// # Errors
    /// Returns [`GraphError::VertexOutOfRange`], [`GraphError::SelfLoop`],
    /// [`GraphError::InvalidWeight`], [`GraphError::WeightOverflow`] or
    /// [`GraphError::TotalWeightOverflow`] without modifying the builder.
    pub fn add_edge(&mut self, edge: WeightedEdge) -> Result<&mut Self, GraphError> {
        let (left, right) = edge.endpoints();
        let weight = edge.weight();
        let num_vertices = self.neighbors.len();
        for vertex in [left, right] {
            if vertex >= num_vertices {
                return Err(GraphError::VertexOutOfRange {
                    vertex,
                    num_vertices,
                });
            }
        }
        if left == right {
            return Err(GraphError::SelfLoop { vertex: left });
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(GraphError::InvalidWeight {
                left,
                right,
                weight,
            });
        }

        let left_total = self.next_total(left, weight)?;
        let right_total = self.next_total(right, weight)?;
        let total_edge_weight = self.total_edge_weight + weight;
        if !total_edge_weight.is_finite() {
            return Err(GraphError::TotalWeightOverflow);
        }

        self.push_half_edge(left, right, left_total);
        self.push_half_edge(right, left, right_total);
        self.num_edges += 1;
        self.total_edge_weight = total_edge_weight;
        Ok(self)
    }

    /// Running total of `vertex` once an edge of `weight` is appended.
    fn next_total(&self, vertex: usize, weight: f64) -> Result<f64, GraphError> {
        let running = self
            .cumulative_weights
            .get(vertex)
            .and_then(|totals| totals.last())
            .copied()
            .unwrap_or(0.0);
        let total = running + weight;
        if total.is_finite() {
            Ok(total)
        } else {
            Err(GraphError::WeightOverflow { vertex })
        }
    }

    fn push_half_edge(&mut self, from: usize, to: usize, total: f64) {
        if let (Some(totals), Some(adjacent)) = (
            self.cumulative_weights.get_mut(from),
            self.neighbors.get_mut(from),
        ) {
            totals.push(total);
            adjacent.push(to);
        }
    }

    /// Freezes the accumulated edges.
    #[must_use]
    pub fn build(self) -> WeightedGraph {
        WeightedGraph {
            neighbors: self.neighbors,
            cumulative_weights: self.cumulative_weights,
            num_edges: self.num_edges,
            total_edge_weight: self.total_edge_weight,
        }
    }
}
