//! Seeded random opinion networks.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng, rngs::SmallRng};
use whakaaro_core::{GraphBuilder, GraphError, WeightedEdge, WeightedGraph};

/// Errors raised for unusable generator settings.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SyntheticError {
    /// Fewer than two vertices leave no room for an edge.
    #[error("a synthetic graph needs at least two vertices, got {vertex_count}")]
    TooFewVertices {
        /// Requested vertex count.
        vertex_count: usize,
    },
    /// The average degree must lie in `1..vertex_count`.
    #[error("average degree {average_degree} is outside 1..{vertex_count}")]
    InvalidDegree {
        /// Requested average degree.
        average_degree: usize,
        /// Requested vertex count.
        vertex_count: usize,
    },
    /// The generated edges did not form a valid graph.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Generator settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyntheticConfig {
    /// Number of vertices.
    pub vertex_count: usize,
    /// Target average degree; parallel draws are merged so the realised
    /// degree can be slightly lower.
    pub average_degree: usize,
    /// RNG seed.
    pub seed: u64,
}

/// A random graph with edge weights in `[0.1, 1)` and expressed opinions in
/// `[0, 1)`.
#[derive(Clone, Debug)]
pub struct SyntheticGraph {
    /// The network.
    pub graph: WeightedGraph,
    /// Expressed opinion per vertex.
    pub expressed: Vec<f64>,
}

impl SyntheticGraph {
    /// Draws `vertex_count × average_degree / 2` random edges.
    ///
    /// # Errors
    /// Returns [`SyntheticError`] for unusable settings.
    ///
    /// # Examples
    /// ```
    /// use whakaaro_benches::synthetic::{SyntheticConfig, SyntheticGraph};
    ///
    /// let synthetic = SyntheticGraph::generate(&SyntheticConfig {
    ///     vertex_count: 50,
    ///     average_degree: 4,
    ///     seed: 9,
    /// })?;
    /// assert_eq!(synthetic.expressed.len(), 50);
    /// assert!(synthetic.graph.num_edges() <= 100);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn generate(config: &SyntheticConfig) -> Result<Self, SyntheticError> {
        let SyntheticConfig {
            vertex_count,
            average_degree,
            seed,
        } = *config;
        if vertex_count < 2 {
            return Err(SyntheticError::TooFewVertices { vertex_count });
        }
        if average_degree == 0 || average_degree >= vertex_count {
            return Err(SyntheticError::InvalidDegree {
                average_degree,
                vertex_count,
            });
        }

        let mut rng = SmallRng::seed_from_u64(seed);
        let draws = vertex_count * average_degree / 2;
        let mut merged: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for _ in 0..draws {
            let left = rng.gen_range(0..vertex_count);
            // Offset from `left` so the endpoints always differ.
            let right = (left + rng.gen_range(1..vertex_count)) % vertex_count;
            *merged.entry((left.min(right), left.max(right))).or_insert(0.0) +=
                rng.gen_range(0.1..1.0);
        }
        let expressed = (0..vertex_count).map(|_| rng.gen_range(0.0..1.0)).collect();
        Ok(Self {
            graph: build(vertex_count, merged)?,
            expressed,
        })
    }

    /// A star whose centre `0` has `leaves` neighbours with random weights,
    /// the worst case for per-vertex neighbour sampling.
    ///
    /// # Errors
    /// Returns [`SyntheticError::TooFewVertices`] when `leaves` is zero.
    pub fn star(leaves: usize, seed: u64) -> Result<Self, SyntheticError> {
        if leaves == 0 {
            return Err(SyntheticError::TooFewVertices { vertex_count: 1 });
        }
        let mut rng = SmallRng::seed_from_u64(seed);
        let edges: BTreeMap<(usize, usize), f64> = (1..=leaves)
            .map(|leaf| ((0, leaf), rng.gen_range(0.1..1.0)))
            .collect();
        let expressed = (0..=leaves).map(|_| rng.gen_range(0.0..1.0)).collect();
        Ok(Self {
            graph: build(leaves + 1, edges)?,
            expressed,
        })
    }
}

fn build(
    vertex_count: usize,
    edges: BTreeMap<(usize, usize), f64>,
) -> Result<WeightedGraph, SyntheticError> {
    let mut builder = GraphBuilder::new(vertex_count);
    for ((left, right), weight) in edges {
        builder.add_edge(WeightedEdge::new(left, right, weight))?;
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 1)]
    #[case(10, 0)]
    #[case(10, 10)]
    fn invalid_settings_are_rejected(#[case] vertex_count: usize, #[case] average_degree: usize) {
        let config = SyntheticConfig {
            vertex_count,
            average_degree,
            seed: 1,
        };
        assert!(SyntheticGraph::generate(&config).is_err());
    }

    #[rstest]
    fn generation_is_seeded() {
        let config = SyntheticConfig {
            vertex_count: 200,
            average_degree: 6,
            seed: 3,
        };
        let first = SyntheticGraph::generate(&config).expect("valid config");
        let second = SyntheticGraph::generate(&config).expect("valid config");
        assert_eq!(first.graph.edge_list(), second.graph.edge_list());
        assert_eq!(first.expressed, second.expressed);
        assert!(first.graph.num_edges() > 500);
    }

    #[rstest]
    fn stars_concentrate_degree_on_the_centre() {
        let star = SyntheticGraph::star(64, 5).expect("non-empty star");
        assert_eq!(star.graph.degree(0), Ok(64));
        assert_eq!(star.graph.degree(64), Ok(1));
        assert_eq!(star.expressed.len(), 65);
    }
}
