//! Benchmark parameter labels.

use std::fmt;

/// Shape of a synthetic graph, rendered as a Criterion parameter.
#[derive(Clone, Copy, Debug)]
pub struct GraphBenchParams {
    /// Number of vertices.
    pub vertex_count: usize,
    /// Target average degree.
    pub average_degree: usize,
}

impl fmt::Display for GraphBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},d={}", self.vertex_count, self.average_degree)
    }
}

/// Innate-estimator settings, rendered as a Criterion parameter.
#[derive(Clone, Copy, Debug)]
pub struct InnateBenchParams {
    /// Vertices estimated per batch.
    pub batch: usize,
    /// Neighbour draws per median group.
    pub num_samples: usize,
}

impl fmt::Display for InnateBenchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch={},samples={}", self.batch, self.num_samples)
    }
}
