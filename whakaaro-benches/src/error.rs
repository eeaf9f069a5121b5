//! Benchmark setup error type.

use whakaaro_core::{EstimateError, GraphError};

use crate::synthetic::SyntheticError;

/// Errors that may occur while preparing a benchmark.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// The generator configuration was rejected.
    #[error("synthetic graph generation failed: {0}")]
    Synthetic(#[from] SyntheticError),
    /// Building or querying the graph failed.
    #[error("graph operation failed: {0}")]
    Graph(#[from] GraphError),
    /// An estimator rejected its configuration or input.
    #[error("estimator failed: {0}")]
    Estimate(#[from] EstimateError),
}
