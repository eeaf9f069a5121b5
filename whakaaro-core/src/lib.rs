//! Whakaaro core library: sampling-based estimation of opinion-dynamics
//! measures on weighted social graphs.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod edge;
mod error;
mod estimate;
mod graph;
mod innate;
mod measure;
mod oracle;
mod sample;

#[cfg(test)]
mod test_utils;

pub use crate::{
    edge::{EdgeDisagreementEstimator, EdgeEstimate},
    error::{EstimateError, EstimateErrorCode, GraphError, GraphErrorCode, Result},
    estimate::{MeasureEstimates, SumSource, VertexEstimator},
    graph::{GraphBuilder, WeightedEdge, WeightedGraph},
    innate::{InnateBatch, InnateEstimatorBuilder, InnateOpinionEstimator},
    measure::{
        ErrorSummary, GroundTruth, Measure, MeasureComparison, UnknownMeasure, absolute_error,
        relative_error,
    },
    oracle::{
        GroundTruthOracle, OpinionOracle, OracleError, OracleErrorCode, OracleEstimate, WalkConfig,
    },
    sample::{OpinionSample, SampleScale, resample, sample_edge_indices, sample_vertices},
};
