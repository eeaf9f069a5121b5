//! Error types for the whakaaro core library.
//!
//! Defines the error enums exposed by the public API together with stable,
//! machine-readable codes and a convenient result alias.

use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident
                    $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl ::core::fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(
                        Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )?
                            => $CodeTy::$CodeVariant,
                    )+
                }
            }
        }
    };
}

pub(crate) use define_error_codes;

/// Structural errors raised while building or querying a [`crate::WeightedGraph`].
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphError {
    /// A vertex identifier was not below the vertex count.
    #[error("vertex {vertex} is out of range for a graph with {num_vertices} vertices")]
    VertexOutOfRange {
        /// The offending vertex identifier.
        vertex: usize,
        /// Number of vertices in the graph.
        num_vertices: usize,
    },
    /// A neighbour position was not below the vertex's degree.
    #[error("neighbour index {index} is out of range for vertex {vertex} of degree {degree}")]
    NeighborIndexOutOfRange {
        /// Vertex whose neighbour list was indexed.
        vertex: usize,
        /// The offending position.
        index: usize,
        /// Degree of the vertex.
        degree: usize,
    },
    /// An edge weight was negative, NaN or infinite.
    #[error("edge ({left}, {right}) has invalid weight {weight}")]
    InvalidWeight {
        /// Left endpoint of the edge.
        left: usize,
        /// Right endpoint of the edge.
        right: usize,
        /// The rejected weight.
        weight: f64,
    },
    /// An edge connected a vertex to itself.
    #[error("edge ({vertex}, {vertex}) is a self-loop")]
    SelfLoop {
        /// The vertex carrying the loop.
        vertex: usize,
    },
    /// A sampling operation was requested on a vertex without neighbours.
    #[error("vertex {vertex} has no neighbours to sample from")]
    IsolatedVertex {
        /// The isolated vertex.
        vertex: usize,
    },
    /// Adjacency and cumulative-weight lists disagree in length.
    #[error(
        "vertex {vertex} has {neighbors} neighbours but {weights} cumulative weights"
    )]
    AdjacencyLengthMismatch {
        /// Vertex whose lists disagree.
        vertex: usize,
        /// Length of the neighbour list.
        neighbors: usize,
        /// Length of the cumulative-weight list.
        weights: usize,
    },
    /// Cumulative weights decreased or were not finite.
    #[error("cumulative weights of vertex {vertex} are not monotonic at index {index}")]
    NonMonotonicWeights {
        /// Vertex whose running totals are broken.
        vertex: usize,
        /// First index at which the running total decreased.
        index: usize,
    },
    /// Adjacency lists were supplied for a different number of vertices.
    #[error("expected adjacency for {expected} vertices but got {actual}")]
    VertexCountMismatch {
        /// Number of neighbour lists.
        expected: usize,
        /// Number of cumulative-weight lists.
        actual: usize,
    },
    /// Degree bucketing was requested with zero buckets.
    #[error("degree bucketing requires at least one bucket")]
    ZeroBuckets,
    /// The incident weight of a vertex would exceed the range of `f64`.
    #[error("incident weight of vertex {vertex} overflows")]
    WeightOverflow {
        /// Vertex whose running total overflowed.
        vertex: usize,
    },
    /// The total edge weight would exceed the range of `f64`.
    #[error("total edge weight overflows")]
    TotalWeightOverflow,
}

define_error_codes! {
    /// Stable codes describing [`GraphError`] variants.
    enum GraphErrorCode for GraphError {
        /// A vertex identifier was not below the vertex count.
        VertexOutOfRange => VertexOutOfRange { .. } => "GRAPH_VERTEX_OUT_OF_RANGE",
        /// A neighbour position was not below the vertex's degree.
        NeighborIndexOutOfRange => NeighborIndexOutOfRange { .. } => "GRAPH_NEIGHBOR_INDEX_OUT_OF_RANGE",
        /// An edge weight was negative, NaN or infinite.
        InvalidWeight => InvalidWeight { .. } => "GRAPH_INVALID_WEIGHT",
        /// An edge connected a vertex to itself.
        SelfLoop => SelfLoop { .. } => "GRAPH_SELF_LOOP",
        /// A sampling operation was requested on a vertex without neighbours.
        IsolatedVertex => IsolatedVertex { .. } => "GRAPH_ISOLATED_VERTEX",
        /// Adjacency and cumulative-weight lists disagree in length.
        AdjacencyLengthMismatch => AdjacencyLengthMismatch { .. } => "GRAPH_ADJACENCY_LENGTH_MISMATCH",
        /// Cumulative weights decreased or were not finite.
        NonMonotonicWeights => NonMonotonicWeights { .. } => "GRAPH_NON_MONOTONIC_WEIGHTS",
        /// Adjacency lists were supplied for a different number of vertices.
        VertexCountMismatch => VertexCountMismatch { .. } => "GRAPH_VERTEX_COUNT_MISMATCH",
        /// Degree bucketing was requested with zero buckets.
        ZeroBuckets => ZeroBuckets => "GRAPH_ZERO_BUCKETS",
        /// The incident weight of a vertex would exceed the range of `f64`.
        WeightOverflow => WeightOverflow { .. } => "GRAPH_WEIGHT_OVERFLOW",
        /// The total edge weight would exceed the range of `f64`.
        TotalWeightOverflow => TotalWeightOverflow => "GRAPH_TOTAL_WEIGHT_OVERFLOW",
    }
}

/// Errors produced by the estimators.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EstimateError {
    /// The estimator received no usable observations.
    #[error("{estimator} requires a non-empty sample")]
    EmptySample {
        /// Name of the estimator that rejected the input.
        estimator: &'static str,
    },
    /// The true value used as a relative-error denominator was zero.
    #[error("relative error is undefined for a true value of zero (estimate {estimate})")]
    UndefinedRelativeError {
        /// The estimate that could not be normalised.
        estimate: f64,
    },
    /// An opinion vector did not cover every vertex of the graph.
    #[error("expected {expected} opinions but got {actual}")]
    OpinionCountMismatch {
        /// Number of vertices in the graph.
        expected: usize,
        /// Length of the supplied opinion vector.
        actual: usize,
    },
    /// An edge index was not below the edge-list length.
    #[error("edge index {index} is out of range for {num_edges} edges")]
    EdgeIndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Length of the edge list.
        num_edges: usize,
    },
    /// A configuration parameter was outside its valid range.
    #[error("{parameter} must be at least 1 (got {got})")]
    InvalidParameter {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// The rejected value.
        got: usize,
    },
    /// A graph query failed while estimating.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

define_error_codes! {
    /// Stable codes describing [`EstimateError`] variants.
    enum EstimateErrorCode for EstimateError {
        /// The estimator received no usable observations.
        EmptySample => EmptySample { .. } => "ESTIMATE_EMPTY_SAMPLE",
        /// The true value used as a relative-error denominator was zero.
        UndefinedRelativeError => UndefinedRelativeError { .. } => "ESTIMATE_UNDEFINED_RELATIVE_ERROR",
        /// An opinion vector did not cover every vertex of the graph.
        OpinionCountMismatch => OpinionCountMismatch { .. } => "ESTIMATE_OPINION_COUNT_MISMATCH",
        /// An edge index was not below the edge-list length.
        EdgeIndexOutOfRange => EdgeIndexOutOfRange { .. } => "ESTIMATE_EDGE_INDEX_OUT_OF_RANGE",
        /// A configuration parameter was outside its valid range.
        InvalidParameter => InvalidParameter { .. } => "ESTIMATE_INVALID_PARAMETER",
        /// A graph query failed while estimating.
        GraphFailure => Graph(..) => "ESTIMATE_GRAPH_FAILURE",
    }
}

impl EstimateError {
    /// Retrieve the inner [`GraphErrorCode`] when the error originated in the graph.
    #[must_use]
    pub const fn graph_code(&self) -> Option<GraphErrorCode> {
        match self {
            Self::Graph(error) => Some(error.code()),
            _ => None,
        }
    }
}

/// Convenient alias for results returned by the estimators.
pub type Result<T> = core::result::Result<T, EstimateError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(GraphError::ZeroBuckets, "GRAPH_ZERO_BUCKETS")]
    #[case(GraphError::IsolatedVertex { vertex: 3 }, "GRAPH_ISOLATED_VERTEX")]
    #[case(
        GraphError::VertexOutOfRange { vertex: 9, num_vertices: 4 },
        "GRAPH_VERTEX_OUT_OF_RANGE"
    )]
    fn graph_codes_are_stable(#[case] error: GraphError, #[case] expected: &str) {
        assert_eq!(error.code().as_str(), expected);
        assert_eq!(error.code().to_string(), expected);
    }

    #[test]
    fn estimate_error_exposes_graph_code() {
        let error = EstimateError::from(GraphError::IsolatedVertex { vertex: 1 });
        assert_eq!(error.code(), EstimateErrorCode::GraphFailure);
        assert_eq!(error.graph_code(), Some(GraphErrorCode::IsolatedVertex));
        assert_eq!(
            EstimateError::EmptySample { estimator: "controversy" }.graph_code(),
            None
        );
    }
}
