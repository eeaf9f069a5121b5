//! Tests for the vertex-subsample estimators.

use proptest::prelude::*;
use rstest::{fixture, rstest};

use super::{SumSource, VertexEstimator};
use crate::{
    error::EstimateError,
    graph::{WeightedEdge, WeightedGraph},
    measure::{GroundTruth, Measure},
    sample::{OpinionSample, SampleScale},
    test_utils::suite_proptest_config,
};

const EXPRESSED: [f64; 4] = [0.2, 0.4, 0.6, 0.8];
const INNATE: [f64; 4] = [0.0, 0.5, 0.5, 1.0];

#[fixture]
fn path() -> WeightedGraph {
    path_graph()
}

fn path_graph() -> WeightedGraph {
    WeightedGraph::from_edges(
        4,
        [
            WeightedEdge::unit(0, 1),
            WeightedEdge::new(1, 2, 2.0),
            WeightedEdge::unit(2, 3),
        ],
    )
    .expect("path edges are valid")
}

fn full(values: &[f64]) -> OpinionSample {
    values.iter().copied().enumerate().collect()
}

fn close(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-12
}

#[rstest]
fn full_sample_reproduces_exact_sums(path: WeightedGraph) {
    let estimator = VertexEstimator::new(&path);
    let expressed = full(&EXPRESSED);
    let innate = full(&INNATE);

    let controversy: f64 = EXPRESSED.iter().map(|z| z * z).sum();
    let norm: f64 = INNATE.iter().map(|s| s * s).sum();
    let conflict: f64 = EXPRESSED.iter().zip(INNATE).map(|(z, s)| (z - s).powi(2)).sum();

    assert!(close(estimator.controversy(&expressed).expect("sample"), controversy));
    assert!(close(estimator.squared_norm(&innate).expect("sample"), norm));
    assert!(close(
        estimator.internal_conflict(&expressed, &innate).expect("sample"),
        conflict
    ));
    assert!(close(estimator.average_opinion(&expressed).expect("sample"), 0.5));
    assert!(close(estimator.sum_of_opinions(&expressed).expect("sample"), 2.0));
    assert!(close(estimator.polarization(&expressed, 0.5).expect("sample"), 0.2));
}

#[rstest]
fn partial_sample_is_scaled_by_population(path: WeightedGraph) {
    let estimator = VertexEstimator::new(&path);
    let expressed = OpinionSample::from_values([(1, 0.5)]);
    // (4 / 1) × 0.25
    assert_eq!(estimator.controversy(&expressed).expect("sample"), 1.0);
}

#[rstest]
fn draws_scale_counts_repeats(path: WeightedGraph) {
    let expressed = OpinionSample::from_draws([0, 0, 0, 3], |v| EXPRESSED.get(v).copied());
    let distinct = VertexEstimator::new(&path);
    let draws = distinct.with_scale(SampleScale::Draws);
    assert_eq!(draws.scale(), SampleScale::Draws);

    // distinct: (4 / 2) × (0.04 + 0.64); draws: (4 / 4) × (3 × 0.04 + 0.64)
    assert!(close(distinct.controversy(&expressed).expect("sample"), 1.36));
    assert!(close(draws.controversy(&expressed).expect("sample"), 0.76));
    assert!(close(draws.average_opinion(&expressed).expect("sample"), 0.35));
}

#[rstest]
fn disagreement_controversy_is_clamped_to_vertex_count(path: WeightedGraph) {
    let estimator = VertexEstimator::new(&path);
    let expressed = OpinionSample::from_values([(0, 1.5)]);
    let innate = OpinionSample::from_values([(0, 2.0)]);
    assert_eq!(
        estimator
            .disagreement_controversy(&expressed, &innate)
            .expect("sample"),
        4.0
    );
}

#[rstest]
fn paired_estimators_skip_vertices_without_innate_values(path: WeightedGraph) {
    let estimator = VertexEstimator::new(&path);
    let expressed = OpinionSample::from_values([(0, 0.5), (1, 0.5)]);
    let innate = OpinionSample::from_values([(1, 0.0)]);
    // only vertex 1 pairs up: (4 / 1) × 0.25
    assert_eq!(
        estimator.internal_conflict(&expressed, &innate).expect("sample"),
        1.0
    );
    let disjoint = OpinionSample::from_values([(3, 0.1)]);
    assert_eq!(
        estimator.internal_conflict(&expressed, &disjoint),
        Err(EstimateError::EmptySample {
            estimator: "internal conflict"
        })
    );
}

#[rstest]
fn empty_samples_are_errors_not_nan(path: WeightedGraph) {
    let estimator = VertexEstimator::new(&path);
    let empty = OpinionSample::default();
    assert_eq!(
        estimator.controversy(&empty),
        Err(EstimateError::EmptySample {
            estimator: "controversy"
        })
    );
    assert!(estimator.average_opinion(&empty).is_err());
    assert!(estimator.disagreement(&empty, &empty).is_err());
}

#[rstest]
#[case(SumSource::Expressed, 2.0)]
#[case(SumSource::Innate, 2.0)]
fn estimate_all_matches_individual_estimators(
    path: WeightedGraph,
    #[case] source: SumSource,
    #[case] expected_sum: f64,
) {
    let estimator = VertexEstimator::new(&path);
    let expressed = full(&EXPRESSED);
    let innate = full(&INNATE);
    let estimates = estimator
        .estimate_all(&expressed, &innate, source)
        .expect("samples are non-empty");

    assert!(close(estimates.sum_of_opinions, expected_sum));
    assert!(close(
        estimates.polarization,
        estimator.polarization(&expressed, 0.5).expect("sample")
    ));
    assert_eq!(
        estimates.disagreement,
        estimator.disagreement(&expressed, &innate).expect("sample")
    );
    assert_eq!(estimates.get(Measure::Controversy), estimates.controversy);
    assert_eq!(estimates.iter().count(), Measure::ALL.len());
}

#[rstest]
fn comparisons_cover_known_truths_only(path: WeightedGraph) {
    let estimator = VertexEstimator::new(&path);
    let estimates = estimator
        .estimate_all(&full(&EXPRESSED), &full(&INNATE), SumSource::Expressed)
        .expect("samples are non-empty");
    let truth: GroundTruth = [(Measure::Controversy, 1.2), (Measure::Polarization, 0.0)]
        .into_iter()
        .collect();

    let rows = estimates.compare(&truth);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].measure, Measure::Controversy);
    assert!(rows[0].relative_error.is_some_and(|error| error < 1e-9));
    assert_eq!(rows[1].relative_error, None);
}

fn opinion_sample() -> impl Strategy<Value = OpinionSample> {
    prop::collection::vec((0_usize..4, -1.0_f64..2.0), 1..16).prop_map(OpinionSample::from_values)
}

proptest! {
    #![proptest_config(suite_proptest_config(256))]

    #[test]
    fn controversy_is_never_negative(sample in opinion_sample()) {
        let graph = path_graph();
        let estimator = VertexEstimator::new(&graph);
        prop_assert!(estimator.controversy(&sample).expect("non-empty") >= 0.0);
    }

    #[test]
    fn clamped_estimates_stay_within_bounds(
        expressed in opinion_sample(),
        innate in opinion_sample(),
        draws in any::<bool>(),
    ) {
        let graph = path_graph();
        let scale = if draws { SampleScale::Draws } else { SampleScale::DistinctVertices };
        let estimator = VertexEstimator::new(&graph).with_scale(scale);
        match estimator.disagreement(&expressed, &innate) {
            Ok(value) => {
                prop_assert!(value >= 0.0);
                prop_assert!(value <= graph.total_edge_weight());
            }
            Err(error) => prop_assert!(
                matches!(error, EstimateError::EmptySample { .. }),
                "only an empty sample may fail, got {error:?}"
            ),
        }
        if let Ok(value) = estimator.disagreement_controversy(&expressed, &innate) {
            prop_assert!((0.0..=4.0).contains(&value));
        }
    }
}
