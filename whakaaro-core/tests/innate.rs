//! Behaviour of the innate-opinion estimator on small known graphs.

mod common;

use common::{CYCLE_OPINIONS, four_cycle, property_config, uniform_star, weighted_star, zero_one_star};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::SmallRng};
use rstest::rstest;
use whakaaro_core::{EstimateError, GraphError, InnateOpinionEstimator};

fn estimator(num_samples: usize, repetitions: usize) -> InnateOpinionEstimator {
    InnateOpinionEstimator::builder()
        .with_num_samples(num_samples)
        .with_repetitions(repetitions)
        .build()
        .expect("parameters are positive")
}

#[test]
fn negative_closed_form_clamps_to_zero() {
    let graph = four_cycle();
    let mut rng = SmallRng::seed_from_u64(0);
    // (1 + 2) × 0.1 − (0.9 + 0.8) = −1.4
    let innate = estimator(200, 3)
        .estimate(&graph, &CYCLE_OPINIONS, 0, &mut rng)
        .expect("vertex exists");
    assert_eq!(innate, 0.0);
}

#[test]
fn exact_mode_ignores_the_random_stream() {
    let (graph, opinions) = weighted_star(40);
    let estimator = estimator(40, 3);
    let first = estimator
        .estimate(&graph, &opinions, 0, &mut SmallRng::seed_from_u64(1))
        .expect("vertex exists");
    let second = estimator
        .estimate(&graph, &opinions, 0, &mut SmallRng::seed_from_u64(99))
        .expect("vertex exists");
    assert_eq!(first, second);
}

#[rstest]
#[case(12)]
#[case(25)]
fn num_samples_equal_to_degree_is_the_closed_form(#[case] leaves: usize) {
    let (graph, mut opinions) = weighted_star(leaves);
    opinions[0] = 0.5;
    let incident = graph.incident_weight(0).expect("centre exists");
    let neighbour_sum: f64 = (0..leaves)
        .map(|index| {
            let leaf = graph.neighbors(0).expect("centre exists")[index];
            graph.edge_weight(0, index).expect("index exists") * opinions[leaf]
        })
        .sum();
    let expected = ((1.0 + incident) * opinions[0] - neighbour_sum).clamp(0.0, 1.0);

    let innate = estimator(leaves, 5)
        .estimate(&graph, &opinions, 0, &mut SmallRng::seed_from_u64(3))
        .expect("vertex exists");
    assert_eq!(innate, expected);
    assert!(expected > 0.0 && expected < 1.0, "fixture should avoid clamping");
}

#[test]
fn sampled_mode_recovers_uniform_neighbourhoods_exactly() {
    let leaves = 500;
    let centre = (0.4 + 250.0) / 501.0;
    let (graph, opinions) = uniform_star(leaves, centre, 0.5);
    let mut rng = SmallRng::seed_from_u64(17);
    let innate = estimator(100, 3)
        .estimate(&graph, &opinions, 0, &mut rng)
        .expect("vertex exists");
    assert!((innate - 0.4).abs() < 1e-9, "innate {innate}");
}

/// Zero-weight leaves must never be drawn. Uniform index draws would hit them
/// half of the time, halving the neighbour sum and pushing the estimate to
/// the upper clamp.
#[rstest]
#[case(3, 11)]
#[case(4, 23)]
#[case(5, 37)]
fn sampled_mode_draws_neighbours_in_proportion_to_weight(
    #[case] repetitions: usize,
    #[case] seed: u64,
) {
    let (graph, mut opinions) = zero_one_star(300);
    let incident = graph.incident_weight(0).expect("centre exists");
    assert_eq!(incident, 300.0);
    let neighbour_sum: f64 = graph
        .neighbors(0)
        .expect("centre exists")
        .iter()
        .enumerate()
        .map(|(index, &leaf)| graph.edge_weight(0, index).expect("index exists") * opinions[leaf])
        .sum();
    opinions[0] = (0.4 + neighbour_sum) / (1.0 + incident);

    let exact = estimator(600, 1)
        .estimate(&graph, &opinions, 0, &mut SmallRng::seed_from_u64(seed))
        .expect("vertex exists");
    assert!((exact - 0.4).abs() < 1e-9, "closed form {exact}");

    let sampled = estimator(400, repetitions)
        .estimate(&graph, &opinions, 0, &mut SmallRng::seed_from_u64(seed))
        .expect("vertex exists");
    assert!((sampled - exact).abs() < 0.15, "sampled {sampled} vs exact {exact}");
}

#[test]
fn seeded_batches_are_reproducible_and_deduplicated() {
    let (graph, opinions) = weighted_star(300);
    let estimator = estimator(50, 3);
    let vertices = [0, 4, 0, 9, 4];
    let first = estimator
        .estimate_many_seeded(&graph, &opinions, &vertices, 42)
        .expect("vertices exist");
    let second = estimator
        .estimate_many_seeded(&graph, &opinions, &vertices, 42)
        .expect("vertices exist");
    assert_eq!(first.opinions, second.opinions);
    assert_eq!(first.opinions.keys().copied().collect::<Vec<_>>(), [0, 4, 9]);
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_batches_match_sequential_seeded_batches() {
    let (graph, opinions) = weighted_star(300);
    let estimator = estimator(20, 5);
    let vertices: Vec<usize> = (0..=300).rev().collect();
    let sequential = estimator
        .estimate_many_seeded(&graph, &opinions, &vertices, 7)
        .expect("vertices exist");
    let parallel = estimator
        .estimate_many_parallel(&graph, &opinions, &vertices, 7)
        .expect("vertices exist");
    assert_eq!(sequential.opinions, parallel.opinions);
}

#[test]
fn batch_reports_unknown_vertices() {
    let graph = four_cycle();
    let mut rng = SmallRng::seed_from_u64(5);
    let err = estimator(200, 3)
        .estimate_many(&graph, &CYCLE_OPINIONS, &[1, 8], &mut rng)
        .expect_err("vertex 8 does not exist");
    assert_eq!(
        err,
        EstimateError::Graph(GraphError::VertexOutOfRange {
            vertex: 8,
            num_vertices: 4
        })
    );
}

proptest! {
    #![proptest_config(property_config(64))]

    #[test]
    fn estimates_stay_in_unit_interval(
        opinions in prop::collection::vec(0.0_f64..=1.0, 61),
        num_samples in 1_usize..80,
        repetitions in 1_usize..6,
        seed in any::<u64>(),
    ) {
        let (graph, _) = weighted_star(60);
        let batch = estimator(num_samples, repetitions)
            .estimate_many_seeded(&graph, &opinions, &[0, 1, 30], seed)
            .expect("vertices exist");
        prop_assert!(batch.opinions.values().all(|value| (0.0..=1.0).contains(value)));
    }
}
