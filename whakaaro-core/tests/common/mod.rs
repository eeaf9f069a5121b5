use proptest::test_runner::Config as ProptestConfig;
use whakaaro_core::{WeightedEdge, WeightedGraph};
use whakaaro_test_support::ci::property_test_profile::ProptestRunProfile;

/// Expressed opinions on [`four_cycle`].
pub const CYCLE_OPINIONS: [f64; 4] = [0.1, 0.9, 0.2, 0.8];

/// Unit-weight cycle `0-1-2-3-0`.
#[must_use]
pub fn four_cycle() -> WeightedGraph {
    WeightedGraph::from_edges(
        4,
        [
            WeightedEdge::unit(0, 1),
            WeightedEdge::unit(1, 2),
            WeightedEdge::unit(2, 3),
            WeightedEdge::unit(3, 0),
        ],
    )
    .expect("cycle edges are valid")
}

/// Star with centre `0` and `leaves` unit-weight leaves. Every leaf expresses
/// `leaf_opinion`; the centre expresses `centre_opinion`.
#[must_use]
pub fn uniform_star(leaves: usize, centre_opinion: f64, leaf_opinion: f64) -> (WeightedGraph, Vec<f64>) {
    let graph = WeightedGraph::from_edges(
        leaves + 1,
        (1..=leaves).map(|leaf| WeightedEdge::unit(0, leaf)),
    )
    .expect("star edges are valid");
    let mut opinions = vec![leaf_opinion; leaves + 1];
    opinions[0] = centre_opinion;
    (graph, opinions)
}

/// Star with centre `0` whose leaves carry distinct weights and opinions.
#[must_use]
pub fn weighted_star(leaves: usize) -> (WeightedGraph, Vec<f64>) {
    let graph = WeightedGraph::from_edges(
        leaves + 1,
        (1..=leaves).map(|leaf| WeightedEdge::new(0, leaf, 0.01 * (leaf % 7 + 1) as f64)),
    )
    .expect("star edges are valid");
    let opinions = (0..=leaves).map(|v| (v % 10) as f64 / 10.0).collect();
    (graph, opinions)
}

/// Proptest settings honouring `WHAKAARO_PBT_CASES` and `WHAKAARO_PBT_FORK`.
#[allow(dead_code, reason = "only the property suites use it")]
#[must_use]
pub fn property_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// Star with centre `0` and `2 × pairs` leaves. Odd leaves hang on
/// zero-weight edges and express `1.0`; even leaves hang on unit edges and
/// express values spread evenly around `0.5`.
#[allow(dead_code, reason = "only the innate suite uses it")]
#[must_use]
pub fn zero_one_star(pairs: usize) -> (WeightedGraph, Vec<f64>) {
    let leaves = 2 * pairs;
    let graph = WeightedGraph::from_edges(
        leaves + 1,
        (1..=leaves).map(|leaf| WeightedEdge::new(0, leaf, if leaf % 2 == 0 { 1.0 } else { 0.0 })),
    )
    .expect("star edges are valid");
    let opinions = (0..=leaves)
        .map(|leaf| {
            if leaf % 2 == 1 {
                1.0
            } else {
                0.5 + 0.001 * ((leaf / 2) % 5) as f64 - 0.002
            }
        })
        .collect();
    (graph, opinions)
}
