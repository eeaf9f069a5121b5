//! Edge-sampled disagreement on small known graphs.

mod common;

use common::{CYCLE_OPINIONS, four_cycle};
use rand::{SeedableRng, rngs::SmallRng};
use whakaaro_core::{EdgeDisagreementEstimator, ErrorSummary, relative_error};

#[test]
fn full_cycle_sample_reproduces_exact_disagreement() {
    let edges = four_cycle().edge_list();
    let estimator = EdgeDisagreementEstimator::new(&edges);
    let estimate = estimator
        .estimate_indices(&[0, 1, 2, 3], |v| CYCLE_OPINIONS.get(v).copied())
        .expect("every endpoint has an opinion");
    assert!((estimate.disagreement - 1.98).abs() < 1e-12);
    assert_eq!(estimate.evaluated, 4);
    assert_eq!(estimate.skipped, 0);
}

#[test]
fn random_edge_samples_converge_on_the_truth() {
    let edges = four_cycle().edge_list();
    let estimator = EdgeDisagreementEstimator::new(&edges);
    let mut rng = SmallRng::seed_from_u64(2024);
    let errors: Vec<f64> = (0..10)
        .map(|_| {
            let estimate = estimator
                .estimate(20_000, |v| CYCLE_OPINIONS.get(v).copied(), &mut rng)
                .expect("edges exist");
            relative_error(estimate.disagreement, 1.98).expect("truth is non-zero")
        })
        .collect();
    let summary = ErrorSummary::from_samples(&errors).expect("ten repetitions");
    assert!(summary.mean < 0.03, "mean relative error {}", summary.mean);
}
