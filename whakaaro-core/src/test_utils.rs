//! Shared test utilities for `whakaaro-core`.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use proptest::test_runner::Config as ProptestConfig;
use whakaaro_test_support::ci::property_test_profile::ProptestRunProfile;

use crate::oracle::{GroundTruthOracle, OpinionOracle, OracleError, OracleEstimate, WalkConfig};

/// Builds a proptest configuration from the shared run profile so every
/// property suite honours `WHAKAARO_PBT_CASES` and `WHAKAARO_PBT_FORK`.
#[must_use]
pub(crate) fn suite_proptest_config(default_cases: u32) -> ProptestConfig {
    let profile = ProptestRunProfile::load(default_cases, false);
    ProptestConfig {
        cases: profile.cases(),
        fork: profile.fork(),
        ..ProptestConfig::default()
    }
}

/// [`OpinionOracle`] that answers from a fixed vector and counts queries.
pub(crate) struct CountingOracle<'o> {
    inner: GroundTruthOracle<'o>,
    calls: Arc<AtomicUsize>,
}

impl<'o> CountingOracle<'o> {
    pub(crate) fn new(opinions: &'o [f64], calls: Arc<AtomicUsize>) -> Self {
        Self {
            inner: GroundTruthOracle::new("counting", opinions),
            calls,
        }
    }
}

impl OpinionOracle for CountingOracle<'_> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn estimate_opinions(
        &self,
        vertices: &[usize],
        config: &WalkConfig,
    ) -> Result<OracleEstimate, OracleError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.inner.estimate_opinions(vertices, config)
    }
}
