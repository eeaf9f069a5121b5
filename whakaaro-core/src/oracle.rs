//! Opinion oracles: capabilities that label sampled vertices with opinions.

use std::{
    collections::BTreeMap,
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::error::{EstimateError, define_error_codes};

/// Random-walk parameters forwarded to a walk-based oracle.
///
/// # Examples
/// ```
/// use whakaaro_core::WalkConfig;
///
/// let config = WalkConfig::default();
/// assert_eq!((config.num_steps().get(), config.num_walks().get()), (600, 4000));
/// assert!(WalkConfig::new(0, 10).is_err());
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct WalkConfig {
    num_steps: NonZeroUsize,
    num_walks: NonZeroUsize,
}

impl WalkConfig {
    /// Validates a walk configuration.
    ///
    /// # Errors
    /// Returns [`EstimateError::InvalidParameter`] when either count is zero.
    pub fn new(num_steps: usize, num_walks: usize) -> Result<Self, EstimateError> {
        let num_steps = NonZeroUsize::new(num_steps).ok_or(EstimateError::InvalidParameter {
            parameter: "num_steps",
            got: num_steps,
        })?;
        let num_walks = NonZeroUsize::new(num_walks).ok_or(EstimateError::InvalidParameter {
            parameter: "num_walks",
            got: num_walks,
        })?;
        Ok(Self {
            num_steps,
            num_walks,
        })
    }

    /// Steps per walk.
    #[must_use]
    pub const fn num_steps(&self) -> NonZeroUsize {
        self.num_steps
    }

    /// Walks per vertex.
    #[must_use]
    pub const fn num_walks(&self) -> NonZeroUsize {
        self.num_walks
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            num_steps: NonZeroUsize::MIN.saturating_add(599),
            num_walks: NonZeroUsize::MIN.saturating_add(3999),
        }
    }
}

/// Opinions returned by an oracle together with the time it spent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OracleEstimate {
    /// Opinion per vertex the oracle could label.
    pub opinions: BTreeMap<usize, f64>,
    /// Time the oracle reports for answering the query.
    pub elapsed: Duration,
}

/// Errors raised while querying an oracle.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum OracleError {
    /// The oracle could not be started or reached.
    #[error("oracle `{oracle}` is unavailable: {reason}")]
    Unavailable {
        /// Oracle name.
        oracle: String,
        /// Underlying cause.
        reason: String,
    },
    /// The oracle did not answer within its time limit.
    #[error("oracle `{oracle}` timed out after {timeout:?}")]
    TimedOut {
        /// Oracle name.
        oracle: String,
        /// The limit that expired.
        timeout: Duration,
    },
    /// The oracle answered with output that could not be parsed.
    #[error("oracle output line {line} is malformed: {reason}")]
    MalformedOutput {
        /// 1-based output line.
        line: usize,
        /// Parse failure description.
        reason: String,
    },
    /// The oracle terminated unsuccessfully.
    #[error("oracle `{oracle}` exited with status {status}")]
    Exited {
        /// Oracle name.
        oracle: String,
        /// Exit status description.
        status: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`OracleError`] variants.
    enum OracleErrorCode for OracleError {
        /// The oracle could not be started or reached.
        Unavailable => Unavailable { .. } => "ORACLE_UNAVAILABLE",
        /// The oracle did not answer within its time limit.
        TimedOut => TimedOut { .. } => "ORACLE_TIMED_OUT",
        /// The oracle answered with output that could not be parsed.
        MalformedOutput => MalformedOutput { .. } => "ORACLE_MALFORMED_OUTPUT",
        /// The oracle terminated unsuccessfully.
        Exited => Exited { .. } => "ORACLE_EXITED",
    }
}

/// Capability that labels vertices with opinions.
///
/// Vertices the oracle cannot label are omitted from the answer rather than
/// reported as zero.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use std::time::Duration;
/// use whakaaro_core::{OpinionOracle, OracleError, OracleEstimate, WalkConfig};
///
/// struct Constant(f64);
///
/// impl OpinionOracle for Constant {
///     fn name(&self) -> &str { "constant" }
///     fn estimate_opinions(
///         &self,
///         vertices: &[usize],
///         _config: &WalkConfig,
///     ) -> Result<OracleEstimate, OracleError> {
///         let opinions: BTreeMap<_, _> = vertices.iter().map(|&v| (v, self.0)).collect();
///         Ok(OracleEstimate { opinions, elapsed: Duration::ZERO })
///     }
/// }
///
/// let answer = Constant(0.5).estimate_opinions(&[2, 7, 2], &WalkConfig::default())?;
/// assert_eq!(answer.opinions.len(), 2);
/// # Ok::<(), OracleError>(())
/// ```
pub trait OpinionOracle {
    /// Human-readable oracle name used in diagnostics.
    fn name(&self) -> &str;

    /// Labels every distinct vertex of `vertices` it can.
    ///
    /// # Errors
    /// Returns an [`OracleError`] when the oracle cannot answer.
    fn estimate_opinions(
        &self,
        vertices: &[usize],
        config: &WalkConfig,
    ) -> Result<OracleEstimate, OracleError>;
}

/// Oracle answering from a known opinion vector.
///
/// # Examples
/// ```
/// use whakaaro_core::{GroundTruthOracle, OpinionOracle, WalkConfig};
///
/// let opinions = [0.25, 0.75];
/// let oracle = GroundTruthOracle::new("expressed", &opinions);
/// let answer = oracle.estimate_opinions(&[1, 5], &WalkConfig::default())?;
/// assert_eq!(answer.opinions.get(&1), Some(&0.75));
/// assert!(!answer.opinions.contains_key(&5));
/// # Ok::<(), whakaaro_core::OracleError>(())
/// ```
#[derive(Clone, Copy, Debug)]
pub struct GroundTruthOracle<'o> {
    name: &'o str,
    opinions: &'o [f64],
}

impl<'o> GroundTruthOracle<'o> {
    /// Serves `opinions`, indexed by vertex id.
    #[must_use]
    pub const fn new(name: &'o str, opinions: &'o [f64]) -> Self {
        Self { name, opinions }
    }
}

impl OpinionOracle for GroundTruthOracle<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn estimate_opinions(
        &self,
        vertices: &[usize],
        _config: &WalkConfig,
    ) -> Result<OracleEstimate, OracleError> {
        let started = Instant::now();
        let opinions = vertices
            .iter()
            .filter_map(|&vertex| self.opinions.get(vertex).map(|&value| (vertex, value)))
            .collect();
        Ok(OracleEstimate {
            opinions,
            elapsed: started.elapsed(),
        })
    }
}

impl<T> OpinionOracle for &T
where
    T: OpinionOracle + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn estimate_opinions(
        &self,
        vertices: &[usize],
        config: &WalkConfig,
    ) -> Result<OracleEstimate, OracleError> {
        (**self).estimate_opinions(vertices, config)
    }
}

impl<T> OpinionOracle for Box<T>
where
    T: OpinionOracle + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    fn estimate_opinions(
        &self,
        vertices: &[usize],
        config: &WalkConfig,
    ) -> Result<OracleEstimate, OracleError> {
        (**self).estimate_opinions(vertices, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(OracleError::TimedOut { oracle: "walk".into(), timeout: Duration::from_secs(1) }, "ORACLE_TIMED_OUT")]
    #[case(OracleError::MalformedOutput { line: 2, reason: "eof".into() }, "ORACLE_MALFORMED_OUTPUT")]
    fn oracle_codes_are_stable(#[case] error: OracleError, #[case] expected: &str) {
        assert_eq!(error.code().as_str(), expected);
    }

    #[test]
    fn ground_truth_oracle_works_behind_a_box() {
        let opinions = [0.5, 0.1];
        let oracle: Box<dyn OpinionOracle + '_> = Box::new(GroundTruthOracle::new("innate", &opinions));
        let answer = oracle
            .estimate_opinions(&[0, 0, 1], &WalkConfig::default())
            .expect("ground truth always answers");
        assert_eq!(oracle.name(), "innate");
        assert_eq!(answer.opinions.len(), 2);
    }

    #[test]
    fn borrowed_oracles_forward_queries() {
        use crate::test_utils::CountingOracle;
        use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};

        let calls = Arc::new(AtomicUsize::new(0));
        let opinions = [0.3, 0.6, 0.9];
        let oracle = CountingOracle::new(&opinions, Arc::clone(&calls));
        let borrowed = &oracle;
        let answer = borrowed
            .estimate_opinions(&[2], &WalkConfig::default())
            .expect("known vertex");
        assert_eq!(answer.opinions.get(&2), Some(&0.9));
        assert_eq!(borrowed.name(), "counting");
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }
}
