//! Aggregate opinion measures, their ground-truth table and error metrics.

use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::error::{EstimateError, Result};

/// A graph-wide opinion statistic.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Measure {
    /// `Σ z²`.
    Controversy,
    /// `Σ z`, which equals `Σ s` under the Friedkin–Johnsen equilibrium.
    SumOfOpinions,
    /// `Σ (z − mean z)²`.
    Polarization,
    /// `Σ (z − s)²`.
    InternalConflict,
    /// `Σ z·s`.
    DisagreementControversy,
    /// `Σ s²`.
    SquaredNorm,
    /// `Σ_{(u,v)} w(u,v) (z_u − z_v)²`.
    Disagreement,
}

impl Measure {
    /// Every measure, in the order experiments report them.
    pub const ALL: [Self; 7] = [
        Self::Controversy,
        Self::SumOfOpinions,
        Self::Polarization,
        Self::InternalConflict,
        Self::DisagreementControversy,
        Self::SquaredNorm,
        Self::Disagreement,
    ];

    /// Key used by measure files.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Controversy => "ac",
            Self::SumOfOpinions => "sumop",
            Self::Polarization => "ap",
            Self::InternalConflict => "aci",
            Self::DisagreementControversy => "aidc",
            Self::SquaredNorm => "norms",
            Self::Disagreement => "ad",
        }
    }

    /// Label used in result tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Controversy => "controversy",
            Self::SumOfOpinions => "sumExpOpinions",
            Self::Polarization => "polarization",
            Self::InternalConflict => "internalConflict",
            Self::DisagreementControversy => "disCon",
            Self::SquaredNorm => "norms",
            Self::Disagreement => "ad",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned when parsing a measure key that names no known measure.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown measure key `{0}`")]
pub struct UnknownMeasure(pub String);

impl FromStr for Measure {
    type Err = UnknownMeasure;

    fn from_str(key: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|measure| measure.key() == key)
            .ok_or_else(|| UnknownMeasure(key.to_owned()))
    }
}

/// True values of the measures for one graph and opinion vector.
///
/// # Examples
/// ```
/// use whakaaro_core::{GroundTruth, Measure};
///
/// let mut truth = GroundTruth::default();
/// truth.insert(Measure::Controversy, 12.5);
/// assert_eq!(truth.get(Measure::Controversy), Some(12.5));
/// assert_eq!(truth.get(Measure::Disagreement), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroundTruth {
    values: BTreeMap<Measure, f64>,
}

impl GroundTruth {
    /// Records the true value of `measure`, replacing any previous value.
    pub fn insert(&mut self, measure: Measure, value: f64) -> Option<f64> {
        self.values.insert(measure, value)
    }

    /// Returns the true value of `measure` if known.
    #[must_use]
    pub fn get(&self, measure: Measure) -> Option<f64> {
        self.values.get(&measure).copied()
    }

    /// Iterates the known measures in [`Measure::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Measure, f64)> + '_ {
        self.values.iter().map(|(&measure, &value)| (measure, value))
    }

    /// Number of known measures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no measure is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(Measure, f64)> for GroundTruth {
    fn from_iter<I: IntoIterator<Item = (Measure, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// `|estimate − truth| / truth`.
///
/// # Errors
/// Returns [`EstimateError::UndefinedRelativeError`] when `truth` is zero.
///
/// # Examples
/// ```
/// use whakaaro_core::relative_error;
///
/// assert_eq!(relative_error(1.5, 2.0)?, 0.25);
/// assert!(relative_error(1.0, 0.0).is_err());
/// # Ok::<(), whakaaro_core::EstimateError>(())
/// ```
pub fn relative_error(estimate: f64, truth: f64) -> Result<f64> {
    if truth == 0.0 {
        return Err(EstimateError::UndefinedRelativeError { estimate });
    }
    Ok(absolute_error(estimate, truth) / truth.abs())
}

/// `|estimate − truth|`.
#[must_use]
pub fn absolute_error(estimate: f64, truth: f64) -> f64 {
    (estimate - truth).abs()
}

/// Mean and population standard deviation of a sequence of errors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorSummary {
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation (divisor `n`).
    pub std_dev: f64,
    /// Number of summarised values.
    pub count: usize,
}

impl ErrorSummary {
    /// Summarises `samples`.
    ///
    /// # Errors
    /// Returns [`EstimateError::EmptySample`] when `samples` is empty.
    ///
    /// # Examples
    /// ```
    /// use whakaaro_core::ErrorSummary;
    ///
    /// let summary = ErrorSummary::from_samples(&[1.0, 3.0])?;
    /// assert_eq!(summary.mean, 2.0);
    /// assert_eq!(summary.std_dev, 1.0);
    /// # Ok::<(), whakaaro_core::EstimateError>(())
    /// ```
    pub fn from_samples(samples: &[f64]) -> Result<Self> {
        if samples.is_empty() {
            return Err(EstimateError::EmptySample {
                estimator: "error summary",
            });
        }
        let count = samples.len();
        let n = count as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>()
            / n;
        Ok(Self {
            mean,
            std_dev: variance.sqrt(),
            count,
        })
    }
}

/// One measure's estimate set against its true value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeasureComparison {
    /// The compared measure.
    pub measure: Measure,
    /// True value from the ground-truth table.
    pub truth: f64,
    /// Sampled estimate.
    pub estimate: f64,
    /// Relative error, or `None` when the true value is zero.
    pub relative_error: Option<f64>,
}

impl MeasureComparison {
    /// Pairs `estimate` with `truth`.
    #[must_use]
    pub fn new(measure: Measure, truth: f64, estimate: f64) -> Self {
        Self {
            measure,
            truth,
            estimate,
            relative_error: relative_error(estimate, truth).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ac", Measure::Controversy)]
    #[case("sumop", Measure::SumOfOpinions)]
    #[case("aidc", Measure::DisagreementControversy)]
    #[case("ad", Measure::Disagreement)]
    fn keys_parse_back(#[case] key: &str, #[case] expected: Measure) {
        assert_eq!(key.parse::<Measure>(), Ok(expected));
        assert_eq!(expected.key(), key);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert_eq!(
            "controversy".parse::<Measure>(),
            Err(UnknownMeasure("controversy".to_owned()))
        );
    }

    #[test]
    fn comparison_skips_relative_error_for_zero_truth() {
        let comparison = MeasureComparison::new(Measure::Polarization, 0.0, 0.3);
        assert_eq!(comparison.relative_error, None);
        let comparison = MeasureComparison::new(Measure::Polarization, 4.0, 3.0);
        assert_eq!(comparison.relative_error, Some(0.25));
    }

    #[test]
    fn summary_matches_population_deviation() {
        let summary = ErrorSummary::from_samples(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0])
            .expect("non-empty");
        assert_eq!(summary.mean, 5.0);
        assert_eq!(summary.std_dev, 2.0);
        assert_eq!(summary.count, 8);
        assert!(ErrorSummary::from_samples(&[]).is_err());
    }
}
