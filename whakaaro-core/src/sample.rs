//! Uniform draws with replacement and the labelled subsamples built from them.

use std::collections::BTreeMap;

use rand::{Rng, seq::SliceRandom};
use tracing::debug;

use crate::error::{EstimateError, Result};

/// Draws `count` vertex identifiers uniformly with replacement from
/// `0..num_vertices`.
///
/// # Errors
/// Returns [`EstimateError::EmptySample`] when a non-zero `count` is
/// requested from an empty population.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use whakaaro_core::sample_vertices;
///
/// let mut rng = SmallRng::seed_from_u64(5);
/// let drawn = sample_vertices(10, 25, &mut rng)?;
/// assert_eq!(drawn.len(), 25);
/// assert!(drawn.iter().all(|&v| v < 10));
/// # Ok::<(), whakaaro_core::EstimateError>(())
/// ```
pub fn sample_vertices<R>(num_vertices: usize, count: usize, rng: &mut R) -> Result<Vec<usize>>
where
    R: Rng + ?Sized,
{
    draw_indices(num_vertices, count, "vertex sampler", rng)
}

/// Draws `count` edge indices uniformly with replacement from
/// `0..num_edges`.
///
/// # Errors
/// Returns [`EstimateError::EmptySample`] when a non-zero `count` is
/// requested from an empty edge list.
pub fn sample_edge_indices<R>(num_edges: usize, count: usize, rng: &mut R) -> Result<Vec<usize>>
where
    R: Rng + ?Sized,
{
    draw_indices(num_edges, count, "edge sampler", rng)
}

/// Draws `count` members of `pool` uniformly with replacement.
///
/// Experiments draw their largest sample once and take every smaller sample
/// from it, so that opinions only have to be obtained for one pool.
///
/// # Errors
/// Returns [`EstimateError::EmptySample`] when a non-zero `count` is
/// requested from an empty pool.
pub fn resample<R>(pool: &[usize], count: usize, rng: &mut R) -> Result<Vec<usize>>
where
    R: Rng + ?Sized,
{
    if count == 0 {
        return Ok(Vec::new());
    }
    (0..count)
        .map(|_| {
            pool.choose(rng).copied().ok_or(EstimateError::EmptySample {
                estimator: "resampler",
            })
        })
        .collect()
}

fn draw_indices<R>(
    population: usize,
    count: usize,
    estimator: &'static str,
    rng: &mut R,
) -> Result<Vec<usize>>
where
    R: Rng + ?Sized,
{
    if count == 0 {
        return Ok(Vec::new());
    }
    if population == 0 {
        return Err(EstimateError::EmptySample { estimator });
    }
    Ok((0..count).map(|_| rng.gen_range(0..population)).collect())
}

/// How the sample size `k` in the `n / k` scale factor is counted.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SampleScale {
    /// `k` is the number of distinct sampled vertices; each contributes once.
    #[default]
    DistinctVertices,
    /// `k` is the number of usable draws; a vertex drawn twice contributes
    /// twice.
    Draws,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Entry {
    value: f64,
    draws: usize,
}

/// Opinions observed on a subsample of vertices.
///
/// Repeated draws of one vertex collapse onto a single entry whose value is
/// the most recent observation; the number of draws is kept for
/// [`SampleScale::Draws`]. Draws without an opinion are excluded and only
/// counted.
///
/// # Examples
/// ```
/// use whakaaro_core::{OpinionSample, SampleScale};
///
/// let opinions = [0.2, 0.4, 0.9];
/// let sample = OpinionSample::from_draws([0, 2, 2, 5], |v| opinions.get(v).copied());
/// assert_eq!(sample.len(), 2);
/// assert_eq!(sample.draws(), 3);
/// assert_eq!(sample.excluded(), 1);
/// assert_eq!(sample.size(SampleScale::DistinctVertices), 2);
/// assert_eq!(sample.size(SampleScale::Draws), 3);
/// assert_eq!(sample.get(2), Some(0.9));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpinionSample {
    entries: BTreeMap<usize, Entry>,
    excluded: usize,
}

impl OpinionSample {
    /// Builds a sample from a sequence of draws, looking up each vertex's
    /// opinion.
    pub fn from_draws<I, F>(draws: I, mut lookup: F) -> Self
    where
        I: IntoIterator<Item = usize>,
        F: FnMut(usize) -> Option<f64>,
    {
        let mut sample = Self::default();
        for vertex in draws {
            match lookup(vertex) {
                Some(value) => sample.observe(vertex, value),
                None => sample.excluded += 1,
            }
        }
        if sample.excluded > 0 {
            debug!(
                excluded = sample.excluded,
                retained = sample.entries.len(),
                "draws without an opinion were excluded from the sample",
            );
        }
        sample
    }

    /// Builds a sample in which every `(vertex, value)` pair counts as one
    /// draw.
    ///
    /// # Examples
    /// ```
    /// use whakaaro_core::OpinionSample;
    ///
    /// let sample = OpinionSample::from_values([(3, 0.5), (1, 0.25)]);
    /// let pairs: Vec<_> = sample.iter().collect();
    /// assert_eq!(pairs, [(1, 0.25), (3, 0.5)]);
    /// ```
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut sample = Self::default();
        for (vertex, value) in values {
            sample.observe(vertex, value);
        }
        sample
    }

    fn observe(&mut self, vertex: usize, value: f64) {
        let entry = self.entries.entry(vertex).or_insert(Entry { value, draws: 0 });
        entry.value = value;
        entry.draws += 1;
    }

    /// Number of distinct vertices carrying an opinion.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no draw produced an opinion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of draws that produced an opinion, repeats included.
    #[must_use]
    pub fn draws(&self) -> usize {
        self.entries.values().map(|entry| entry.draws).sum()
    }

    /// Number of draws excluded because no opinion was available.
    #[must_use]
    pub const fn excluded(&self) -> usize {
        self.excluded
    }

    /// Sample size `k` under `scale`.
    #[must_use]
    pub fn size(&self, scale: SampleScale) -> usize {
        match scale {
            SampleScale::DistinctVertices => self.len(),
            SampleScale::Draws => self.draws(),
        }
    }

    /// Opinion observed for `vertex`, if it was sampled.
    #[must_use]
    pub fn get(&self, vertex: usize) -> Option<f64> {
        self.entries.get(&vertex).map(|entry| entry.value)
    }

    /// Iterates `(vertex, opinion)` pairs in increasing vertex order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().map(|(&vertex, entry)| (vertex, entry.value))
    }

    /// Iterates `(vertex, opinion, multiplicity)` triples, where the
    /// multiplicity is how often the vertex counts towards `k` under `scale`.
    pub fn weighted(&self, scale: SampleScale) -> impl Iterator<Item = (usize, f64, usize)> + '_ {
        self.entries.iter().map(move |(&vertex, entry)| {
            let multiplicity = match scale {
                SampleScale::DistinctVertices => 1,
                SampleScale::Draws => entry.draws,
            };
            (vertex, entry.value, multiplicity)
        })
    }

    /// Iterates the sampled vertices in increasing order.
    pub fn vertices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }
}

impl FromIterator<(usize, f64)> for OpinionSample {
    fn from_iter<I: IntoIterator<Item = (usize, f64)>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    #[test]
    fn repeated_draws_keep_the_latest_value() {
        let sample = OpinionSample::from_values([(4, 0.1), (4, 0.7), (2, 0.3)]);
        assert_eq!(sample.get(4), Some(0.7));
        assert_eq!(sample.len(), 2);
        assert_eq!(sample.draws(), 3);
        let weighted: Vec<_> = sample.weighted(SampleScale::Draws).collect();
        assert_eq!(weighted, [(2, 0.3, 1), (4, 0.7, 2)]);
    }

    #[test]
    fn missing_opinions_are_excluded_not_zeroed() {
        let sample = OpinionSample::from_draws([0, 1, 2, 3], |v| (v % 2 == 0).then_some(1.0));
        assert_eq!(sample.vertices().collect::<Vec<_>>(), [0, 2]);
        assert_eq!(sample.excluded(), 2);
        assert_eq!(sample.get(1), None);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(0, 3)]
    #[case(7, 0)]
    fn empty_requests_and_populations(#[case] population: usize, #[case] count: usize) {
        let mut rng = SmallRng::seed_from_u64(1);
        let drawn = sample_vertices(population, count, &mut rng);
        if count == 0 {
            assert_eq!(drawn, Ok(Vec::new()));
        } else {
            assert_eq!(
                drawn,
                Err(EstimateError::EmptySample {
                    estimator: "vertex sampler"
                })
            );
        }
    }

    #[test]
    fn resampling_stays_within_the_pool() {
        let mut rng = SmallRng::seed_from_u64(21);
        let pool = [3, 9, 14];
        let drawn = resample(&pool, 200, &mut rng).expect("pool is non-empty");
        assert_eq!(drawn.len(), 200);
        assert!(drawn.iter().all(|v| pool.contains(v)));
        assert!(resample(&[], 1, &mut rng).is_err());
    }

    #[test]
    fn edge_indices_cover_the_range() {
        let mut rng = SmallRng::seed_from_u64(8);
        let drawn = sample_edge_indices(4, 400, &mut rng).expect("edges exist");
        let mut seen = [false; 4];
        for index in drawn {
            seen[index] = true;
        }
        assert!(seen.iter().all(|&hit| hit));
    }
}
