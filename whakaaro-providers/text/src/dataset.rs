//! Loading a complete dataset from its four files.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};
use whakaaro_core::{GroundTruth, WeightedGraph};

use crate::{
    errors::TextProviderError,
    parse::{EdgeList, read_edge_list, read_graph, read_measures, read_opinions},
};

type Result<T> = std::result::Result<T, TextProviderError>;

fn open(path: &Path) -> Result<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TextProviderError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn load_with<T>(path: &Path, read: impl FnOnce(BufReader<File>) -> Result<T>) -> Result<T> {
    read(open(path)?).map_err(|err| err.in_file(path))
}

/// Reads a weighted graph file. See [`read_graph`].
///
/// # Errors
/// Returns [`TextProviderError::Io`] when the file cannot be opened, and
/// otherwise the errors of [`read_graph`] wrapped with the file path.
pub fn load_graph(path: impl AsRef<Path>) -> Result<WeightedGraph> {
    load_with(path.as_ref(), read_graph)
}

/// Reads an opinion file. See [`read_opinions`].
///
/// # Errors
/// As [`load_graph`].
pub fn load_opinions(path: impl AsRef<Path>) -> Result<Vec<f64>> {
    load_with(path.as_ref(), read_opinions)
}

/// Reads a measures file. See [`read_measures`].
///
/// # Errors
/// As [`load_graph`].
pub fn load_measures(path: impl AsRef<Path>) -> Result<GroundTruth> {
    load_with(path.as_ref(), read_measures)
}

/// Reads a graph file as an edge list. See [`read_edge_list`].
///
/// # Errors
/// As [`load_graph`].
pub fn load_edge_list(path: impl AsRef<Path>) -> Result<EdgeList> {
    load_with(path.as_ref(), read_edge_list)
}

/// Locations of the files describing one dataset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetPaths {
    /// Weighted graph.
    pub graph: PathBuf,
    /// Expressed (equilibrium) opinions `z`.
    pub expressed: PathBuf,
    /// Innate opinions `s`.
    pub innate: PathBuf,
    /// Exact measure values.
    pub measures: PathBuf,
}

impl DatasetPaths {
    /// Conventional file names inside `dir`: the graph is shared by every
    /// opinion distribution of a dataset (`<dataset>_G.txt`) while opinions
    /// and measures are per distribution (`<dataset>_<distribution>_z.txt`,
    /// `_s.txt` and `_measures.txt`).
    ///
    /// # Examples
    /// ```
    /// use std::path::Path;
    /// use whakaaro_providers_text::DatasetPaths;
    ///
    /// let paths = DatasetPaths::conventional("data", "karate", "uniform");
    /// assert_eq!(paths.graph, Path::new("data/karate_G.txt"));
    /// assert_eq!(paths.innate, Path::new("data/karate_uniform_s.txt"));
    /// ```
    #[must_use]
    pub fn conventional(dir: impl AsRef<Path>, dataset: &str, distribution: &str) -> Self {
        let dir = dir.as_ref();
        let prefix = format!("{dataset}_{distribution}");
        Self {
            graph: dir.join(format!("{dataset}_G.txt")),
            expressed: dir.join(format!("{prefix}_z.txt")),
            innate: dir.join(format!("{prefix}_s.txt")),
            measures: dir.join(format!("{prefix}_measures.txt")),
        }
    }
}

/// A graph with both opinion vectors and its exact measures.
#[derive(Clone, Debug)]
pub struct Dataset {
    /// The social network.
    pub graph: WeightedGraph,
    /// Expressed opinions indexed by vertex.
    pub expressed: Vec<f64>,
    /// Innate opinions indexed by vertex.
    pub innate: Vec<f64>,
    /// Exact values of the measures.
    pub truth: GroundTruth,
}

impl Dataset {
    /// Loads and cross-checks all four files.
    ///
    /// # Errors
    /// Returns the per-file errors of [`load_graph`] and friends, and
    /// [`TextProviderError::OpinionCountMismatch`] when an opinion file does
    /// not list exactly one value per vertex.
    #[instrument(name = "text.load_dataset", err, skip(paths), fields(graph = %paths.graph.display()))]
    pub fn load(paths: &DatasetPaths) -> Result<Self> {
        let graph = load_graph(&paths.graph)?;
        let expressed = load_opinions(&paths.expressed)?;
        let innate = load_opinions(&paths.innate)?;
        let truth = load_measures(&paths.measures)?;
        let dataset = Self {
            graph,
            expressed,
            innate,
            truth,
        };
        dataset.check_opinion_counts()?;
        debug!(
            vertices = dataset.graph.num_vertices(),
            edges = dataset.graph.num_edges(),
            measures = dataset.truth.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    fn check_opinion_counts(&self) -> Result<()> {
        let expected = self.graph.num_vertices();
        for (file, opinions) in [("expressed", &self.expressed), ("innate", &self.innate)] {
            if opinions.len() != expected {
                return Err(TextProviderError::OpinionCountMismatch {
                    file,
                    expected,
                    actual: opinions.len(),
                });
            }
        }
        Ok(())
    }
}
