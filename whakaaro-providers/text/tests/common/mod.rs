//! Fixtures writing small datasets to a temporary directory.

use std::{fs, io, path::Path};

use tempfile::TempDir;
use whakaaro_providers_text::DatasetPaths;

pub const GRAPH: &str = "4\n0 1 0.5\n1 0 0.5\n1 2\n2 3 2\n3 3 9\n";
pub const EXPRESSED: &str = "0.1\n0.9\n\n0.2\n0.8\n";
pub const INNATE: &str = "0.0\n1.0\n0.3\n0.7\n";
pub const MEASURES: &str = "ac 1.5\nad 1.98\nmystery 4\n\nap 100\n";

pub fn write(dir: &Path, name: &str, contents: &str) -> io::Result<std::path::PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

/// Writes a complete four-file dataset named `cycle`/`uniform`.
pub fn dataset_dir(innate: &str) -> io::Result<(TempDir, DatasetPaths)> {
    let dir = tempfile::tempdir()?;
    let paths = DatasetPaths::conventional(dir.path(), "cycle", "uniform");
    fs::write(&paths.graph, GRAPH)?;
    fs::write(&paths.expressed, EXPRESSED)?;
    fs::write(&paths.innate, innate)?;
    fs::write(&paths.measures, MEASURES)?;
    Ok((dir, paths))
}
