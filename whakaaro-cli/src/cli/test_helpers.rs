//! Temporary datasets and command builders shared by the CLI tests.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use super::{Cli, CliError, DatasetArgs, run_cli};

/// A 4-cycle with every opinion at one half, so every estimate is exact.
pub(super) const FLAT_GRAPH: &str = "4\n0 1\n1 2\n2 3\n3 0\n";
pub(super) const FLAT_OPINIONS: &str = "0.5\n0.5\n0.5\n0.5\n";
pub(super) const FLAT_MEASURES: &str = "ac 1\nsumop 2\nap 0\nnorms 1\n";

pub(super) fn temp_dir() -> TempDir {
    match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => panic!("failed to create temp dir: {err}"),
    }
}

pub(super) fn create_text_file(dir: &TempDir, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.path().join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

pub(super) fn write_dataset(
    dir: &TempDir,
    graph: &str,
    expressed: &str,
    innate: &str,
    measures: &str,
) -> io::Result<DatasetArgs> {
    Ok(DatasetArgs {
        graph: create_text_file(dir, "net_G.txt", graph)?,
        expressed: create_text_file(dir, "net_flat_z.txt", expressed)?,
        innate: create_text_file(dir, "net_flat_s.txt", innate)?,
        measures: create_text_file(dir, "net_flat_measures.txt", measures)?,
    })
}

pub(super) fn dataset_flags(dataset: &DatasetArgs) -> Vec<String> {
    [
        ("--graph", &dataset.graph),
        ("--expressed", &dataset.expressed),
        ("--innate", &dataset.innate),
        ("--measures", &dataset.measures),
    ]
    .into_iter()
    .flat_map(|(flag, path)| [flag.to_owned(), display(path)])
    .collect()
}

pub(super) fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Parses `args` after the binary name, panicking on clap errors.
pub(super) fn parse<I, S>(args: I) -> Cli
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let argv = std::iter::once("whakaaro".to_owned()).chain(args.into_iter().map(Into::into));
    match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(err) => panic!("arguments must parse: {err}"),
    }
}

pub(super) fn run_cli_expecting_error(cli: Cli, panic_msg: &str) -> CliError {
    match run_cli(cli) {
        Ok(_) => panic!("{panic_msg}"),
        Err(err) => err,
    }
}
