use std::{io, path::PathBuf};

use thiserror::Error;
use whakaaro_core::GraphError;

/// Errors raised while reading the text dataset formats.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TextProviderError {
    #[error("failed to open `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read line {line}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
    #[error("input contains no data")]
    EmptyInput,
    #[error("first line must be the vertex count but found `{found}`")]
    MissingHeader { found: String },
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("{file} opinions list {actual} values but the graph has {expected} vertices")]
    OpinionCountMismatch {
        file: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("`{path}`")]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<Self>,
    },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl TextProviderError {
    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            Self::Io { .. } | Self::InFile { .. } => self,
            other => Self::InFile {
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Innermost error, with file context stripped.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::InFile { source, .. } => source.root(),
            other => other,
        }
    }
}
