//! Synthesizer errors

use std::path::PathBuf;
use thiserror::Error;

/// Hard failures while emitting generated tests
#[derive(Debug, Error)]
pub enum SynthError {
    /// Generated-tests directory could not be created
    #[error("cannot create generated-tests directory {path}: {source}")]
    CreateDir {
        /// Directory path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Generated test could not be written
    #[error("cannot write generated test {path}: {source}")]
    Write {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}
