//! Scan errors
//!
//! Per-file problems are never errors; these cover the inputs that make the
//! whole scan meaningless.

use std::path::PathBuf;

/// Fatal scan error
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Compile database is not a JSON array of command objects
    #[error("malformed compile database {path}: {reason}")]
    CompileDatabase {
        /// Database path
        path: PathBuf,
        /// Parse failure
        reason: String,
    },

    /// Compile database or repository root could not be accessed
    #[error("cannot access {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}
