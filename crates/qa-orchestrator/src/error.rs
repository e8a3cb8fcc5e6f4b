//! Orchestrator errors

use qa_core::RequestError;
use qa_scan::ScanError;
use qa_synth::SynthError;
use std::path::PathBuf;
use thiserror::Error;

/// State directory failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error under the state directory
    #[error("state I/O on {path}: {source}")]
    Io {
        /// Path being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Artifact could not be encoded
    #[error("cannot encode artifact {name}: {source}")]
    Encode {
        /// Artifact name
        name: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

/// Hard failures of a run
#[derive(Debug, Error)]
pub enum AgentError {
    /// Malformed request or configuration file
    #[error(transparent)]
    Request(#[from] RequestError),

    /// Malformed compile database or unreadable repository
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Generated tests could not be written
    #[error(transparent)]
    Synth(#[from] SynthError),

    /// Run artifacts could not be persisted
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Blocking scan or synthesis task panicked or was cancelled
    #[error("background task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// Repository root does not resolve
    #[error("repository root {path} is not accessible: {source}")]
    RepoRoot {
        /// Root as given
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl AgentError {
    /// Whether the caller supplied bad input (request, config, compile database)
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::Request(_) | Self::RepoRoot { .. } => true,
            Self::Scan(e) => matches!(e, ScanError::CompileDatabase { .. }),
            Self::Synth(_) | Self::Store(_) | Self::Worker(_) => false,
        }
    }
}
