//! Error types for request and configuration loading
//!
//! These are configuration errors: fatal, reported before any run
//! artifacts beyond the ones already written.

use std::path::PathBuf;

/// Malformed request or configuration input
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// Request document is not a JSON object
    #[error("request must be a JSON object")]
    NotAnObject,

    /// A field has the wrong type or an invalid value
    #[error("invalid request field `{field}`: {reason}")]
    InvalidField {
        /// Field name
        field: &'static str,
        /// What was wrong
        reason: String,
    },

    /// Goal string is not one of the known goals
    #[error("unknown goal: {0}")]
    UnknownGoal(String),

    /// Request document is not valid JSON
    #[error("invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file is not valid TOML for `AgentConfig`
    #[error("invalid config file {path}: {source}")]
    ConfigFile {
        /// Path of the config file
        path: PathBuf,
        /// Parser error
        source: toml::de::Error,
    },

    /// Request or config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

impl RequestError {
    /// Shorthand for [`RequestError::InvalidField`]
    #[inline]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
