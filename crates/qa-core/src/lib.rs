//! QA Core - shared model for the risk-driven test loop
//!
//! Every other crate in the workspace speaks in these types:
//! - [`RiskFinding`] produced by the scanner
//! - [`AgentRequest`] describing one run
//! - [`GeneratedTest`] and [`EscalationQuestion`] produced by the synthesizer
//! - [`RunResult`] produced once per configure/build/test subprocess
//! - [`TriageOutcome`] classifying a run
//!
//! # Example
//!
//! ```rust,ignore
//! use qa_core::{AgentRequest, Goal};
//!
//! let request = AgentRequest::new("src").with_goal(Goal::ApiContract);
//! assert_eq!(request.constraints.max_tests_to_generate, 3);
//! ```

#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod request;
pub mod types;

pub use config::AgentConfig;
pub use error::RequestError;
pub use request::{AgentConstraints, AgentRequest, Goal};
pub use types::{
    EscalationKind, EscalationQuestion, GeneratedTest, Phase, RiskFinding, RunResult,
    TriageCategory, TriageOutcome, TIMEOUT_EXIT_CODE, TIMEOUT_MARKER,
};

/// Source file extensions considered translation units or headers
pub const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "h", "hpp", "hh", "hxx"];

/// Header file extensions, in discovery preference order
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hh", "hxx"];

/// Suffix appended to a quarantined generated test file
pub const DISABLED_SUFFIX: &str = ".disabled";

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Render a path relative to `root` with forward slashes.
///
/// Falls back to the path as given when it is not under `root`.
#[must_use]
pub fn posix_relpath(path: &std::path::Path, root: &std::path::Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) => rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}
