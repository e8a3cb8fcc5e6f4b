//! QA Exec - the configure/build/test triad as subprocesses
//!
//! [`ProcessRunner`] executes one [`PhaseCommand`] and always yields a
//! [`RunResult`](qa_core::RunResult): non-zero exits, spawn failures and
//! timeouts are encoded in the result, never raised. [`BuildTriad`] is the
//! seam the orchestrator drives; [`CMakeTriad`] binds it to CMake/CTest.
//!
//! # Example
//!
//! ```rust,ignore
//! use qa_exec::{BuildTriad, CMakeTriad};
//!
//! let triad = CMakeTriad::new(repo_root, repo_root.join("build"));
//! let configured = triad.configure().await;
//! if configured.ok {
//!     let tests = triad.test(&["Flaky.Test".to_string()]).await;
//! }
//! ```

#![warn(unreachable_pub)]

pub mod cmake;
pub mod runner;
pub mod triad;

pub use cmake::{exclusion_pattern, CMakeTriad};
pub use runner::{PhaseCommand, ProcessRunner, SIGNAL_EXIT_CODE, SPAWN_FAILURE_EXIT_CODE};
pub use triad::BuildTriad;
