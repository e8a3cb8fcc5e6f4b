//! QA Orchestrator - one agent run end to end
//!
//! [`RunOrchestrator::run`] sequences the phases, persisting each raw result
//! under `<state_dir>/<run_id>/` before the next begins:
//!
//! ```text
//! configure ─▶ baseline build ─▶ baseline test ─▶ analyze ─▶ select top N
//!     │              │                 │                          │
//!   abort          abort             abort                 synthesize (unless report_only)
//!                                                                 │
//!                       triage ◀─ test (+ one flaky retry) ◀─ rebuild
//! ```
//!
//! Runs on the same repository root are serialized by [`RepoLocks`]; the
//! known-flaky list ([`FlakyRegistry`]) is read at run start and rewritten
//! when a retry exposes new flaky tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use qa_core::{AgentConfig, AgentRequest};
//! use qa_exec::CMakeTriad;
//! use qa_orchestrator::RunOrchestrator;
//! use std::sync::Arc;
//!
//! let config = AgentConfig::load(repo)?;
//! let triad = Arc::new(CMakeTriad::from_config(repo, &config));
//! let orchestrator = RunOrchestrator::new(repo, config, triad)?;
//! let result = orchestrator.run(&AgentRequest::new("src")).await?;
//! println!("{} ok={}", result.run_id, result.ok);
//! ```

#![warn(unreachable_pub)]

pub mod error;
pub mod flaky;
pub mod locks;
pub mod orchestrator;
pub mod result;
pub mod store;

pub use error::{AgentError, StoreError};
pub use flaky::{FlakyRegistry, KNOWN_FLAKY_FILE};
pub use locks::RepoLocks;
pub use orchestrator::RunOrchestrator;
pub use result::{render_questions_markdown, AbortPhase, AgentRunResult};
pub use store::{git_commit, new_run_id, RunDir, StateStore};
