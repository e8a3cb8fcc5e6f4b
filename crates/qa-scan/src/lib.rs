//! QA Scan - lexical risk scanner
//!
//! Scores a bounded set of C/C++ translation units by summing the weights of
//! a fixed catalogue of lexical signals plus a branch-density proxy.
//!
//! # Architecture
//!
//! ```text
//! compile_commands.json ─┐
//!                        ├→ candidates → bound to repo root → score → sort
//! filesystem walk ───────┘
//! ```
//!
//! The scan is read-only. An unreadable or out-of-tree file is skipped, never
//! an error; only a malformed compile database aborts the scan.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod compile_db;
pub mod error;
pub mod scanner;
pub mod signals;

pub use compile_db::{discover_compile_commands, read_translation_units, COMPILE_COMMANDS_FILE};
pub use error::ScanError;
pub use scanner::{sort_findings, AnalyzeReport, RiskScanner, ScanOutcome};
pub use signals::{SignalCatalogue, BRANCH_HIGH_TAG, BRANCH_MID_TAG};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
