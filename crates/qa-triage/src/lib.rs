//! QA Triage - classify a run's evidence
//!
//! Categories are evaluated in strict priority order:
//!
//! ```text
//! baseline test failed ─────────────▶ preexisting_test_failures
//! after build failed ─┬─ mentions generated file ─▶ generated_build_failure_disabled
//!                     └─ otherwise ───────────────▶ build_failure
//! after test failed ────────────────▶ test_failure
//! otherwise ────────────────────────▶ ok
//! ```
//!
//! The quarantine decision ([`select_quarantine`]) is pure; the rename
//! ([`quarantine`]) is the only side effect and never fails the triage.

#![warn(unreachable_pub)]

pub mod failures;
pub mod quarantine;
pub mod triage;

pub use failures::extract_failed_tests;
pub use quarantine::{quarantine, select_quarantine};
pub use triage::{triage, RunEvidence};
