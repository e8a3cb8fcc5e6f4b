//! Triage state machine

use crate::failures::extract_failed_tests;
use crate::quarantine::{quarantine, select_quarantine};
use qa_core::{GeneratedTest, RunResult, TriageCategory, TriageOutcome};
use std::path::Path;

const NOTE_BASELINE_FAILED: &str = "baseline tests failed";
const NOTE_QUARANTINED: &str = "disabled uncompilable generated tests (safe policy)";
const NOTE_BUILD_FAILED: &str = "build failed (not clearly from generated tests)";
const NOTE_TESTS_ATTRIBUTED: &str = "tests failed; likely indicates real bug or incorrect contract assumption";
const NOTE_TESTS_UNATTRIBUTED: &str = "test run failed but the failed test list could not be parsed";

/// Everything a run observed after configuration
#[derive(Debug, Clone, Copy)]
pub struct RunEvidence<'a> {
    /// Test phase before any generation
    pub baseline_test: Option<&'a RunResult>,
    /// Build after generation
    pub build_after: &'a RunResult,
    /// Test phase after generation (absent when the build failed)
    pub test_after: Option<&'a RunResult>,
    /// Tests produced by this run
    pub generated: &'a [GeneratedTest],
}

/// Classify `evidence`, quarantining generated tests that broke the build.
///
/// Never fails: unparsable output degrades to a note and rename errors
/// leave the file out of `disabled_generated`.
pub fn triage(repo_root: &Path, evidence: &RunEvidence<'_>) -> TriageOutcome {
    if evidence.baseline_test.is_some_and(|r| !r.ok) {
        return TriageOutcome::with_note(TriageCategory::PreexistingTestFailures, NOTE_BASELINE_FAILED);
    }

    let build = evidence.build_after;
    if !build.ok {
        let output = format!("{}\n{}", build.stderr, build.stdout);
        let selected = select_quarantine(&output, evidence.generated);
        let disabled = quarantine(repo_root, &selected);
        if disabled.is_empty() {
            return TriageOutcome::with_note(TriageCategory::BuildFailure, NOTE_BUILD_FAILED);
        }
        return TriageOutcome {
            disabled_generated: disabled,
            ..TriageOutcome::with_note(TriageCategory::GeneratedBuildFailureDisabled, NOTE_QUARANTINED)
        };
    }

    if let Some(test) = evidence.test_after.filter(|r| !r.ok) {
        let failed = extract_failed_tests(&test.combined_output());
        let note = if failed.is_empty() {
            NOTE_TESTS_UNATTRIBUTED
        } else {
            NOTE_TESTS_ATTRIBUTED
        };
        return TriageOutcome {
            failed_tests: failed,
            ..TriageOutcome::with_note(TriageCategory::TestFailure, note)
        };
    }

    TriageOutcome {
        category: TriageCategory::Ok,
        failed_tests: Vec::new(),
        disabled_generated: Vec::new(),
        notes: Vec::new(),
    }
}
