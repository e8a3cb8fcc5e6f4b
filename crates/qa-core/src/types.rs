//! Core records exchanged between scanner, synthesizer, runner and triage
//!
//! All records are plain serde structs: they are persisted verbatim as run
//! artifacts and returned over the command surface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exit code reported for a phase that hit its wall-clock timeout
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Stderr sentinel reported for a phase that hit its wall-clock timeout
pub const TIMEOUT_MARKER: &str = "TIMEOUT";

/// A scored, reasoned risk signal attached to one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFinding {
    /// Repo-relative path, forward slashes
    pub path: String,
    /// Summed signal weight (always > 0 for emitted findings)
    pub score: u32,
    /// Signal tags in catalogue order
    pub reasons: Vec<String>,
}

impl RiskFinding {
    /// Create a finding
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>, score: u32, reasons: Vec<String>) -> Self {
        Self {
            path: path.into(),
            score,
            reasons,
        }
    }

    /// Check whether a signal tag contributed to this finding
    #[inline]
    #[must_use]
    pub fn has_reason(&self, tag: &str) -> bool {
        self.reasons.iter().any(|r| r == tag)
    }
}

/// A test source file emitted by the synthesizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedTest {
    /// Repo-relative path of the generated file, forward slashes
    pub path: String,
    /// The finding path that triggered generation
    pub target_hint: String,
    /// Human-readable justification
    pub rationale: String,
}

/// Why synthesis needs a human
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationKind {
    /// No header could be discovered for the finding
    NoHeader,
    /// A header was found but no declarations were parsed from it
    ParseFailure,
    /// Declarations were parsed but none matched a contract template
    NoPattern,
}

impl EscalationKind {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoHeader => "no_header",
            Self::ParseFailure => "parse_failure",
            Self::NoPattern => "no_pattern",
        }
    }
}

/// Structured request for human input when synthesis cannot proceed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationQuestion {
    /// Stable identifier (`Q_<hash>`), equal across re-runs
    pub id: String,
    /// Missing artifact category
    pub kind: EscalationKind,
    /// Repo-relative path the question is about
    pub path: String,
    /// What input is needed
    pub message: String,
}

/// One of the three external build/test phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Project configuration (idempotent)
    Configure,
    /// Incremental build
    Build,
    /// Test runner
    Test,
}

impl Phase {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one subprocess invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Exit status was zero
    pub ok: bool,
    /// Phase that was executed
    pub phase: Phase,
    /// Process exit code (124 on timeout)
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl RunResult {
    /// Build a result from an exit code; `ok` iff the code is zero
    #[must_use]
    pub fn from_exit(
        phase: Phase,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) -> Self {
        Self {
            ok: exit_code == 0,
            phase,
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// Result for a phase that exceeded its wall-clock timeout
    #[must_use]
    pub fn timed_out(phase: Phase, stdout: impl Into<String>) -> Self {
        Self {
            ok: false,
            phase,
            exit_code: TIMEOUT_EXIT_CODE,
            stdout: stdout.into(),
            stderr: TIMEOUT_MARKER.to_string(),
        }
    }

    /// Whether this result represents a timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.exit_code == TIMEOUT_EXIT_CODE && self.stderr == TIMEOUT_MARKER
    }

    /// Stdout followed by stderr, newline separated
    #[must_use]
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Terminal classification of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageCategory {
    /// Everything passed
    Ok,
    /// Configure failed before any analysis
    ConfigureFailure,
    /// The baseline build failed before any analysis
    BaselineBuildFailure,
    /// The baseline test run failed; nothing is attributed to generated code
    PreexistingTestFailures,
    /// Post-generation build failed, not attributable to generated tests
    BuildFailure,
    /// Post-generation build failed and the offending generated tests were quarantined
    GeneratedBuildFailureDisabled,
    /// Post-generation tests failed and were not absorbed as flaky
    TestFailure,
}

impl TriageCategory {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::ConfigureFailure => "configure_failure",
            Self::BaselineBuildFailure => "baseline_build_failure",
            Self::PreexistingTestFailures => "preexisting_test_failures",
            Self::BuildFailure => "build_failure",
            Self::GeneratedBuildFailureDisabled => "generated_build_failure_disabled",
            Self::TestFailure => "test_failure",
        }
    }

    /// Whether a run ending in this category counts as a success.
    ///
    /// A quarantined generated test is a self-corrected outcome.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Ok | Self::GeneratedBuildFailureDisabled)
    }
}

impl fmt::Display for TriageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a run's evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageOutcome {
    /// Terminal category
    pub category: TriageCategory,
    /// Failed test names recovered from the runner summary
    pub failed_tests: Vec<String>,
    /// Generated files that were renamed out of the build
    pub disabled_generated: Vec<String>,
    /// Free-text diagnostics
    pub notes: Vec<String>,
}

impl TriageOutcome {
    /// Outcome with only a category and a single note
    #[must_use]
    pub fn with_note(category: TriageCategory, note: impl Into<String>) -> Self {
        Self {
            category,
            failed_tests: Vec::new(),
            disabled_generated: Vec::new(),
            notes: vec![note.into()],
        }
    }

    /// Whether the run counts as a success
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.category.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_result_carries_sentinel() {
        let r = RunResult::timed_out(Phase::Test, "partial");
        assert!(!r.ok);
        assert_eq!(r.exit_code, 124);
        assert_eq!(r.stderr, "TIMEOUT");
        assert!(r.is_timeout());
    }

    #[test]
    fn nonzero_exit_is_not_ok() {
        let r = RunResult::from_exit(Phase::Build, 2, "", "error");
        assert!(!r.ok);
        assert!(!r.is_timeout());
        assert!(RunResult::from_exit(Phase::Build, 0, "", "").ok);
    }

    #[test]
    fn category_wire_names() {
        let json = serde_json::to_string(&TriageCategory::GeneratedBuildFailureDisabled).unwrap();
        assert_eq!(json, "\"generated_build_failure_disabled\"");
        assert_eq!(
            TriageCategory::PreexistingTestFailures.to_string(),
            "preexisting_test_failures"
        );
    }

    #[test]
    fn only_ok_and_quarantine_are_success() {
        assert!(TriageCategory::Ok.is_success());
        assert!(TriageCategory::GeneratedBuildFailureDisabled.is_success());
        assert!(!TriageCategory::BuildFailure.is_success());
        assert!(!TriageCategory::TestFailure.is_success());
        assert!(!TriageCategory::PreexistingTestFailures.is_success());
        assert!(!TriageCategory::ConfigureFailure.is_success());
    }

    #[test]
    fn phase_serializes_lowercase() {
        let r = RunResult::from_exit(Phase::Configure, 0, "", "");
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["phase"], "configure");
    }
}
