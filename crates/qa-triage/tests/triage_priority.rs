//! Priority ordering and quarantine behaviour of the triage state machine.

use proptest::prelude::*;
use qa_core::{GeneratedTest, Phase, RunResult, TriageCategory};
use qa_triage::{triage, RunEvidence};
use std::fs;
use std::path::Path;

const GENERATED: &str = "tests/generated/agent_0123456789_generated_test.cpp";

fn result(phase: Phase, ok: bool, stdout: &str, stderr: &str) -> RunResult {
    RunResult::from_exit(phase, if ok { 0 } else { 2 }, stdout, stderr)
}

fn generated() -> Vec<GeneratedTest> {
    vec![GeneratedTest {
        path: GENERATED.to_string(),
        target_hint: "src/legacy.cpp".to_string(),
        rationale: "copy: buffer/length contract edge cases".to_string(),
    }]
}

fn repo_with_generated() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(GENERATED);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "TEST(A, B) {}").unwrap();
    dir
}

fn disabled_path(root: &Path) -> std::path::PathBuf {
    root.join(format!("{GENERATED}.disabled"))
}

proptest! {
    #[test]
    fn failing_baseline_always_wins(
        build_ok in any::<bool>(),
        test_ok in proptest::option::of(any::<bool>()),
        mention_generated in any::<bool>(),
    ) {
        let dir = repo_with_generated();
        let baseline = result(Phase::Test, false, "", "");
        let stderr = if mention_generated { format!("{GENERATED}:1: error") } else { String::new() };
        let build = result(Phase::Build, build_ok, "", &stderr);
        let test = test_ok.map(|ok| result(Phase::Test, ok, "", ""));
        let tests = generated();

        let outcome = triage(dir.path(), &RunEvidence {
            baseline_test: Some(&baseline),
            build_after: &build,
            test_after: test.as_ref(),
            generated: &tests,
        });

        prop_assert_eq!(outcome.category, TriageCategory::PreexistingTestFailures);
        prop_assert!(outcome.disabled_generated.is_empty());
        prop_assert!(dir.path().join(GENERATED).is_file());
    }
}

#[test]
fn build_error_in_generated_test_is_quarantined() {
    let dir = repo_with_generated();
    let baseline = result(Phase::Test, true, "", "");
    let build = result(
        Phase::Build,
        false,
        "",
        &format!("/abs/{GENERATED}:12:3: error: use of undeclared identifier 'legacy'"),
    );
    let tests = generated();

    let outcome = triage(
        dir.path(),
        &RunEvidence {
            baseline_test: Some(&baseline),
            build_after: &build,
            test_after: None,
            generated: &tests,
        },
    );

    assert_eq!(outcome.category, TriageCategory::GeneratedBuildFailureDisabled);
    assert_eq!(outcome.disabled_generated, vec![GENERATED.to_string()]);
    assert!(outcome.is_success());
    assert!(!dir.path().join(GENERATED).exists());
    assert!(disabled_path(dir.path()).is_file());
}

#[test]
fn backslash_diagnostics_are_matched() {
    let dir = repo_with_generated();
    let build = result(
        Phase::Build,
        false,
        &format!("C:\\work\\{}(7): error C2039", GENERATED.replace('/', "\\")),
        "",
    );
    let tests = generated();

    let outcome = triage(
        dir.path(),
        &RunEvidence {
            baseline_test: None,
            build_after: &build,
            test_after: None,
            generated: &tests,
        },
    );
    assert_eq!(outcome.category, TriageCategory::GeneratedBuildFailureDisabled);
}

#[test]
fn unrelated_build_error_renames_nothing() {
    let dir = repo_with_generated();
    let build = result(Phase::Build, false, "", "src/legacy.cpp:3: error: expected ';'");
    let tests = generated();

    let outcome = triage(
        dir.path(),
        &RunEvidence {
            baseline_test: None,
            build_after: &build,
            test_after: None,
            generated: &tests,
        },
    );

    assert_eq!(outcome.category, TriageCategory::BuildFailure);
    assert!(outcome.disabled_generated.is_empty());
    assert!(!outcome.is_success());
    assert!(dir.path().join(GENERATED).is_file());
    assert!(!disabled_path(dir.path()).exists());
}

#[test]
fn mentioned_but_missing_file_is_a_build_failure() {
    let dir = tempfile::tempdir().unwrap();
    let build = result(Phase::Build, false, "", &format!("{GENERATED}: error"));
    let tests = generated();

    let outcome = triage(
        dir.path(),
        &RunEvidence {
            baseline_test: None,
            build_after: &build,
            test_after: None,
            generated: &tests,
        },
    );
    assert_eq!(outcome.category, TriageCategory::BuildFailure);
}

#[test]
fn named_test_failures_are_recovered() {
    let build = result(Phase::Build, true, "", "");
    let test = result(
        Phase::Test,
        false,
        "The following tests FAILED:\n\t  3 - Generated_Safe_div.ZeroDivisor_ReturnsZero (Failed)\n",
        "Errors while running CTest",
    );

    let outcome = triage(
        Path::new("/unused"),
        &RunEvidence {
            baseline_test: None,
            build_after: &build,
            test_after: Some(&test),
            generated: &[],
        },
    );
    assert_eq!(outcome.category, TriageCategory::TestFailure);
    assert_eq!(
        outcome.failed_tests,
        vec!["Generated_Safe_div.ZeroDivisor_ReturnsZero".to_string()]
    );
    assert_eq!(outcome.notes.len(), 1);
}
