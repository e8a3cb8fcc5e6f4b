//! End-to-end synthesis over temporary repositories.

use pretty_assertions::assert_eq;
use qa_core::{EscalationKind, RiskFinding};
use qa_synth::{SynthesisHints, TestSynthesizer};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const COPY_DECL: &str = "size_t Copy(char* dst, size_t dst_size, const char* src);\n";

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

fn finding(path: &str) -> RiskFinding {
    RiskFinding::new(path, 4, vec!["memcpy_like".to_string()])
}

fn synth(root: &Path) -> TestSynthesizer {
    TestSynthesizer::new(root, root.join("tests/generated"))
}

fn generated_text(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

#[test]
fn copy_contract_uses_single_namespace() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/buf.h", &format!("namespace buf {{\n{COPY_DECL}}}\n"));
    write(dir.path(), "src/buf.cpp", "#include \"buf.h\"\n");

    let out = synth(dir.path())
        .synthesize(&[finding("src/buf.cpp")], 3, &SynthesisHints::default())
        .unwrap();
    assert_eq!(out.generated.len(), 1);
    assert!(out.questions.is_empty());

    let test = &out.generated[0];
    assert_eq!(test.target_hint, "src/buf.cpp");
    assert!(test.path.starts_with("tests/generated/agent_"));
    let text = generated_text(dir.path(), &test.path);
    assert!(text.contains("#include \"src/buf.h\""));
    for case in ["NullDstOrZeroSize_NoCrash", "NullSrc_NullTerminates", "Truncation_NullTerminates_AndReturnBounded"] {
        assert!(text.contains(&format!("TEST(Generated_Copy, {case})")), "missing {case}");
    }
    assert!(text.contains("buf::Copy(nullptr"));
}

#[test]
fn copy_contract_unqualified_without_unique_namespace() {
    for header in [
        COPY_DECL.to_string(),
        format!("namespace a {{\n{COPY_DECL}}}\nnamespace b {{\nint x();\n}}\n"),
    ] {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/buf.h", &header);

        let out = synth(dir.path())
            .synthesize(&[finding("src/buf.h")], 3, &SynthesisHints::default())
            .unwrap();
        let text = generated_text(dir.path(), &out.generated[0].path);
        assert!(text.contains("EXPECT_EQ(Copy(nullptr"), "{text}");
        assert!(!text.contains("::Copy("));
    }
}

#[test]
fn safe_div_asserts_literal_zero_only_with_contract() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "src/math.h",
        "// Contract: if b == 0, returns 0.\nint SafeDiv(int a, int b);\n",
    );
    write(dir.path(), "src/plain.h", "int SafeDiv(int a, int b);\n");

    let out = synth(dir.path())
        .synthesize(&[finding("src/math.h"), finding("src/plain.h")], 3, &SynthesisHints::default())
        .unwrap();
    assert_eq!(out.generated.len(), 2);

    let strict = generated_text(dir.path(), &out.generated[0].path);
    assert!(strict.contains("EXPECT_EQ(SafeDiv(10, 0), 0);"));

    let loose = generated_text(dir.path(), &out.generated[1].path);
    assert!(loose.contains("ZeroDivisor_NoCrash"));
    assert!(!loose.contains("EXPECT_EQ(SafeDiv(10, 0), 0);"));
}

#[test]
fn reruns_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/buf.h", COPY_DECL);
    write(dir.path(), "src/orphan.cpp", "strcpy(a, b);");
    let findings = [finding("src/buf.h"), finding("src/orphan.cpp"), finding("src/orphan.cpp")];

    let first = synth(dir.path()).synthesize(&findings, 3, &SynthesisHints::default()).unwrap();
    let second = synth(dir.path()).synthesize(&findings, 3, &SynthesisHints::default()).unwrap();
    assert_eq!(first, second);

    assert_eq!(first.questions.len(), 1);
    assert_eq!(first.questions[0].kind, EscalationKind::NoHeader);
    assert!(first.questions[0].id.starts_with("Q_"));

    let files = fs::read_dir(dir.path().join("tests/generated")).unwrap().count();
    assert_eq!(files, 1);
}

#[test]
fn escalations_cover_parse_and_pattern_gaps() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/macros.h", "#define MAX(a, b) ((a) > (b) ? (a) : (b))\n");
    write(dir.path(), "src/misc.h", "void reset(int* p);\n");

    let out = synth(dir.path())
        .synthesize(&[finding("src/macros.h"), finding("src/misc.h")], 3, &SynthesisHints::default())
        .unwrap();
    assert!(out.generated.is_empty());
    let kinds: Vec<_> = out.questions.iter().map(|q| (q.kind, q.path.as_str())).collect();
    assert_eq!(
        kinds,
        vec![
            (EscalationKind::ParseFailure, "src/macros.h"),
            (EscalationKind::NoPattern, "src/misc.h"),
        ]
    );
    assert!(!dir.path().join("tests/generated").exists());
}

#[test]
fn budget_stops_synthesis() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/a.h", COPY_DECL);
    write(dir.path(), "src/b.h", "int div2(int a, int b);\n");

    let out = synth(dir.path())
        .synthesize(&[finding("src/a.h"), finding("src/b.h")], 1, &SynthesisHints::default())
        .unwrap();
    assert_eq!(out.generated.len(), 1);
    assert_eq!(out.generated[0].target_hint, "src/a.h");
}

#[test]
fn overrides_select_header_namespace_and_functions() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "include/api.h",
        &format!("{COPY_DECL}int SafeDiv(int a, int b);\n"),
    );
    write(dir.path(), "src/impl.cpp", "memcpy(a, b, n);");

    let hints = SynthesisHints {
        force_header: Some("include/api.h".to_string()),
        force_namespace: Some("vendor".to_string()),
        force_functions: Some(BTreeSet::from(["SafeDiv".to_string()])),
    };
    let out = synth(dir.path()).synthesize(&[finding("src/impl.cpp")], 3, &hints).unwrap();
    assert_eq!(out.generated.len(), 1);
    assert_eq!(out.generated[0].rationale, "SafeDiv: divide-by-zero edge/contract");

    let text = generated_text(dir.path(), &out.generated[0].path);
    assert!(text.contains("#include \"include/api.h\""));
    assert!(text.contains("vendor::SafeDiv(10, 0)"));
    assert!(!text.contains("Copy("));
}

#[test]
fn missing_forced_header_escalates() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/impl.cpp", "memcpy(a, b, n);");
    let hints = SynthesisHints {
        force_header: Some("include/missing.h".to_string()),
        ..SynthesisHints::default()
    };
    let out = synth(dir.path()).synthesize(&[finding("src/impl.cpp")], 3, &hints).unwrap();
    assert_eq!(out.questions.len(), 1);
    assert_eq!(out.questions[0].kind, EscalationKind::NoHeader);
}

#[test]
fn quarantined_tests_are_not_regenerated() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/buf.h", COPY_DECL);
    let findings = [finding("src/buf.h")];

    let first = synth(dir.path()).synthesize(&findings, 3, &SynthesisHints::default()).unwrap();
    let path = dir.path().join(&first.generated[0].path);
    fs::rename(&path, format!("{}.disabled", path.display())).unwrap();

    let second = synth(dir.path()).synthesize(&findings, 3, &SynthesisHints::default()).unwrap();
    assert!(second.generated.is_empty());
    assert!(!path.exists());
}

#[test]
fn source_and_header_sharing_a_header_render_once() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "include/buf.h", COPY_DECL);
    write(dir.path(), "src/buf.cpp", "#include \"buf.h\"\nstrcpy(a, b);\n");

    let out = synth(dir.path())
        .synthesize(&[finding("src/buf.cpp"), finding("include/buf.h")], 3, &SynthesisHints::default())
        .unwrap();
    assert_eq!(out.generated.len(), 1);
    assert_eq!(out.generated[0].target_hint, "src/buf.cpp");
    assert!(out.questions.is_empty());

    let files: Vec<_> = fs::read_dir(dir.path().join("tests/generated")).unwrap().collect();
    assert_eq!(files.len(), 1);
    let text = generated_text(dir.path(), &out.generated[0].path);
    assert_eq!(text.matches("TEST(Generated_Copy, NullDstOrZeroSize_NoCrash)").count(), 1);
}

#[test]
fn out_dir_outside_repository_is_reported_absolute() {
    let dir = tempfile::tempdir().unwrap();
    let elsewhere = tempfile::tempdir().unwrap();
    write(dir.path(), "src/buf.h", COPY_DECL);

    let out = TestSynthesizer::new(dir.path(), elsewhere.path())
        .synthesize(&[finding("src/buf.h")], 3, &SynthesisHints::default())
        .unwrap();
    let path = &out.generated[0].path;
    assert!(path.starts_with('/') && !path.starts_with("//"), "{path}");
    assert!(Path::new(path).is_file());
    assert!(Path::new(path).starts_with(elsewhere.path()));
}
