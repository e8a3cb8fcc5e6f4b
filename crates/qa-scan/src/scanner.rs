//! Risk scanner
//!
//! Turns a candidate list into a deterministically ordered findings list.
//! Candidates are resolved (following symlinks) and bounded to the
//! repository root before they are read.

use crate::compile_db::read_translation_units;
use crate::error::ScanError;
use crate::signals::SignalCatalogue;
use qa_core::{posix_relpath, RiskFinding, SOURCE_EXTENSIONS};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Persisted result of one analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeReport {
    /// Canonical repository root
    pub repo_root: String,
    /// Compile database used, if any
    pub compile_commands: Option<String>,
    /// Findings, score descending then path ascending
    pub findings: Vec<RiskFinding>,
    /// Candidates skipped because they resolve outside the repository
    pub skipped_out_of_tree: usize,
}

impl AnalyzeReport {
    /// The `n` highest-ranked findings
    #[must_use]
    pub fn top(&self, n: usize) -> &[RiskFinding] {
        &self.findings[..n.min(self.findings.len())]
    }
}

/// Findings from an explicit candidate list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Sorted findings
    pub findings: Vec<RiskFinding>,
    /// Candidates outside the repository root
    pub skipped_out_of_tree: usize,
}

/// Lexical risk scanner
#[derive(Debug, Clone, Default)]
pub struct RiskScanner {
    catalogue: SignalCatalogue,
}

impl RiskScanner {
    /// Create a scanner with the built-in catalogue
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal catalogue in use
    #[inline]
    #[must_use]
    pub fn catalogue(&self) -> &SignalCatalogue {
        &self.catalogue
    }

    /// Score a file's text
    #[inline]
    #[must_use]
    pub fn score_text(&self, text: &str) -> (u32, Vec<String>) {
        self.catalogue.score(text)
    }

    /// Analyze `target` (relative to `repo_root`).
    ///
    /// Uses the compile database when given, restricted to the target
    /// subtree; otherwise walks the target directory for C/C++ sources.
    ///
    /// # Errors
    /// Returns `ScanError` if the repository root cannot be resolved or the
    /// compile database is malformed.
    pub fn analyze(
        &self,
        repo_root: &Path,
        compile_commands: Option<&Path>,
        target: &str,
    ) -> Result<AnalyzeReport, ScanError> {
        let root = canonical(repo_root)?;
        let target_dir = root.join(target);

        let outcome = match compile_commands {
            Some(db) => {
                let units = read_translation_units(db)?;
                match target_dir.canonicalize() {
                    Ok(scope) => self.scan_files_in_scope(&root, &units, Some(&scope)),
                    Err(e) => {
                        tracing::warn!(target_dir = %target_dir.display(), error = %e, "analysis target not found");
                        ScanOutcome::default()
                    }
                }
            }
            None => {
                let files = walk_sources(&target_dir);
                self.scan_files_in_scope(&root, &files, None)
            }
        };

        tracing::info!(
            findings = outcome.findings.len(),
            skipped_out_of_tree = outcome.skipped_out_of_tree,
            "risk analysis complete"
        );

        Ok(AnalyzeReport {
            repo_root: root.to_string_lossy().replace('\\', "/"),
            compile_commands: compile_commands.map(|p| p.to_string_lossy().replace('\\', "/")),
            findings: outcome.findings,
            skipped_out_of_tree: outcome.skipped_out_of_tree,
        })
    }

    /// Score an explicit candidate list bounded to `repo_root`
    #[must_use]
    pub fn scan_files(&self, repo_root: &Path, files: &[PathBuf]) -> ScanOutcome {
        match repo_root.canonicalize() {
            Ok(root) => self.scan_files_in_scope(&root, files, None),
            Err(e) => {
                tracing::warn!(root = %repo_root.display(), error = %e, "repository root not accessible");
                ScanOutcome::default()
            }
        }
    }

    fn scan_files_in_scope(&self, root: &Path, files: &[PathBuf], scope: Option<&Path>) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        let mut seen = HashSet::new();

        for file in files {
            let candidate = if file.is_relative() { root.join(file) } else { file.clone() };
            let Ok(resolved) = candidate.canonicalize() else {
                tracing::debug!(file = %file.display(), "skipping unresolvable candidate");
                continue;
            };
            if !resolved.starts_with(root) {
                tracing::debug!(file = %resolved.display(), "skipping candidate outside repository");
                outcome.skipped_out_of_tree += 1;
                continue;
            }
            if scope.is_some_and(|s| !resolved.starts_with(s)) {
                continue;
            }
            if !seen.insert(resolved.clone()) {
                continue;
            }

            let text = match std::fs::read(&resolved) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    tracing::debug!(file = %resolved.display(), error = %e, "skipping unreadable candidate");
                    continue;
                }
            };

            let (score, reasons) = self.score_text(&text);
            if score == 0 {
                continue;
            }
            outcome
                .findings
                .push(RiskFinding::new(posix_relpath(&resolved, root), score, reasons));
        }

        sort_findings(&mut outcome.findings);
        outcome
    }
}

/// Sort findings by score descending, ties by path ascending
pub fn sort_findings(findings: &mut [RiskFinding]) {
    findings.sort_by(|a, b| match b.score.cmp(&a.score) {
        Ordering::Equal => a.path.cmp(&b.path),
        other => other,
    });
}

fn canonical(path: &Path) -> Result<PathBuf, ScanError> {
    path.canonicalize().map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// C/C++ sources under `dir`, hidden directories skipped.
///
/// Symlinked files are kept; the caller bounds their targets to the root.
fn walk_sources(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        tracing::warn!(target_dir = %dir.display(), "analysis target is not a directory");
        return Vec::new();
    }
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file() && is_source(e.path()))
        .map(DirEntry::into_path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        dir
    }

    #[test]
    fn findings_sorted_by_score_then_path() {
        let mut findings = vec![
            RiskFinding::new("b.cpp", 3, vec![]),
            RiskFinding::new("a.cpp", 3, vec![]),
            RiskFinding::new("z.cpp", 9, vec![]),
        ];
        sort_findings(&mut findings);
        let paths: Vec<_> = findings.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["z.cpp", "a.cpp", "b.cpp"]);
    }

    #[test]
    fn walk_skips_hidden_and_non_sources() {
        let dir = repo();
        fs::write(dir.path().join("src/a.CPP"), "strcpy(a, b);").unwrap();
        fs::write(dir.path().join("src/notes.txt"), "strcpy(a, b);").unwrap();
        fs::create_dir_all(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join(".cache/x.cpp"), "strcpy(a, b);").unwrap();

        let report = RiskScanner::new().analyze(dir.path(), None, ".").unwrap();
        let paths: Vec<_> = report.findings.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/a.CPP"]);
    }

    #[test]
    fn zero_score_files_are_omitted() {
        let dir = repo();
        fs::write(dir.path().join("src/clean.h"), "int x;").unwrap();
        let report = RiskScanner::new().analyze(dir.path(), None, "src").unwrap();
        assert!(report.findings.is_empty());
    }

    #[test]
    fn missing_target_yields_empty_report() {
        let dir = repo();
        let report = RiskScanner::new().analyze(dir.path(), None, "nope").unwrap();
        assert!(report.findings.is_empty());
    }

    #[test]
    fn out_of_tree_candidates_are_counted_not_scored() {
        let outside = tempfile::tempdir().unwrap();
        let outside_file = outside.path().join("evil.cpp");
        fs::write(&outside_file, "malloc(1); strcpy(a, b);").unwrap();

        let dir = repo();
        let inside = dir.path().join("src/in.cpp");
        fs::write(&inside, "free(p);").unwrap();

        let outcome = RiskScanner::new().scan_files(dir.path(), &[outside_file, inside.clone(), inside]);
        assert_eq!(outcome.skipped_out_of_tree, 1);
        assert_eq!(outcome.findings.len(), 1);
        assert_eq!(outcome.findings[0].path, "src/in.cpp");
    }

    #[test]
    fn unreadable_candidates_are_skipped() {
        let dir = repo();
        let outcome = RiskScanner::new().scan_files(dir.path(), &[dir.path().join("src/gone.cpp")]);
        assert_eq!(outcome, ScanOutcome::default());
    }

    #[test]
    fn invalid_utf8_is_read_lossily() {
        let dir = repo();
        let mut bytes = b"memcpy(a, b, n); ".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, 0x00]);
        fs::write(dir.path().join("src/bin.c"), bytes).unwrap();
        let report = RiskScanner::new().analyze(dir.path(), None, ".").unwrap();
        assert!(report.findings[0].has_reason("memcpy_like"));
    }

    #[test]
    fn compile_database_restricted_to_target() {
        let dir = repo();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("src/a.cpp"), "strcpy(a, b);").unwrap();
        fs::write(dir.path().join("lib/b.cpp"), "strcpy(a, b);").unwrap();
        let db = dir.path().join("compile_commands.json");
        let body = serde_json::json!([
            {"directory": dir.path(), "file": "src/a.cpp"},
            {"directory": dir.path(), "file": "lib/b.cpp"}
        ]);
        fs::write(&db, body.to_string()).unwrap();

        let scanner = RiskScanner::new();
        let all = scanner.analyze(dir.path(), Some(&db), ".").unwrap();
        assert_eq!(all.findings.len(), 2);
        assert!(all.compile_commands.is_some());

        let scoped = scanner.analyze(dir.path(), Some(&db), "lib").unwrap();
        assert_eq!(scoped.findings.len(), 1);
        assert_eq!(scoped.findings[0].path, "lib/b.cpp");
    }

    #[test]
    fn compile_database_with_missing_target_is_empty() {
        let dir = repo();
        fs::write(dir.path().join("src/a.cpp"), "strcpy(a, b);").unwrap();
        let db = dir.path().join("compile_commands.json");
        let body = serde_json::json!([{"directory": dir.path(), "file": "src/a.cpp"}]);
        fs::write(&db, body.to_string()).unwrap();

        let report = RiskScanner::new().analyze(dir.path(), Some(&db), "nope").unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(report.skipped_out_of_tree, 0);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_source_inside_repo_is_scored() {
        let dir = repo();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("lib/real.cpp"), "strcpy(a, b);").unwrap();
        std::os::unix::fs::symlink(dir.path().join("lib/real.cpp"), dir.path().join("src/link.cpp")).unwrap();

        let report = RiskScanner::new().analyze(dir.path(), None, "src").unwrap();
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].path, "lib/real.cpp");
        assert!(report.findings[0].has_reason("memcpy_like"));
        assert_eq!(report.skipped_out_of_tree, 0);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_leaving_repo_is_counted_out_of_tree() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("evil.cpp"), "malloc(1); strcpy(a, b);").unwrap();

        let dir = repo();
        std::os::unix::fs::symlink(outside.path().join("evil.cpp"), dir.path().join("src/evil.cpp")).unwrap();

        let report = RiskScanner::new().analyze(dir.path(), None, "src").unwrap();
        assert!(report.findings.is_empty());
        assert_eq!(report.skipped_out_of_tree, 1);
    }

    #[test]
    fn malformed_compile_database_is_fatal() {
        let dir = repo();
        let db = dir.path().join("compile_commands.json");
        fs::write(&db, "not json").unwrap();
        assert!(RiskScanner::new().analyze(dir.path(), Some(&db), ".").is_err());
    }

    #[test]
    fn top_is_bounded() {
        let report = AnalyzeReport {
            repo_root: "/r".into(),
            compile_commands: None,
            findings: vec![RiskFinding::new("a", 1, vec![])],
            skipped_out_of_tree: 0,
        };
        assert_eq!(report.top(5).len(), 1);
        assert_eq!(report.top(0).len(), 0);
    }
}
