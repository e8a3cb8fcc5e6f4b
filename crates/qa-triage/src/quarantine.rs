//! Quarantine of uncompilable generated tests

use qa_core::{GeneratedTest, DISABLED_SUFFIX};
use std::fs;
use std::path::Path;

/// Generated tests whose path appears in `build_output`.
///
/// Both the forward-slash and the backslash spelling of each path are
/// matched.
#[must_use]
pub fn select_quarantine<'a>(build_output: &str, generated: &'a [GeneratedTest]) -> Vec<&'a GeneratedTest> {
    generated
        .iter()
        .filter(|g| build_output.contains(&g.path) || build_output.contains(&g.path.replace('/', "\\")))
        .collect()
}

/// Rename each selected `.cpp` file by appending [`DISABLED_SUFFIX`].
///
/// Returns the repo-relative paths actually renamed. Missing files and
/// rename errors are logged and left out.
pub fn quarantine(repo_root: &Path, selected: &[&GeneratedTest]) -> Vec<String> {
    let mut disabled = Vec::new();
    for test in selected {
        let path = repo_root.join(&test.path);
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("cpp") {
            tracing::debug!(path = %test.path, "nothing to quarantine");
            continue;
        }

        let mut target = path.clone().into_os_string();
        target.push(DISABLED_SUFFIX);
        match fs::rename(&path, &target) {
            Ok(()) => {
                tracing::warn!(path = %test.path, "quarantined uncompilable generated test");
                disabled.push(test.path.clone());
            }
            Err(e) => {
                tracing::warn!(path = %test.path, error = %e, "quarantine rename failed");
            }
        }
    }
    disabled
}
