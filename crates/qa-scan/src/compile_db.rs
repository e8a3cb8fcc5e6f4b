//! Compile database (`compile_commands.json`) reader

use crate::error::ScanError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Conventional compile database file name
pub const COMPILE_COMMANDS_FILE: &str = "compile_commands.json";

#[derive(Debug, Deserialize)]
struct CompileCommand {
    file: Option<String>,
    directory: Option<String>,
}

/// Locate a compile database, preferring the build directory over the root
#[must_use]
pub fn discover_compile_commands(repo_root: &Path, build_dir: &Path) -> Option<PathBuf> {
    [build_dir.join(COMPILE_COMMANDS_FILE), repo_root.join(COMPILE_COMMANDS_FILE)]
        .into_iter()
        .find(|p| p.is_file())
}

/// Read the translation units listed in a compile database.
///
/// Relative `file` entries resolve against the entry's `directory`.
/// Entries without a `file` are skipped; duplicates are dropped, first
/// occurrence wins.
///
/// # Errors
/// Returns `ScanError` if the file cannot be read or is not a JSON array of
/// objects.
pub fn read_translation_units(path: &Path) -> Result<Vec<PathBuf>, ScanError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let commands: Vec<CompileCommand> =
        serde_json::from_str(&text).map_err(|e| ScanError::CompileDatabase {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut seen = HashSet::new();
    let mut units = Vec::with_capacity(commands.len());
    for command in commands {
        let Some(file) = command.file else {
            continue;
        };
        let file = PathBuf::from(file);
        let resolved = match command.directory {
            Some(dir) if file.is_relative() => Path::new(&dir).join(file),
            _ => file,
        };
        if seen.insert(resolved.clone()) {
            units.push(resolved);
        }
    }

    tracing::debug!(path = %path.display(), units = units.len(), "read compile database");
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join(COMPILE_COMMANDS_FILE);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn dedups_and_resolves_relative_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"[
                {"directory": "/repo/build", "file": "../src/a.cpp", "command": "c++ -c a.cpp"},
                {"directory": "/repo/build", "file": "/repo/src/b.cpp"},
                {"directory": "/repo/build", "file": "../src/a.cpp"},
                {"directory": "/repo/build"}
            ]"#,
        );
        let units = read_translation_units(&path).unwrap();
        assert_eq!(
            units,
            vec![
                PathBuf::from("/repo/build/../src/a.cpp"),
                PathBuf::from("/repo/src/b.cpp"),
            ]
        );
    }

    #[test]
    fn non_array_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), r#"{"file": "a.cpp"}"#);
        assert!(matches!(
            read_translation_units(&path),
            Err(ScanError::CompileDatabase { .. })
        ));
    }

    #[test]
    fn build_dir_database_is_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("build");
        std::fs::create_dir_all(&build).unwrap();
        assert_eq!(discover_compile_commands(dir.path(), &build), None);

        write(dir.path(), "[]");
        assert_eq!(
            discover_compile_commands(dir.path(), &build),
            Some(dir.path().join(COMPILE_COMMANDS_FILE))
        );

        write(&build, "[]");
        assert_eq!(
            discover_compile_commands(dir.path(), &build),
            Some(build.join(COMPILE_COMMANDS_FILE))
        );
    }
}
