//! Run artifact persistence
//!
//! Layout under the state directory:
//!
//! ```text
//! <state_dir>/
//!   known_flaky_tests.json
//!   <run_id>/
//!     request.json  context.json  configure.json  ...  result.json
//! ```

use crate::error::StoreError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Sortable UTC run identifier, e.g. `20260118T101530123456Z`
#[must_use]
pub fn new_run_id() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%S%6fZ").to_string()
}

/// Current commit of the repository, read from `.git` without spawning git.
///
/// Follows a symbolic `HEAD` through loose refs, then `packed-refs`.
#[must_use]
pub fn git_commit(repo_root: &Path) -> Option<String> {
    let git_dir = repo_root.join(".git");
    let head = fs::read_to_string(git_dir.join("HEAD")).ok()?;
    let head = head.trim();

    let Some(reference) = head.strip_prefix("ref:").map(str::trim) else {
        return (!head.is_empty()).then(|| head.to_string());
    };

    if let Ok(commit) = fs::read_to_string(git_dir.join(reference)) {
        let commit = commit.trim();
        if !commit.is_empty() {
            return Some(commit.to_string());
        }
    }

    let packed = fs::read_to_string(git_dir.join("packed-refs")).ok()?;
    packed
        .lines()
        .filter(|line| !line.starts_with('#') && !line.starts_with('^'))
        .find_map(|line| {
            let (commit, name) = line.split_once(' ')?;
            (name.trim() == reference).then(|| commit.to_string())
        })
}

/// Root of all persisted state for one repository
#[derive(Debug, Clone)]
pub struct StateStore {
    state_dir: PathBuf,
}

impl StateStore {
    /// Store rooted at `state_dir`
    #[inline]
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// State directory
    #[inline]
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// Create the directory for `run_id`
    ///
    /// # Errors
    /// Returns `StoreError::Io` if the directory cannot be created.
    pub fn create_run(&self, run_id: &str) -> Result<RunDir, StoreError> {
        let path = self.state_dir.join(run_id);
        fs::create_dir_all(&path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(RunDir {
            id: run_id.to_string(),
            path,
        })
    }
}

/// Artifact directory of one run
#[derive(Debug, Clone)]
pub struct RunDir {
    id: String,
    path: PathBuf,
}

impl RunDir {
    /// Run identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Directory path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `value` as pretty JSON to `<run_dir>/<name>`
    ///
    /// # Errors
    /// Returns `StoreError` on encoding or I/O failure.
    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf, StoreError> {
        let text = serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
            name: name.to_string(),
            source,
        })?;
        self.write_text(name, &text)
    }

    /// Write `text` to `<run_dir>/<name>`
    ///
    /// # Errors
    /// Returns `StoreError::Io` on I/O failure.
    pub fn write_text(&self, name: &str, text: &str) -> Result<PathBuf, StoreError> {
        let path = self.path.join(name);
        fs::write(&path, text).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(run_id = %self.id, artifact = name, "artifact written");
        Ok(path)
    }
}
