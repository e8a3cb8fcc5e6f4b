//! Known-flaky test registry
//!
//! A sorted, deduplicated list of test names observed to fail and then pass
//! on immediate retry. Scoped to one repository's state directory; loaded at
//! run start and rewritten when a run detects new flaky tests.

use crate::error::StoreError;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the registry inside the state directory
pub const KNOWN_FLAKY_FILE: &str = "known_flaky_tests.json";

/// Persisted set of flaky test names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlakyRegistry {
    path: PathBuf,
    names: BTreeSet<String>,
}

impl FlakyRegistry {
    /// Load the registry from `state_dir`.
    ///
    /// A missing file is an empty registry; a malformed one is logged and
    /// treated as empty.
    #[must_use]
    pub fn load(state_dir: &Path) -> Self {
        let path = state_dir.join(KNOWN_FLAKY_FILE);
        let names = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Vec<String>>(&text) {
                Ok(names) => names.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "malformed flaky registry, starting empty");
                    BTreeSet::new()
                }
            },
            Err(_) => BTreeSet::new(),
        };
        Self { path, names }
    }

    /// Names in sorted order
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    /// Whether `name` is known flaky
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of known names
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Add `names`, returning how many were new
    pub fn merge<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.names.len();
        self.names.extend(names.into_iter().map(Into::into));
        self.names.len() - before
    }

    /// Rewrite the registry file
    ///
    /// # Errors
    /// Returns `StoreError` if the state directory or file cannot be written.
    pub fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let text = serde_json::to_string_pretty(&self.names).map_err(|source| StoreError::Encode {
            name: KNOWN_FLAKY_FILE.to_string(),
            source,
        })?;
        fs::write(&self.path, text).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(count = self.names.len(), "flaky registry persisted");
        Ok(())
    }
}
