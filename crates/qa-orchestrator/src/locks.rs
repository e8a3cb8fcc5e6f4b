//! Per-repository run locks
//!
//! Two runs against the same repository share a build directory and a flaky
//! registry, so they are serialized. Runs on different roots never contend.

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map from canonical repository root to its run lock
#[derive(Debug, Clone, Default)]
pub struct RepoLocks {
    inner: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl RepoLocks {
    /// Empty lock table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of `repo_root`
    pub async fn acquire(&self, repo_root: &Path) -> OwnedMutexGuard<()> {
        let key = repo_root.canonicalize().unwrap_or_else(|_| repo_root.to_path_buf());
        let lock = Arc::clone(self.inner.entry(key).or_default().value());
        lock.lock_owned().await
    }

    /// Number of repositories seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether no repository has been locked yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
