//! Header discovery for findings

use qa_core::HEADER_EXTENSIONS;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Default bound for the repository-wide header search
pub const DEFAULT_SEARCH_DEPTH: usize = 12;

/// Extensions tried by the repository-wide search, in preference order
const SEARCH_EXTENSIONS: &[&str] = &["h", "hpp"];

/// Maps a finding path to the header that declares its API
#[derive(Debug, Clone)]
pub struct HeaderLocator {
    repo_root: PathBuf,
    max_depth: usize,
}

impl HeaderLocator {
    /// Locator rooted at `repo_root`
    #[inline]
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            max_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    /// Bound the repository-wide search depth
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Header for `finding_path` (repo-relative).
    ///
    /// Tries the finding itself, then a same-stem sibling, then the first
    /// `<stem>.h` / `<stem>.hpp` anywhere under the root in walk order.
    #[must_use]
    pub fn locate(&self, finding_path: &str) -> Option<PathBuf> {
        let path = self.repo_root.join(finding_path);
        if is_header(&path) && path.is_file() {
            return Some(path);
        }

        for ext in HEADER_EXTENSIONS {
            let sibling = path.with_extension(ext);
            if sibling.is_file() {
                return Some(sibling);
            }
        }

        let stem = path.file_stem()?.to_string_lossy().into_owned();
        self.search(&stem)
    }

    fn search(&self, stem: &str) -> Option<PathBuf> {
        let wanted: Vec<String> = SEARCH_EXTENSIONS.iter().map(|ext| format!("{stem}.{ext}")).collect();
        let mut best: Option<(usize, PathBuf)> = None;

        let entries = WalkDir::new(&self.repo_root)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file());

        for entry in entries {
            let name = entry.file_name().to_string_lossy();
            let Some(rank) = wanted.iter().position(|w| *w == name) else {
                continue;
            };
            if best.as_ref().map_or(true, |(r, _)| rank < *r) {
                best = Some((rank, entry.into_path()));
                if rank == 0 {
                    break;
                }
            }
        }

        if let Some((_, found)) = &best {
            tracing::debug!(stem, header = %found.display(), "header found by repository search");
        }
        best.map(|(_, path)| path)
    }
}

/// Whether `path` has a header extension
#[must_use]
pub fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| HEADER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "").unwrap();
        path
    }

    #[test]
    fn header_finding_is_its_own_header() {
        let dir = tempfile::tempdir().unwrap();
        let h = touch(dir.path(), "src/api.hpp");
        assert_eq!(HeaderLocator::new(dir.path()).locate("src/api.hpp"), Some(h));
    }

    #[test]
    fn sibling_prefers_extension_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/io.cpp");
        touch(dir.path(), "src/io.hh");
        let h = touch(dir.path(), "src/io.h");
        assert_eq!(HeaderLocator::new(dir.path()).locate("src/io.cpp"), Some(h));
    }

    #[test]
    fn search_prefers_dot_h_then_walk_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/io.cpp");
        touch(dir.path(), "a/io.hpp");
        let h = touch(dir.path(), "include/io.h");
        touch(dir.path(), "z/io.h");
        assert_eq!(HeaderLocator::new(dir.path()).locate("src/io.cpp"), Some(h));
    }

    #[test]
    fn search_skips_hidden_and_respects_depth() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/io.cpp");
        touch(dir.path(), ".git/io.h");
        touch(dir.path(), "a/b/c/io.h");

        let locator = HeaderLocator::new(dir.path());
        assert!(locator.locate("src/io.cpp").is_some());
        assert_eq!(locator.clone().with_max_depth(2).locate("src/io.cpp"), None);
    }

    #[test]
    fn nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "src/io.cpp");
        assert_eq!(HeaderLocator::new(dir.path()).locate("src/io.cpp"), None);
    }
}
