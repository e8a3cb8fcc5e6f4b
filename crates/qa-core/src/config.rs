//! Agent configuration
//!
//! Repository-level settings for where things live and how long phases may
//! run. Loaded from an optional `qa-agent.toml` at the repository root;
//! command-line flags override file values.

use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the optional per-repository config file
pub const CONFIG_FILE_NAME: &str = "qa-agent.toml";

/// Agent configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Build directory, relative to the repository root unless absolute
    pub build_dir: PathBuf,
    /// State directory for run artifacts, relative unless absolute
    pub state_dir: PathBuf,
    /// Directory receiving generated tests, relative to the repository root
    pub generated_dir: PathBuf,
    /// Multi-config build type (e.g. `Debug`)
    pub build_config: Option<String>,
    /// Build parallelism
    pub parallel: Option<u32>,
    /// Per-test timeout handed to the test runner
    pub test_timeout_secs: u64,
    /// Wall-clock timeout for configure and build
    pub phase_timeout_secs: Option<u64>,
    /// Depth bound for the last-resort header search
    pub header_search_depth: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from("build"),
            state_dir: PathBuf::from(".qa-agent/state"),
            generated_dir: PathBuf::from("tests/generated"),
            build_config: None,
            parallel: None,
            test_timeout_secs: 60,
            phase_timeout_secs: None,
            header_search_depth: 12,
        }
    }
}

impl AgentConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `qa-agent.toml` from `repo_root`, or defaults if absent
    ///
    /// # Errors
    /// Returns `RequestError` if the file exists but cannot be read or parsed.
    pub fn load(repo_root: &Path) -> Result<Self, RequestError> {
        let path = repo_root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path).map_err(|source| RequestError::Io {
            path: path.clone(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| RequestError::ConfigFile { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "loaded agent config");
        Ok(config)
    }

    /// With build directory
    #[inline]
    #[must_use]
    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    /// With state directory
    #[inline]
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// With generated-tests directory
    #[inline]
    #[must_use]
    pub fn with_generated_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.generated_dir = dir.into();
        self
    }

    /// With multi-config build type
    #[inline]
    #[must_use]
    pub fn with_build_config(mut self, config: Option<String>) -> Self {
        self.build_config = config;
        self
    }

    /// With build parallelism
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: Option<u32>) -> Self {
        self.parallel = parallel;
        self
    }

    /// With per-test timeout
    #[inline]
    #[must_use]
    pub fn with_test_timeout_secs(mut self, secs: u64) -> Self {
        self.test_timeout_secs = secs;
        self
    }

    /// Build directory resolved against `repo_root`
    #[must_use]
    pub fn build_dir_in(&self, repo_root: &Path) -> PathBuf {
        resolve(repo_root, &self.build_dir)
    }

    /// State directory resolved against `repo_root`
    #[must_use]
    pub fn state_dir_in(&self, repo_root: &Path) -> PathBuf {
        resolve(repo_root, &self.state_dir)
    }

    /// Generated-tests directory resolved against `repo_root`
    #[must_use]
    pub fn generated_dir_in(&self, repo_root: &Path) -> PathBuf {
        resolve(repo_root, &self.generated_dir)
    }

    /// Wall-clock timeout for configure/build
    #[must_use]
    pub fn phase_timeout(&self) -> Option<Duration> {
        self.phase_timeout_secs.map(Duration::from_secs)
    }

    /// Per-test timeout (zero disables it)
    #[must_use]
    pub fn test_timeout(&self) -> Option<Duration> {
        (self.test_timeout_secs > 0).then(|| Duration::from_secs(self.test_timeout_secs))
    }
}

fn resolve(root: &Path, dir: &Path) -> PathBuf {
    if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        root.join(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgentConfig::load(dir.path()).unwrap();
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.build_dir_in(dir.path()), dir.path().join("build"));
    }

    #[test]
    fn partial_file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "build_dir = \"out\"\ntest_timeout_secs = 5\nparallel = 4\n",
        )
        .unwrap();
        let config = AgentConfig::load(dir.path()).unwrap();
        assert_eq!(config.build_dir, PathBuf::from("out"));
        assert_eq!(config.test_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.parallel, Some(4));
        assert_eq!(config.generated_dir, PathBuf::from("tests/generated"));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "build_dir = [").unwrap();
        assert!(matches!(
            AgentConfig::load(dir.path()),
            Err(RequestError::ConfigFile { .. })
        ));
    }

    #[test]
    fn absolute_dirs_are_kept() {
        let config = AgentConfig::new().with_state_dir("/var/qa");
        assert_eq!(config.state_dir_in(Path::new("/repo")), PathBuf::from("/var/qa"));
    }
}
