//! Per-invocation settings shared by the CLI and the HTTP surface

use qa_core::{AgentConfig, AgentRequest, RequestError};
use qa_exec::CMakeTriad;
use qa_orchestrator::{AgentError, RepoLocks, RunOrchestrator};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key that turns an inline request into a reference to a request file
pub const REQUEST_PATH_KEY: &str = "_path";

/// Repository and build overrides for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunSettings {
    /// Repository root
    pub repo: PathBuf,
    /// Build directory override
    #[serde(default)]
    pub build_dir: Option<PathBuf>,
    /// Multi-config build type override
    #[serde(default)]
    pub config: Option<String>,
    /// Build parallelism override
    #[serde(default)]
    pub parallel: Option<u32>,
    /// Per-test timeout override
    #[serde(default)]
    pub ctest_timeout_sec: Option<u64>,
}

impl RunSettings {
    /// Settings for `repo` with no overrides
    #[must_use]
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            repo: repo.into(),
            ..Self::default()
        }
    }

    /// Canonical repository root
    ///
    /// # Errors
    /// Returns `AgentError::RepoRoot` if the root does not resolve.
    pub fn repo_root(&self) -> Result<PathBuf, AgentError> {
        self.repo.canonicalize().map_err(|source| AgentError::RepoRoot {
            path: self.repo.clone(),
            source,
        })
    }

    /// `qa-agent.toml` from `repo_root` with these overrides applied
    ///
    /// # Errors
    /// Returns `RequestError` if the config file is malformed.
    pub fn agent_config(&self, repo_root: &Path) -> Result<AgentConfig, RequestError> {
        let mut config = AgentConfig::load(repo_root)?;
        if let Some(dir) = &self.build_dir {
            config = config.with_build_dir(dir.clone());
        }
        if self.config.is_some() {
            config = config.with_build_config(self.config.clone());
        }
        if self.parallel.is_some() {
            config = config.with_parallel(self.parallel);
        }
        if let Some(secs) = self.ctest_timeout_sec {
            config = config.with_test_timeout_secs(secs);
        }
        Ok(config)
    }

    /// Orchestrator driving CMake/CTest for this repository
    ///
    /// # Errors
    /// Returns `AgentError` if the root does not resolve or the config file
    /// is malformed.
    pub fn orchestrator(&self, locks: RepoLocks) -> Result<RunOrchestrator, AgentError> {
        let root = self.repo_root()?;
        let config = self.agent_config(&root)?;
        let triad = Arc::new(CMakeTriad::from_config(&root, &config));
        Ok(RunOrchestrator::new(&root, config, triad)?.with_locks(locks))
    }
}

/// Resolve a request given inline or as `{"_path": "<file>"}`
///
/// # Errors
/// Returns `RequestError` if the file cannot be read or the request is
/// malformed.
pub fn resolve_request(value: &Value) -> Result<AgentRequest, RequestError> {
    match value.get(REQUEST_PATH_KEY) {
        Some(Value::String(path)) => AgentRequest::load(Path::new(path)),
        Some(_) => Err(RequestError::invalid(REQUEST_PATH_KEY, "must be a string")),
        None => AgentRequest::from_value(value),
    }
}
