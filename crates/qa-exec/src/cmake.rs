//! CMake/CTest binding of the build triad

use crate::runner::{PhaseCommand, ProcessRunner};
use crate::triad::BuildTriad;
use async_trait::async_trait;
use qa_core::{AgentConfig, Phase, RunResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Exit code reported when the build directory cannot be created
const PREPARE_FAILURE_EXIT_CODE: i32 = 1;

/// CTest exclusion regex matching exactly the given test names.
///
/// Returns `None` for an empty list.
#[must_use]
pub fn exclusion_pattern(names: &[String]) -> Option<String> {
    if names.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();
    Some(format!("^({})$", alternatives.join("|")))
}

/// `cmake` / `ctest` invocations for one repository
#[derive(Debug, Clone)]
pub struct CMakeTriad {
    repo_root: PathBuf,
    build_dir: PathBuf,
    build_config: Option<String>,
    parallel: Option<u32>,
    test_timeout: Option<Duration>,
    phase_timeout: Option<Duration>,
    runner: ProcessRunner,
}

impl CMakeTriad {
    /// Triad for `repo_root` building into `build_dir`
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            build_dir: build_dir.into(),
            build_config: None,
            parallel: None,
            test_timeout: None,
            phase_timeout: None,
            runner: ProcessRunner::new(),
        }
    }

    /// Triad configured from an [`AgentConfig`]
    #[must_use]
    pub fn from_config(repo_root: &Path, config: &AgentConfig) -> Self {
        Self::new(repo_root, config.build_dir_in(repo_root))
            .with_build_config(config.build_config.clone())
            .with_parallel(config.parallel)
            .with_test_timeout(config.test_timeout())
            .with_phase_timeout(config.phase_timeout())
    }

    /// Multi-config build type (`--config` / `-C`)
    #[inline]
    #[must_use]
    pub fn with_build_config(mut self, config: Option<String>) -> Self {
        self.build_config = config;
        self
    }

    /// Build parallelism
    #[inline]
    #[must_use]
    pub fn with_parallel(mut self, parallel: Option<u32>) -> Self {
        self.parallel = parallel;
        self
    }

    /// Per-test timeout; the test phase gets twice this as wall clock
    #[inline]
    #[must_use]
    pub fn with_test_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.test_timeout = timeout;
        self
    }

    /// Wall-clock limit for configure and build
    #[inline]
    #[must_use]
    pub fn with_phase_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.phase_timeout = timeout;
        self
    }

    /// Build directory
    #[inline]
    #[must_use]
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// `cmake -S <repo> -B <build> ...`
    #[must_use]
    pub fn configure_command(&self) -> PhaseCommand {
        PhaseCommand::new(Phase::Configure, "cmake", &self.repo_root)
            .arg("-S")
            .arg(path_arg(&self.repo_root))
            .arg("-B")
            .arg(path_arg(&self.build_dir))
            .args(["-DCMAKE_EXPORT_COMPILE_COMMANDS=ON", "-DENABLE_TESTS=ON"])
            .with_timeout(self.phase_timeout)
    }

    /// `cmake --build <build> [--config C] [--parallel N]`
    #[must_use]
    pub fn build_command(&self) -> PhaseCommand {
        let mut cmd = PhaseCommand::new(Phase::Build, "cmake", &self.repo_root)
            .arg("--build")
            .arg(path_arg(&self.build_dir));
        if let Some(config) = &self.build_config {
            cmd = cmd.arg("--config").arg(config);
        }
        if let Some(n) = self.parallel {
            cmd = cmd.arg("--parallel").arg(n.to_string());
        }
        cmd.with_timeout(self.phase_timeout)
    }

    /// `ctest --test-dir <build> --output-on-failure [-C C] [--timeout T] [-E re]`
    #[must_use]
    pub fn test_command(&self, exclude: &[String]) -> PhaseCommand {
        let mut cmd = PhaseCommand::new(Phase::Test, "ctest", &self.repo_root)
            .arg("--test-dir")
            .arg(path_arg(&self.build_dir))
            .arg("--output-on-failure");
        if let Some(config) = &self.build_config {
            cmd = cmd.arg("-C").arg(config);
        }
        if let Some(timeout) = self.test_timeout {
            cmd = cmd.arg("--timeout").arg(timeout.as_secs().to_string());
        }
        if let Some(pattern) = exclusion_pattern(exclude) {
            cmd = cmd.arg("-E").arg(pattern);
        }
        cmd.with_timeout(self.test_timeout.map(|t| t * 2))
    }
}

#[async_trait]
impl BuildTriad for CMakeTriad {
    async fn configure(&self) -> RunResult {
        if let Err(e) = tokio::fs::create_dir_all(&self.build_dir).await {
            tracing::warn!(build_dir = %self.build_dir.display(), error = %e, "cannot create build directory");
            return RunResult::from_exit(
                Phase::Configure,
                PREPARE_FAILURE_EXIT_CODE,
                "",
                format!("cannot create build directory {}: {e}", self.build_dir.display()),
            );
        }
        self.runner.run(&self.configure_command()).await
    }

    async fn build(&self) -> RunResult {
        self.runner.run(&self.build_command()).await
    }

    async fn test(&self, exclude: &[String]) -> RunResult {
        self.runner.run(&self.test_command(exclude)).await
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
