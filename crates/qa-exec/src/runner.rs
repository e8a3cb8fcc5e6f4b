//! Subprocess runner
//!
//! Runs a program with captured stdio and an optional wall-clock timeout.
//! The child is killed when the timeout elapses.

use qa_core::{Phase, RunResult};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Exit code reported when the program could not be started
pub const SPAWN_FAILURE_EXIT_CODE: i32 = 127;

/// Exit code reported when the process was terminated by a signal
pub const SIGNAL_EXIT_CODE: i32 = -1;

/// A program invocation for one phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCommand {
    /// Phase this invocation implements
    pub phase: Phase,
    /// Program to execute
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
    /// Wall-clock limit
    pub timeout: Option<Duration>,
}

impl PhaseCommand {
    /// Invocation of `program` in `cwd` with no arguments or timeout
    #[must_use]
    pub fn new(phase: Phase, program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            phase,
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            timeout: None,
        }
    }

    /// Append one argument
    #[inline]
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the wall-clock limit
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments as one display string
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Executes [`PhaseCommand`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Create a runner
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run `command` to completion or timeout
    pub async fn run(&self, command: &PhaseCommand) -> RunResult {
        let phase = command.phase;
        let started = Instant::now();
        tracing::debug!(%phase, command = %command.display(), cwd = %command.cwd.display(), "spawning");

        let child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!(%phase, program = %command.program, error = %e, "spawn failed");
                return RunResult::from_exit(
                    phase,
                    SPAWN_FAILURE_EXIT_CODE,
                    "",
                    format!("failed to start `{}`: {e}", command.program),
                );
            }
        };

        let output = match command.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(output) => output,
                Err(_) => {
                    // Dropping the future drops the child, which kills it
                    tracing::warn!(%phase, timeout_secs = limit.as_secs(), "phase timed out");
                    return RunResult::timed_out(phase, "");
                }
            },
            None => child.wait_with_output().await,
        };

        let result = match output {
            Ok(output) => RunResult::from_exit(
                phase,
                output.status.code().unwrap_or(SIGNAL_EXIT_CODE),
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr),
            ),
            Err(e) => RunResult::from_exit(phase, SIGNAL_EXIT_CODE, "", format!("failed to collect output: {e}")),
        };

        tracing::debug!(
            %phase,
            exit_code = result.exit_code,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "phase finished"
        );
        result
    }
}
