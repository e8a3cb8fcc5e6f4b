//! Build/test triad seam

use async_trait::async_trait;
use qa_core::RunResult;

/// The three external phases a run drives.
///
/// Implementations never fail: every outcome, including spawn failures and
/// timeouts, is a [`RunResult`].
#[async_trait]
pub trait BuildTriad: Send + Sync {
    /// Configure the project (idempotent)
    async fn configure(&self) -> RunResult;

    /// Incremental build
    async fn build(&self) -> RunResult;

    /// Run the test suite, skipping tests named in `exclude`
    async fn test(&self, exclude: &[String]) -> RunResult;
}
