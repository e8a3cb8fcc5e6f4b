//! The configure → build → test → analyze → generate → build → test loop

use crate::error::AgentError;
use crate::flaky::FlakyRegistry;
use crate::locks::RepoLocks;
use crate::result::{render_questions_markdown, AbortPhase, AgentRunResult};
use crate::store::{git_commit, new_run_id, RunDir, StateStore};
use qa_core::{AgentConfig, AgentRequest, RunResult, TriageCategory, TriageOutcome};
use qa_exec::BuildTriad;
use qa_scan::{discover_compile_commands, RiskScanner};
use qa_synth::{HeaderScanner, SignatureExtractor, SynthesisHints, SynthesisOutput, TestSynthesizer};
use qa_triage::{extract_failed_tests, triage, RunEvidence};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const NOTE_CONFIGURE_FAILED: &str = "configure failed";
const NOTE_BASELINE_BUILD_FAILED: &str = "baseline build failed";

/// Drives one repository through a full agent run.
///
/// Runs against the same repository root are serialized through
/// [`RepoLocks`]; share one `RepoLocks` between orchestrators that may
/// target the same root.
pub struct RunOrchestrator {
    repo_root: PathBuf,
    config: AgentConfig,
    triad: Arc<dyn BuildTriad>,
    extractor: Arc<dyn SignatureExtractor>,
    scanner: RiskScanner,
    locks: RepoLocks,
}

impl std::fmt::Debug for RunOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunOrchestrator")
            .field("repo_root", &self.repo_root)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RunOrchestrator {
    /// Orchestrator for `repo_root` driving `triad`
    ///
    /// # Errors
    /// Returns `AgentError::RepoRoot` if the root cannot be canonicalized.
    pub fn new(
        repo_root: impl AsRef<Path>,
        config: AgentConfig,
        triad: Arc<dyn BuildTriad>,
    ) -> Result<Self, AgentError> {
        let given = repo_root.as_ref();
        let repo_root = given.canonicalize().map_err(|source| AgentError::RepoRoot {
            path: given.to_path_buf(),
            source,
        })?;
        Ok(Self {
            repo_root,
            config,
            triad,
            extractor: Arc::new(HeaderScanner::new()),
            scanner: RiskScanner::new(),
            locks: RepoLocks::new(),
        })
    }

    /// Replace the signature extractor used during synthesis
    #[inline]
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn SignatureExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Share a lock table with other orchestrators
    #[inline]
    #[must_use]
    pub fn with_locks(mut self, locks: RepoLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Canonical repository root
    #[inline]
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Effective configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// State directory for this repository
    #[must_use]
    pub fn state_dir(&self) -> PathBuf {
        self.config.state_dir_in(&self.repo_root)
    }

    /// Execute one run for `request`.
    ///
    /// Phase failures are reported inside the returned result; only bad
    /// input and persistence failures surface as errors. When a run fails
    /// after its directory exists, `error.json` is written there.
    ///
    /// # Errors
    /// Returns `AgentError` on a malformed compile database, an unwritable
    /// state directory, or an unwritable generated test.
    pub async fn run(&self, request: &AgentRequest) -> Result<AgentRunResult, AgentError> {
        let _guard = self.locks.acquire(&self.repo_root).await;

        let store = StateStore::new(self.state_dir());
        let run_dir = store.create_run(&new_run_id())?;
        tracing::info!(run_id = run_dir.id(), repo = %self.repo_root.display(), target = %request.target, "run started");

        match self.execute(request, &run_dir, store.state_dir()).await {
            Ok(result) => {
                tracing::info!(
                    run_id = run_dir.id(),
                    ok = result.ok,
                    category = result.triage.category.as_str(),
                    "run finished"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::error!(run_id = run_dir.id(), error = %e, "run failed");
                let record = json!({
                    "error": e.to_string(),
                    "configuration_error": e.is_configuration_error(),
                });
                if let Err(write_err) = run_dir.write_json("error.json", &record) {
                    tracing::warn!(error = %write_err, "could not record run error");
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        request: &AgentRequest,
        run: &RunDir,
        state_dir: &Path,
    ) -> Result<AgentRunResult, AgentError> {
        run.write_json("request.json", request)?;
        run.write_json(
            "context.json",
            &json!({
                "git_commit": git_commit(&self.repo_root),
                "started_at": chrono::Utc::now().to_rfc3339(),
                "repo_root": self.repo_root.to_string_lossy().replace('\\', "/"),
            }),
        )?;

        tracing::info!(run_id = run.id(), "configure");
        let configure = self.triad.configure().await;
        run.write_json("configure.json", &configure)?;
        if !configure.ok {
            let outcome = TriageOutcome::with_note(TriageCategory::ConfigureFailure, NOTE_CONFIGURE_FAILED);
            return abort(run, AbortPhase::Configure, outcome);
        }

        tracing::info!(run_id = run.id(), "baseline build");
        let baseline_build = self.triad.build().await;
        run.write_json("baseline_build.json", &baseline_build)?;
        if !baseline_build.ok {
            let outcome =
                TriageOutcome::with_note(TriageCategory::BaselineBuildFailure, NOTE_BASELINE_BUILD_FAILED);
            return abort(run, AbortPhase::BuildBaseline, outcome);
        }

        let mut flaky = FlakyRegistry::load(state_dir);
        let exclude = flaky.names();
        tracing::info!(run_id = run.id(), excluded = exclude.len(), "baseline test");
        let baseline_test = self.triad.test(&exclude).await;
        run.write_json("baseline_test.json", &baseline_test)?;
        if !baseline_test.ok {
            let outcome = triage(
                &self.repo_root,
                &RunEvidence {
                    baseline_test: Some(&baseline_test),
                    build_after: &baseline_build,
                    test_after: None,
                    generated: &[],
                },
            );
            return abort(run, AbortPhase::TestBaseline, outcome);
        }

        let build_dir = self.config.build_dir_in(&self.repo_root);
        let compile_db = discover_compile_commands(&self.repo_root, &build_dir);
        tracing::info!(run_id = run.id(), compile_db = ?compile_db, "risk analysis");
        let report = {
            let scanner = self.scanner.clone();
            let repo_root = self.repo_root.clone();
            let target = request.target.clone();
            tokio::task::spawn_blocking(move || scanner.analyze(&repo_root, compile_db.as_deref(), &target)).await??
        };
        run.write_json("analyze_report.json", &report)?;

        let selected = report.top(request.constraints.max_tests_to_generate).to_vec();
        run.write_json("selected_findings.json", &json!({ "selected": selected }))?;

        let synthesis = if request.goal.generates_tests() {
            tracing::info!(run_id = run.id(), findings = selected.len(), "synthesizing tests");
            let synthesizer = TestSynthesizer::new(
                &self.repo_root,
                self.config.generated_dir_in(&self.repo_root),
            )
            .with_extractor(Arc::clone(&self.extractor))
            .with_search_depth(self.config.header_search_depth);
            let findings = selected.clone();
            let max_tests = request.constraints.max_tests_to_generate;
            let hints = SynthesisHints::from_request(request);
            let output =
                tokio::task::spawn_blocking(move || synthesizer.synthesize(&findings, max_tests, &hints)).await??;
            run.write_json("generated_tests.json", &json!({ "generated": output.generated }))?;
            run.write_json("human_questions.json", &json!({ "questions": output.questions }))?;
            run.write_text("human_questions.md", &render_questions_markdown(&output.questions))?;
            output
        } else {
            tracing::info!(run_id = run.id(), goal = request.goal.as_str(), "report only, skipping synthesis");
            SynthesisOutput::default()
        };

        tracing::info!(run_id = run.id(), generated = synthesis.generated.len(), "rebuild");
        let build_after = self.triad.build().await;
        run.write_json("after_build.json", &build_after)?;

        let test_after = if build_after.ok {
            Some(self.test_with_retry(run, &mut flaky, &exclude).await?)
        } else {
            None
        };

        let outcome = triage(
            &self.repo_root,
            &RunEvidence {
                baseline_test: Some(&baseline_test),
                build_after: &build_after,
                test_after: test_after.as_ref(),
                generated: &synthesis.generated,
            },
        );
        run.write_json("triage.json", &outcome)?;

        let need_human = !synthesis.questions.is_empty() && synthesis.generated.is_empty();
        let result = AgentRunResult {
            run_id: run.id().to_string(),
            ok: outcome.is_success(),
            aborted_phase: None,
            triage: outcome,
            selected_findings: selected,
            generated: synthesis.generated,
            questions: synthesis.questions,
            need_human,
        };
        run.write_json("result.json", &result)?;
        Ok(result)
    }

    /// Post-generation test phase with the one-shot flaky retry.
    ///
    /// A passing retry supersedes the first attempt only when the first
    /// attempt named its failing tests; those names become known flaky.
    async fn test_with_retry(
        &self,
        run: &RunDir,
        flaky: &mut FlakyRegistry,
        exclude: &[String],
    ) -> Result<RunResult, AgentError> {
        tracing::info!(run_id = run.id(), "test after generation");
        let first = self.triad.test(exclude).await;
        run.write_json("after_test.json", &first)?;
        if first.ok {
            return Ok(first);
        }

        let failed = extract_failed_tests(&first.combined_output());
        tracing::info!(run_id = run.id(), failed = failed.len(), "retrying failed test run once");
        let rerun = self.triad.test(exclude).await;
        run.write_json("after_test_rerun.json", &rerun)?;

        if !rerun.ok || failed.is_empty() {
            return Ok(first);
        }

        run.write_json("flaky_detected.json", &json!({ "flaky": failed }))?;
        let added = flaky.merge(failed.iter().cloned());
        flaky.persist()?;
        tracing::warn!(run_id = run.id(), tests = ?failed, added, "flaky tests detected");
        Ok(rerun)
    }
}

/// Record a pre-generation abort
fn abort(run: &RunDir, phase: AbortPhase, outcome: TriageOutcome) -> Result<AgentRunResult, AgentError> {
    tracing::warn!(run_id = run.id(), phase = phase.as_str(), "run aborted");
    run.write_json("triage.json", &outcome)?;
    let result = AgentRunResult::aborted(run.id(), phase, outcome);
    run.write_json("result.json", &result)?;
    Ok(result)
}
