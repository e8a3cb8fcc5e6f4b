//! Test synthesizer
//!
//! Walks the selected findings in rank order, discovers each finding's
//! header, extracts signatures and renders every matching contract template
//! into one gtest file per finding/header pair. Anything it cannot handle
//! becomes an [`EscalationQuestion`] rather than an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use qa_synth::{SynthesisHints, TestSynthesizer};
//!
//! let synth = TestSynthesizer::new(repo_root, repo_root.join("tests/generated"));
//! let out = synth.synthesize(&findings, 3, &SynthesisHints::default())?;
//! for test in &out.generated {
//!     println!("{} <- {}", test.path, test.target_hint);
//! }
//! ```

use crate::contracts::render_contract;
use crate::discovery::{HeaderLocator, DEFAULT_SEARCH_DEPTH};
use crate::error::SynthError;
use crate::naming::{generated_file_name, question_id};
use crate::signature::{HeaderScanner, SignatureExtractor};
use qa_core::{
    posix_relpath, AgentRequest, EscalationKind, EscalationQuestion, GeneratedTest, RiskFinding, DISABLED_SUFFIX,
};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Request metadata overrides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisHints {
    /// Repo-relative header to use for every finding
    pub force_header: Option<String>,
    /// Scope qualifier to use instead of detection
    pub force_namespace: Option<String>,
    /// Only these function names are considered
    pub force_functions: Option<BTreeSet<String>>,
}

impl SynthesisHints {
    /// Overrides carried in a request's metadata
    #[must_use]
    pub fn from_request(request: &AgentRequest) -> Self {
        Self {
            force_header: request.force_header().map(str::to_string),
            force_namespace: request.force_namespace().map(str::to_string),
            force_functions: request.force_functions(),
        }
    }
}

/// Generated tests and open questions from one synthesis pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisOutput {
    /// Tests written (or already present with identical content)
    pub generated: Vec<GeneratedTest>,
    /// Escalations, deduplicated by id
    pub questions: Vec<EscalationQuestion>,
}

impl SynthesisOutput {
    fn ask(&mut self, kind: EscalationKind, path: String, message: &str) {
        let id = question_id(kind, &path);
        if self.questions.iter().any(|q| q.id == id) {
            return;
        }
        tracing::info!(kind = kind.as_str(), path = %path, "escalating to a human");
        self.questions.push(EscalationQuestion {
            id,
            kind,
            path,
            message: message.to_string(),
        });
    }
}

const NO_HEADER_MESSAGE: &str =
    "No public header found for this file. Name the API under test via `force_header` or `force_functions`.";
const PARSE_FAILURE_MESSAGE: &str =
    "No function declarations could be parsed from this header. Name the symbols to test (macros and templates are not understood).";
const NO_PATTERN_MESSAGE: &str =
    "No supported contract pattern matched. Name the 1-3 riskiest functions (or signatures) to target.";

/// Contract-pattern test synthesizer
#[derive(Clone)]
pub struct TestSynthesizer {
    repo_root: PathBuf,
    out_dir: PathBuf,
    extractor: Arc<dyn SignatureExtractor>,
    search_depth: usize,
}

impl std::fmt::Debug for TestSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSynthesizer")
            .field("repo_root", &self.repo_root)
            .field("out_dir", &self.out_dir)
            .field("search_depth", &self.search_depth)
            .finish_non_exhaustive()
    }
}

impl TestSynthesizer {
    /// Synthesizer writing into `out_dir`, using the built-in header scanner
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            out_dir: out_dir.into(),
            extractor: Arc::new(HeaderScanner::new()),
            search_depth: DEFAULT_SEARCH_DEPTH,
        }
    }

    /// Replace the signature extractor
    #[inline]
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn SignatureExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Bound the last-resort header search
    #[inline]
    #[must_use]
    pub fn with_search_depth(mut self, depth: usize) -> Self {
        self.search_depth = depth;
        self
    }

    /// Synthesize tests for `findings` until `max_tests` files are produced.
    ///
    /// # Errors
    /// Returns `SynthError` only when the output directory or a generated
    /// file cannot be written.
    pub fn synthesize(
        &self,
        findings: &[RiskFinding],
        max_tests: usize,
        hints: &SynthesisHints,
    ) -> Result<SynthesisOutput, SynthError> {
        let root = self.repo_root.canonicalize().unwrap_or_else(|_| self.repo_root.clone());
        let locator = HeaderLocator::new(&root).with_max_depth(self.search_depth);
        let mut out = SynthesisOutput::default();
        let mut rendered_headers: HashSet<String> = HashSet::new();

        for finding in findings {
            if out.generated.len() >= max_tests {
                tracing::debug!(max_tests, "test budget reached");
                break;
            }

            let header = match &hints.force_header {
                Some(forced) => Some(root.join(forced)).filter(|p| p.is_file()),
                None => locator.locate(&finding.path),
            };
            let Some(header) = header.and_then(|h| within(&root, &h)) else {
                out.ask(EscalationKind::NoHeader, finding.path.clone(), NO_HEADER_MESSAGE);
                continue;
            };
            let header_rel = posix_relpath(&header, &root);
            if !rendered_headers.insert(header_rel.clone()) {
                tracing::debug!(header = %header_rel, finding = %finding.path, "header already covered in this pass");
                continue;
            }

            let text = match fs::read(&header) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(e) => {
                    tracing::warn!(header = %header.display(), error = %e, "header unreadable");
                    out.ask(EscalationKind::ParseFailure, header_rel, PARSE_FAILURE_MESSAGE);
                    continue;
                }
            };

            let functions = self.extractor.extract(&text);
            if functions.is_empty() {
                out.ask(EscalationKind::ParseFailure, header_rel, PARSE_FAILURE_MESSAGE);
                continue;
            }

            let qualifier = hints
                .force_namespace
                .clone()
                .or_else(|| self.extractor.detect_scope_qualifier(&text))
                .map(|ns| format!("{ns}::"))
                .unwrap_or_default();

            let mut bodies = Vec::new();
            let mut rationale = Vec::new();
            let mut includes = BTreeSet::new();
            for function in &functions {
                if hints.force_functions.as_ref().is_some_and(|allow| !allow.contains(&function.name)) {
                    continue;
                }
                let contract_hints = self.extractor.infer_contract_hints(&function.doc);
                if let Some(rendered) = render_contract(function, &qualifier, &contract_hints) {
                    tracing::debug!(function = %function.name, kind = rendered.kind.as_str(), "contract matched");
                    bodies.push(rendered.body);
                    rationale.push(rendered.rationale);
                    includes.extend(rendered.includes.iter().copied());
                }
            }

            if bodies.is_empty() {
                out.ask(EscalationKind::NoPattern, header_rel, NO_PATTERN_MESSAGE);
                continue;
            }

            let out_path = self.out_dir.join(generated_file_name(&finding.path, &header_rel));
            if is_quarantined(&out_path) {
                tracing::debug!(path = %out_path.display(), "generated test is quarantined, not regenerating");
                continue;
            }

            let content = render_file(&header_rel, &includes, &bodies);
            write_if_changed(&self.out_dir, &out_path, &content)?;

            let base = if out_path.starts_with(&self.repo_root) { &self.repo_root } else { &root };
            out.generated.push(GeneratedTest {
                path: posix_relpath(&out_path, base),
                target_hint: finding.path.clone(),
                rationale: rationale.join("; "),
            });
        }

        tracing::info!(
            generated = out.generated.len(),
            questions = out.questions.len(),
            "synthesis complete"
        );
        Ok(out)
    }
}

/// Canonical `path` when it lies under `root`
fn within(root: &Path, path: &Path) -> Option<PathBuf> {
    let resolved = path.canonicalize().ok()?;
    resolved.starts_with(root).then_some(resolved)
}

fn is_quarantined(path: &Path) -> bool {
    let mut disabled = path.as_os_str().to_os_string();
    disabled.push(DISABLED_SUFFIX);
    Path::new(&disabled).exists()
}

fn render_file(header_rel: &str, includes: &BTreeSet<&str>, bodies: &[String]) -> String {
    let extra: String = includes.iter().map(|inc| format!("#include {inc}\n")).collect();
    format!(
        "#include <gtest/gtest.h>\n{extra}\n#include \"{header_rel}\"\n\n\
         // NOTE: Generated by qa-agent. Focus: contract/edge cases likely to reveal early bugs.\n\n\
         {}\n",
        bodies.join("\n\n")
    )
}

fn write_if_changed(out_dir: &Path, path: &Path, content: &str) -> Result<(), SynthError> {
    if fs::read(path).is_ok_and(|existing| existing == content.as_bytes()) {
        tracing::debug!(path = %path.display(), "generated test unchanged");
        return Ok(());
    }
    fs::create_dir_all(out_dir).map_err(|source| SynthError::CreateDir {
        path: out_dir.to_path_buf(),
        source,
    })?;
    fs::write(path, content).map_err(|source| SynthError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), "generated test written");
    Ok(())
}
