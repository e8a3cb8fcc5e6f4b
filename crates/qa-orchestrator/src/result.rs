//! Consolidated run result

use qa_core::{EscalationQuestion, GeneratedTest, RiskFinding, TriageOutcome};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pre-generation phase at which a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortPhase {
    /// Configure failed
    Configure,
    /// Baseline build failed
    BuildBaseline,
    /// Baseline tests failed
    TestBaseline,
}

impl AbortPhase {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configure => "configure",
            Self::BuildBaseline => "build_baseline",
            Self::TestBaseline => "test_baseline",
        }
    }
}

impl fmt::Display for AbortPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller gets back from one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRunResult {
    /// Run identifier (also the artifact directory name)
    pub run_id: String,
    /// Whether the run succeeded
    pub ok: bool,
    /// Set when the run stopped before analysis
    pub aborted_phase: Option<AbortPhase>,
    /// Terminal classification; present on every path
    pub triage: TriageOutcome,
    /// Findings selected for generation
    pub selected_findings: Vec<RiskFinding>,
    /// Tests produced
    pub generated: Vec<GeneratedTest>,
    /// Escalations raised during synthesis
    pub questions: Vec<EscalationQuestion>,
    /// Questions exist and nothing was generated to compensate
    pub need_human: bool,
}

impl AgentRunResult {
    /// Result of a run that stopped at `phase`
    #[must_use]
    pub fn aborted(run_id: impl Into<String>, phase: AbortPhase, triage: TriageOutcome) -> Self {
        Self {
            run_id: run_id.into(),
            ok: false,
            aborted_phase: Some(phase),
            triage,
            selected_findings: Vec::new(),
            generated: Vec::new(),
            questions: Vec::new(),
            need_human: false,
        }
    }
}

/// Markdown rendering of escalation questions for out-of-band review
#[must_use]
pub fn render_questions_markdown(questions: &[EscalationQuestion]) -> String {
    let mut out = String::from("# Human questions\n\n");
    for q in questions {
        out.push_str(&format!("- ({}) [{}] `{}`: {}\n", q.id, q.kind.as_str(), q.path, q.message));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::{EscalationKind, TriageCategory};

    #[test]
    fn aborted_result_is_not_ok() {
        let triage = TriageOutcome::with_note(TriageCategory::ConfigureFailure, "configure failed");
        let result = AgentRunResult::aborted("r", AbortPhase::Configure, triage);
        assert!(!result.ok);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["aborted_phase"], "configure");
        assert_eq!(json["triage"]["category"], "configure_failure");
    }

    #[test]
    fn questions_markdown() {
        let questions = vec![EscalationQuestion {
            id: "Q_0123456789".into(),
            kind: EscalationKind::NoHeader,
            path: "src/a.cpp".into(),
            message: "Name the API".into(),
        }];
        let md = render_questions_markdown(&questions);
        assert!(md.starts_with("# Human questions\n\n"));
        assert!(md.contains("- (Q_0123456789) [no_header] `src/a.cpp`: Name the API\n"));
    }
}
