//! Agent requests
//!
//! A request is immutable once constructed and drives exactly one run.
//! Requests arrive as JSON documents (inline over the command surface or
//! from a file) and are parsed leniently: missing fields take defaults,
//! while fields of the wrong type are configuration errors.

use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// What the run is trying to achieve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Reproduce a crash
    CrashRepro,
    /// Probe edge cases
    #[default]
    EdgeCases,
    /// Pin down API contracts
    ApiContract,
    /// Guard against regressions
    Regression,
    /// Analyze only, never generate
    ReportOnly,
}

impl Goal {
    /// All goals, in declaration order
    pub const ALL: [Goal; 5] = [
        Goal::CrashRepro,
        Goal::EdgeCases,
        Goal::ApiContract,
        Goal::Regression,
        Goal::ReportOnly,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Goal::CrashRepro => "crash_repro",
            Goal::EdgeCases => "edge_cases",
            Goal::ApiContract => "api_contract",
            Goal::Regression => "regression",
            Goal::ReportOnly => "report_only",
        }
    }

    /// Whether this goal allows test generation
    #[inline]
    #[must_use]
    pub fn generates_tests(self) -> bool {
        self != Goal::ReportOnly
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Goal {
    type Err = RequestError;

    /// Accepts both `edge_cases` and `edge-cases` spellings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_");
        Goal::ALL
            .into_iter()
            .find(|g| g.as_str() == normalized)
            .ok_or_else(|| RequestError::UnknownGoal(s.to_string()))
    }
}

/// Per-run limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConstraints {
    /// Advisory wall-clock budget for the whole run
    pub time_budget_sec: u64,
    /// Maximum number of generated test files
    pub max_tests_to_generate: usize,
    /// Whether source edits are permitted (generation never edits sources)
    pub allow_source_edits: bool,
}

impl Default for AgentConstraints {
    fn default() -> Self {
        Self {
            time_budget_sec: 300,
            max_tests_to_generate: 3,
            allow_source_edits: false,
        }
    }
}

/// One unit of requested work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    /// Directory scope, relative to the repository root
    pub target: String,
    /// Requested goal
    pub goal: Goal,
    /// Limits
    pub constraints: AgentConstraints,
    /// Free-form hints (`force_header`, `force_namespace`, `force_functions`)
    pub metadata: BTreeMap<String, Value>,
}

impl Default for AgentRequest {
    fn default() -> Self {
        Self {
            target: ".".to_string(),
            goal: Goal::default(),
            constraints: AgentConstraints::default(),
            metadata: BTreeMap::new(),
        }
    }
}

impl AgentRequest {
    /// Request scoped to `target` with default goal and constraints
    #[inline]
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// With goal
    #[inline]
    #[must_use]
    pub fn with_goal(mut self, goal: Goal) -> Self {
        self.goal = goal;
        self
    }

    /// With constraints
    #[inline]
    #[must_use]
    pub fn with_constraints(mut self, constraints: AgentConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// With test generation budget
    #[inline]
    #[must_use]
    pub fn with_budget(mut self, max_tests: usize) -> Self {
        self.constraints.max_tests_to_generate = max_tests;
        self
    }

    /// With a metadata hint
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Forced header path, if hinted as a string
    #[must_use]
    pub fn force_header(&self) -> Option<&str> {
        self.metadata.get("force_header").and_then(Value::as_str)
    }

    /// Forced scope qualifier, if hinted as a string
    #[must_use]
    pub fn force_namespace(&self) -> Option<&str> {
        self.metadata.get("force_namespace").and_then(Value::as_str)
    }

    /// Function-name allow-list, only when hinted as an array of strings
    #[must_use]
    pub fn force_functions(&self) -> Option<BTreeSet<String>> {
        let items = self.metadata.get("force_functions")?.as_array()?;
        items
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Parse a request from a JSON value
    ///
    /// # Errors
    /// Returns `RequestError` if the document is not an object, the goal is
    /// unknown, or a present field has the wrong type.
    pub fn from_value(value: &Value) -> Result<Self, RequestError> {
        let obj = value.as_object().ok_or(RequestError::NotAnObject)?;

        let target = match obj.get("target") {
            None | Some(Value::Null) => ".".to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => return Err(RequestError::invalid("target", format!("expected string, got {other}"))),
        };

        let goal = match obj.get("goal") {
            None | Some(Value::Null) => Goal::default(),
            Some(Value::String(s)) => s.parse()?,
            Some(other) => return Err(RequestError::invalid("goal", format!("expected string, got {other}"))),
        };

        let empty = Map::new();
        let constraints_obj = obj
            .get("constraints")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let defaults = AgentConstraints::default();
        let constraints = AgentConstraints {
            time_budget_sec: read_uint(constraints_obj, "time_budget_sec")?
                .unwrap_or(defaults.time_budget_sec),
            max_tests_to_generate: read_uint(constraints_obj, "max_tests_to_generate")?
                .map_or(Ok(defaults.max_tests_to_generate), usize::try_from)
                .map_err(|e| RequestError::invalid("max_tests_to_generate", e.to_string()))?,
            allow_source_edits: match constraints_obj.get("allow_source_edits") {
                None | Some(Value::Null) => defaults.allow_source_edits,
                Some(Value::Bool(b)) => *b,
                Some(other) => {
                    return Err(RequestError::invalid(
                        "allow_source_edits",
                        format!("expected boolean, got {other}"),
                    ))
                }
            },
        };

        let metadata = obj
            .get("metadata")
            .and_then(Value::as_object)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Ok(Self {
            target,
            goal,
            constraints,
            metadata,
        })
    }

    /// Parse a request from JSON text
    ///
    /// # Errors
    /// Returns `RequestError` on invalid JSON or an invalid request shape.
    pub fn from_json(text: &str) -> Result<Self, RequestError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    /// Load a request from a JSON file
    ///
    /// # Errors
    /// Returns `RequestError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, RequestError> {
        let text = std::fs::read_to_string(path).map_err(|source| RequestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded request file");
        Self::from_json(&text)
    }
}

/// Non-negative integer field; numeric strings are accepted
fn read_uint(obj: &Map<String, Value>, field: &'static str) -> Result<Option<u64>, RequestError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| RequestError::invalid(field, format!("expected non-negative integer, got {n}"))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| RequestError::invalid(field, e.to_string())),
        Some(other) => Err(RequestError::invalid(field, format!("expected integer, got {other}"))),
    }
}
