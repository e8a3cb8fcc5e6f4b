//! Header signature extraction
//!
//! [`SignatureExtractor`] is the seam between the synthesizer and whatever
//! understands C/C++ declarations. [`HeaderScanner`] is the built-in,
//! deliberately lightweight implementation: free-function declarations
//! ending in `;`, the `//` comment block directly above each one, and a
//! namespace only when the header declares exactly one.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A declared parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Declared type, whitespace-normalized
    pub ty: String,
    /// Parameter name (`argN` when the declaration omits it)
    pub name: String,
}

impl Param {
    /// Create a parameter
    #[inline]
    #[must_use]
    pub fn new(ty: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }

    /// Type with all whitespace removed (`const char *` -> `constchar*`)
    #[must_use]
    pub fn compact_type(&self) -> String {
        compact(&self.ty)
    }
}

/// A declared free function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSignature {
    /// Return type, whitespace-normalized, storage specifiers removed
    pub return_type: String,
    /// Function name
    pub name: String,
    /// Parameters in order
    pub params: Vec<Param>,
    /// Text of the `//` comment block directly above the declaration
    pub doc: String,
}

impl FunctionSignature {
    /// Return type with all whitespace removed
    #[must_use]
    pub fn compact_return_type(&self) -> String {
        compact(&self.return_type)
    }

    /// Compact parameter types joined by `,`
    #[must_use]
    pub fn param_signature(&self) -> String {
        self.params
            .iter()
            .map(Param::compact_type)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Contract facts stated literally in a doc comment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractHints {
    /// "if b == 0 ... returns 0"
    pub zero_divisor_returns_zero: bool,
    /// "always null-terminates"
    pub always_null_terminates: bool,
    /// "does nothing" on invalid input
    pub no_op_on_invalid: bool,
}

/// Turns header text into function signatures
pub trait SignatureExtractor: Send + Sync {
    /// Free-function declarations in `header_text`
    fn extract(&self, header_text: &str) -> Vec<FunctionSignature>;

    /// The enclosing scope, only when exactly one is declared
    fn detect_scope_qualifier(&self, header_text: &str) -> Option<String>;

    /// Contract hints stated in `doc_text`
    fn infer_contract_hints(&self, doc_text: &str) -> ContractHints;
}

const STORAGE_SPECIFIERS: &[&str] = &["static", "inline", "extern", "virtual", "constexpr", "explicit"];
const STATEMENT_KEYWORDS: &[&str] = &["return", "delete", "throw", "else", "using", "typedef", "goto"];

/// Regex-based [`SignatureExtractor`]
#[derive(Debug, Clone)]
pub struct HeaderScanner {
    declaration: Regex,
    namespace: Regex,
}

impl HeaderScanner {
    /// Compile the scanner patterns
    #[must_use]
    pub fn new() -> Self {
        Self {
            declaration: Regex::new(
                r"(?m)^(?P<ret>[\w:<>\s*&]+?)\s+(?P<name>[A-Za-z_]\w*)\s*\((?P<params>[^)]*)\)\s*;",
            )
            .unwrap_or_else(|e| panic!("declaration pattern: {e}")),
            namespace: Regex::new(r"(?m)^\s*namespace\s+([A-Za-z_]\w*)\s*\{")
                .unwrap_or_else(|e| panic!("namespace pattern: {e}")),
        }
    }
}

impl Default for HeaderScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureExtractor for HeaderScanner {
    fn extract(&self, header_text: &str) -> Vec<FunctionSignature> {
        let docs = doc_blocks(header_text);
        let mut out = Vec::new();

        for caps in self.declaration.captures_iter(header_text) {
            let (Some(ret), Some(name), Some(params)) = (caps.name("ret"), caps.name("name"), caps.name("params")) else {
                continue;
            };

            let mut ret_tokens: Vec<&str> = ret.as_str().split_whitespace().collect();
            if ret_tokens.first().is_some_and(|t| STATEMENT_KEYWORDS.contains(t)) {
                continue;
            }
            ret_tokens.retain(|t| !STORAGE_SPECIFIERS.contains(t));
            if ret_tokens.is_empty() {
                continue;
            }

            // Line of the first non-blank character of the declaration
            let leading_ws = ret.as_str().len() - ret.as_str().trim_start().len();
            let line = header_text[..ret.start() + leading_ws].matches('\n').count();

            out.push(FunctionSignature {
                return_type: ret_tokens.join(" "),
                name: name.as_str().to_string(),
                params: parse_params(params.as_str()),
                doc: docs.get(&line).cloned().unwrap_or_default(),
            });
        }

        out
    }

    fn detect_scope_qualifier(&self, header_text: &str) -> Option<String> {
        let names: BTreeSet<&str> = self
            .namespace
            .captures_iter(header_text)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();
        if names.len() == 1 {
            names.into_iter().next().map(str::to_string)
        } else {
            None
        }
    }

    fn infer_contract_hints(&self, doc_text: &str) -> ContractHints {
        let d = doc_text.to_lowercase();
        ContractHints {
            zero_divisor_returns_zero: d.contains("if b == 0") && d.contains("returns 0"),
            always_null_terminates: d.contains("always null-terminates") || d.contains("always null terminates"),
            no_op_on_invalid: d.contains("does nothing"),
        }
    }
}

/// Map from line index to the `//` comment block ending on the line above
fn doc_blocks(text: &str) -> HashMap<usize, String> {
    let mut docs = HashMap::new();
    let mut block: Vec<&str> = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let stripped = line.trim();
        if let Some(comment) = stripped.strip_prefix("//") {
            block.push(comment.trim_start_matches('/').trim());
        } else if !block.is_empty() {
            docs.insert(i, block.join("\n").trim().to_string());
            block.clear();
        }
    }
    docs
}

fn parse_params(raw: &str) -> Vec<Param> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "void" {
        return Vec::new();
    }

    let mut params = Vec::new();
    for part in raw.split(',') {
        // Drop default arguments
        let decl = part.split('=').next().unwrap_or(part).trim();
        let tokens: Vec<&str> = decl.split_whitespace().collect();
        if tokens.len() < 2 {
            params.push(Param::new(decl, format!("arg{}", params.len())));
            continue;
        }

        let (last, head) = (tokens[tokens.len() - 1], &tokens[..tokens.len() - 1]);
        // `char *dst` puts the declarator on the name
        let name = last.trim_start_matches(['*', '&']);
        let declarator = &last[..last.len() - name.len()];
        let mut ty = head.join(" ");
        ty.push_str(declarator);
        if name.is_empty() {
            params.push(Param::new(ty, format!("arg{}", params.len())));
        } else {
            params.push(Param::new(ty, name));
        }
    }
    params
}

fn compact(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}
