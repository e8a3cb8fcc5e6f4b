//! Contract template table
//!
//! An ordered list of `(predicate, renderer)` pairs evaluated first-match-wins
//! against each extracted signature. Templates are conservative: a signature
//! matching none of them is left alone and escalated by the caller.

use crate::signature::{ContractHints, FunctionSignature};
use serde::{Deserialize, Serialize};

/// Recognized contract shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    /// `(char* dst, size_t dst_size, const char* src)` style copies
    BufferCopy,
    /// Two-argument integral division
    SafeDivision,
    /// `string -> string` normalizers
    IdempotentTransform,
}

impl ContractKind {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BufferCopy => "buffer_copy",
            Self::SafeDivision => "safe_division",
            Self::IdempotentTransform => "idempotent_transform",
        }
    }

    fn rationale(self, function: &str) -> String {
        match self {
            Self::BufferCopy => format!("{function}: buffer/length contract edge cases"),
            Self::SafeDivision => format!("{function}: divide-by-zero edge/contract"),
            Self::IdempotentTransform => format!("{function}: metamorphic (idempotence)"),
        }
    }
}

/// Names the renderers need
struct RenderContext<'a> {
    /// Call expression prefix, e.g. `legacy_sample::copy_cstr`
    callee: String,
    /// gtest suite suffix
    suite: String,
    hints: &'a ContractHints,
}

/// One entry of the template table
pub struct ContractTemplate {
    /// Shape this template recognizes
    pub kind: ContractKind,
    /// Extra standard includes the rendered tests need
    pub includes: &'static [&'static str],
    matches: fn(&FunctionSignature) -> bool,
    render: fn(&RenderContext<'_>) -> String,
}

impl std::fmt::Debug for ContractTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractTemplate")
            .field("kind", &self.kind)
            .field("includes", &self.includes)
            .finish_non_exhaustive()
    }
}

impl ContractTemplate {
    /// Whether `signature` has this template's shape
    #[inline]
    #[must_use]
    pub fn matches(&self, signature: &FunctionSignature) -> bool {
        (self.matches)(signature)
    }
}

/// Templates in order of specificity
pub const CONTRACT_TEMPLATES: &[ContractTemplate] = &[
    ContractTemplate {
        kind: ContractKind::BufferCopy,
        includes: &[],
        matches: is_buffer_copy,
        render: render_buffer_copy,
    },
    ContractTemplate {
        kind: ContractKind::SafeDivision,
        includes: &[],
        matches: is_safe_division,
        render: render_safe_division,
    },
    ContractTemplate {
        kind: ContractKind::IdempotentTransform,
        includes: &["<string>"],
        matches: is_idempotent_transform,
        render: render_idempotent_transform,
    },
];

/// Tests rendered for one signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedContract {
    /// Matched shape
    pub kind: ContractKind,
    /// gtest source text
    pub body: String,
    /// One-line justification
    pub rationale: String,
    /// Extra standard includes
    pub includes: &'static [&'static str],
}

/// First template matching `signature`
#[must_use]
pub fn classify(signature: &FunctionSignature) -> Option<&'static ContractTemplate> {
    CONTRACT_TEMPLATES.iter().find(|t| t.matches(signature))
}

/// Render the first matching template, qualifying calls with `qualifier`
/// (empty for the global scope).
#[must_use]
pub fn render_contract(
    signature: &FunctionSignature,
    qualifier: &str,
    hints: &ContractHints,
) -> Option<RenderedContract> {
    let template = classify(signature)?;
    let ctx = RenderContext {
        callee: format!("{qualifier}{}", signature.name),
        suite: capitalize(&signature.name),
        hints,
    };
    Some(RenderedContract {
        kind: template.kind,
        body: (template.render)(&ctx),
        rationale: template.kind.rationale(&signature.name),
        includes: template.includes,
    })
}

fn is_buffer_copy(sig: &FunctionSignature) -> bool {
    let params = sig.param_signature();
    sig.name.to_lowercase().contains("copy")
        && sig.params.len() >= 3
        && params.contains("char*")
        && params.contains("size_t")
}

fn is_safe_division(sig: &FunctionSignature) -> bool {
    sig.name.to_lowercase().contains("div")
        && sig.params.len() == 2
        && matches!(sig.compact_return_type().as_str(), "int" | "long" | "longlong")
}

fn is_idempotent_transform(sig: &FunctionSignature) -> bool {
    let name = sig.name.to_lowercase();
    ["normalize", "trim", "lower", "upper"].iter().any(|k| name.contains(k))
        && sig.params.len() == 1
        && is_string_type(&sig.params[0].ty)
        && is_string_type(&sig.return_type)
}

/// `const std::string&` and friends
fn is_string_type(ty: &str) -> bool {
    let plain: String = ty.split_whitespace().filter(|t| *t != "const").collect();
    matches!(plain.trim_end_matches('&'), "std::string" | "string")
}

fn render_buffer_copy(ctx: &RenderContext<'_>) -> String {
    let RenderContext { callee, suite, .. } = ctx;
    format!(
        r#"TEST(Generated_{suite}, NullDstOrZeroSize_NoCrash) {{
  EXPECT_EQ({callee}(nullptr, 10, "abc"), 0u);
  char buf[4] = {{'x','x','x','\0'}};
  EXPECT_EQ({callee}(buf, 0, "abc"), 0u);
  EXPECT_EQ(buf[0], 'x');
}}

TEST(Generated_{suite}, NullSrc_NullTerminates) {{
  char buf[4] = {{'x','x','x','\0'}};
  EXPECT_EQ({callee}(buf, sizeof(buf), nullptr), 0u);
  EXPECT_EQ(buf[0], '\0');
}}

TEST(Generated_{suite}, Truncation_NullTerminates_AndReturnBounded) {{
  char buf[4];
  auto n = {callee}(buf, sizeof(buf), "abcdef");
  EXPECT_LT(n, sizeof(buf));
  EXPECT_EQ(buf[sizeof(buf) - 1], '\0');
}}"#
    )
}

fn render_safe_division(ctx: &RenderContext<'_>) -> String {
    let RenderContext { callee, suite, hints } = ctx;
    if hints.zero_divisor_returns_zero {
        format!(
            "TEST(Generated_{suite}, ZeroDivisor_ReturnsZero) {{\n  EXPECT_EQ({callee}(10, 0), 0);\n}}"
        )
    } else {
        format!(
            "TEST(Generated_{suite}, ZeroDivisor_NoCrash) {{\n  (void){callee}(10, 0);\n  SUCCEED();\n}}"
        )
    }
}

fn render_idempotent_transform(ctx: &RenderContext<'_>) -> String {
    let RenderContext { callee, suite, .. } = ctx;
    format!(
        "TEST(Generated_{suite}, Idempotent_OnRepeatedApplication) {{
  const std::string in = \"  AbC  \";
  const auto once = {callee}(in);
  const auto twice = {callee}(once);
  EXPECT_EQ(once, twice);
}}"
    )
}

/// First character upper-cased, the rest lower-cased
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
