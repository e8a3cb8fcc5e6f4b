//! Failed-test extraction from CTest output

use regex::Regex;
use std::sync::OnceLock;

fn summary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"The following tests FAILED:\s*([\s\S]+)$")
            .unwrap_or_else(|e| panic!("failure summary pattern: {e}"))
    })
}

fn line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\d+\s*-\s*(.+?)\s*\(").unwrap_or_else(|e| panic!("failure line pattern: {e}"))
    })
}

/// Names of failed tests listed in a CTest summary.
///
/// Recognizes
///
/// ```text
/// The following tests FAILED:
///       1 - sample_tests (Failed)
/// ```
///
/// Output without a summary yields an empty list.
#[must_use]
pub fn extract_failed_tests(output: &str) -> Vec<String> {
    let Some(body) = summary_pattern().captures(output).and_then(|c| c.get(1)) else {
        return Vec::new();
    };
    body.as_str()
        .lines()
        .map(str::trim)
        .filter_map(|line| line_pattern().captures(line))
        .filter_map(|c| c.get(1).map(|m| m.as_str().trim().to_string()))
        .collect()
}
