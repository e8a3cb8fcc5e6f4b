//! Risk signal catalogue
//!
//! An ordered list of `(tag, pattern, weight)` entries. A signal contributes
//! its weight once per file no matter how often it matches; branch density
//! is counted separately and escalates at two thresholds.

use regex::Regex;

/// Tag added when branch keywords reach [`BRANCH_MID_THRESHOLD`]
pub const BRANCH_MID_TAG: &str = "branch_count>=20";

/// Tag added when branch keywords reach [`BRANCH_HIGH_THRESHOLD`]
pub const BRANCH_HIGH_TAG: &str = "high_branch_count>=50";

/// Branch count for the mid tier
pub const BRANCH_MID_THRESHOLD: usize = 20;

/// Branch count for the high tier
pub const BRANCH_HIGH_THRESHOLD: usize = 50;

const BRANCH_MID_WEIGHT: u32 = 2;
const BRANCH_HIGH_WEIGHT: u32 = 5;

const CATALOGUE: &[(&str, &str, u32)] = &[
    ("raw_new_delete", r"\b(new|delete)\b", 2),
    ("malloc_free", r"\b(malloc|calloc|realloc|free)\b", 3),
    ("memcpy_like", r"\b(memcpy|memmove|strcpy|strncpy|sprintf|vsprintf)\b", 4),
    ("strlen_like", r"\b(strlen|strnlen)\b", 2),
    ("reinterpret_cast", r"\breinterpret_cast\b", 3),
    ("c_style_cast", r"\([^()]+\)\s*\w", 1),
    ("pointer_arith", r"\w+\s*[+\-]\s*\w+", 1),
    ("mutex_thread", r"\b(std::thread|CreateThread|pthread_\w+|std::mutex)\b", 2),
    ("printf_format", r"%[0-9.]*[sduxXf]", 1),
];

const BRANCH_PATTERN: &str = r"\b(if|for|while|switch|case)\b";

/// A single weighted lexical signal
#[derive(Debug, Clone)]
pub struct Signal {
    /// Stable tag reported in findings
    pub tag: &'static str,
    /// Score contribution
    pub weight: u32,
    pattern: Regex,
}

impl Signal {
    /// Whether the signal occurs anywhere in `text`
    #[inline]
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

/// Compiled signal catalogue
#[derive(Debug, Clone)]
pub struct SignalCatalogue {
    signals: Vec<Signal>,
    branches: Regex,
}

impl SignalCatalogue {
    /// Compile the built-in catalogue
    #[must_use]
    pub fn new() -> Self {
        let signals = CATALOGUE
            .iter()
            .map(|&(tag, pattern, weight)| Signal {
                tag,
                weight,
                pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("signal `{tag}` pattern: {e}")),
            })
            .collect();
        Self {
            signals,
            branches: Regex::new(BRANCH_PATTERN).unwrap_or_else(|e| panic!("branch pattern: {e}")),
        }
    }

    /// Signals in catalogue order
    #[inline]
    #[must_use]
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Weight of the signal with `tag`, if catalogued
    #[must_use]
    pub fn weight_of(&self, tag: &str) -> Option<u32> {
        self.signals.iter().find(|s| s.tag == tag).map(|s| s.weight)
    }

    /// Number of branch keywords in `text`
    #[must_use]
    pub fn branch_count(&self, text: &str) -> usize {
        self.branches.find_iter(text).count()
    }

    /// Score `text`, returning the total and the contributing tags in order
    #[must_use]
    pub fn score(&self, text: &str) -> (u32, Vec<String>) {
        let mut score = 0;
        let mut reasons = Vec::new();

        for signal in &self.signals {
            if signal.matches(text) {
                score += signal.weight;
                reasons.push(signal.tag.to_string());
            }
        }

        let branches = self.branch_count(text);
        if branches >= BRANCH_HIGH_THRESHOLD {
            score += BRANCH_HIGH_WEIGHT;
            reasons.push(BRANCH_HIGH_TAG.to_string());
        } else if branches >= BRANCH_MID_THRESHOLD {
            score += BRANCH_MID_WEIGHT;
            reasons.push(BRANCH_MID_TAG.to_string());
        }

        (score, reasons)
    }
}

impl Default for SignalCatalogue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_compiles() {
        let catalogue = SignalCatalogue::new();
        assert_eq!(catalogue.signals().len(), CATALOGUE.len());
        assert_eq!(catalogue.weight_of("memcpy_like"), Some(4));
        assert_eq!(catalogue.weight_of("nope"), None);
    }

    #[test]
    fn empty_text_scores_zero() {
        let (score, reasons) = SignalCatalogue::new().score("");
        assert_eq!(score, 0);
        assert!(reasons.is_empty());
    }

    #[test]
    fn each_signal_counts_once() {
        let catalogue = SignalCatalogue::new();
        let (once, _) = catalogue.score("strcpy;");
        let (many, reasons) = catalogue.score("strcpy; strcpy; strcpy;");
        assert_eq!(once, many);
        assert_eq!(reasons, vec!["memcpy_like".to_string()]);
    }

    #[test]
    fn pthread_calls_are_thread_signals() {
        let (_, reasons) = SignalCatalogue::new().score("pthread_create;");
        assert!(reasons.contains(&"mutex_thread".to_string()));
    }

    #[test]
    fn printf_specifiers_are_detected() {
        let (score, reasons) = SignalCatalogue::new().score("\"%5.2f\"");
        assert_eq!(score, 1);
        assert_eq!(reasons, vec!["printf_format".to_string()]);
    }

    #[test]
    fn branch_tiers() {
        let catalogue = SignalCatalogue::new();

        let (s19, r19) = catalogue.score(&"if ".repeat(19));
        assert_eq!(s19, 0);
        assert!(r19.is_empty());

        let (s20, r20) = catalogue.score(&"while ".repeat(20));
        assert_eq!(s20, 2);
        assert_eq!(r20, vec![BRANCH_MID_TAG.to_string()]);

        let (s50, r50) = catalogue.score(&"case ".repeat(50));
        assert_eq!(s50, 5);
        assert_eq!(r50, vec![BRANCH_HIGH_TAG.to_string()]);
    }

    #[test]
    fn else_if_counts_once() {
        assert_eq!(SignalCatalogue::new().branch_count("else if"), 1);
        assert_eq!(SignalCatalogue::new().branch_count("iffy forever"), 0);
    }
}
