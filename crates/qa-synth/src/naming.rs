//! Content-hash naming for generated artifacts
//!
//! Names depend only on their inputs, so re-running synthesis over the same
//! findings lands on the same files and question ids.

use qa_core::EscalationKind;

/// Hex characters kept from the hash
pub const STABLE_ID_LEN: usize = 10;

/// Short stable identifier: the first ten hex characters of the BLAKE3 hash
#[must_use]
pub fn stable_id(input: &str) -> String {
    let hash = blake3::hash(input.as_bytes());
    hex::encode(&hash.as_bytes()[..STABLE_ID_LEN / 2])
}

/// File name of the test generated for a finding/header pair
#[must_use]
pub fn generated_file_name(finding_path: &str, header_rel: &str) -> String {
    format!("agent_{}_generated_test.cpp", stable_id(&format!("{finding_path}{header_rel}")))
}

/// Identifier of an escalation question
#[must_use]
pub fn question_id(kind: EscalationKind, path: &str) -> String {
    format!("Q_{}", stable_id(&format!("{}:{path}", kind.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_short_hex_and_stable() {
        let a = stable_id("src/a.cpp");
        assert_eq!(a.len(), STABLE_ID_LEN);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a, stable_id("src/a.cpp"));
        assert_ne!(a, stable_id("src/b.cpp"));
    }

    #[test]
    fn file_name_shape() {
        let name = generated_file_name("src/a.cpp", "src/a.h");
        assert!(name.starts_with("agent_"));
        assert!(name.ends_with("_generated_test.cpp"));
        assert_eq!(name.len(), "agent__generated_test.cpp".len() + STABLE_ID_LEN);
    }

    #[test]
    fn question_ids_differ_by_kind() {
        let a = question_id(EscalationKind::NoHeader, "src/a.cpp");
        let b = question_id(EscalationKind::NoPattern, "src/a.cpp");
        assert!(a.starts_with("Q_"));
        assert_ne!(a, b);
    }
}
