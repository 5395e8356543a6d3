//! Name matching shared by every evaluator.
//!
//! Matching is loose: a medication's free-text display name
//! ("Lisinopril 10mg") refers to a rule term ("lisinopril") when either string
//! contains the other, case-insensitively. Rule coverage is tuned against this
//! both-direction containment, so it must not be tightened.

/// Separator for pair keys. Never present in a key part, since control
/// characters are stripped from names first.
const PAIR_KEY_SEPARATOR: &str = "\u{1f}";

/// Case-insensitive, trimmed, both-direction substring containment.
/// Empty names never match.
pub fn names_refer(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Same as [`names_refer`] but `lowered` is already trimmed and lowercased.
/// Used in hot loops over static vocabularies.
pub(crate) fn lowered_refers(lowered: &str, term: &str) -> bool {
    if lowered.is_empty() || term.is_empty() {
        return false;
    }
    lowered.contains(term) || term.contains(lowered)
}

/// Order-independent key for an unordered pair of names.
pub fn pair_key(a: &str, b: &str) -> String {
    let a = key_part(a);
    let b = key_part(b);
    if a <= b {
        format!("{a}{PAIR_KEY_SEPARATOR}{b}")
    } else {
        format!("{b}{PAIR_KEY_SEPARATOR}{a}")
    }
}

fn key_part(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .to_lowercase()
}

/// Best-effort generic name for a display name: drops dosage and form
/// tokens starting at the first token that begins with a digit.
/// "Warfarin 5mg" -> "warfarin", "Valproic Acid 250 mg" -> "valproic acid".
pub fn generic_term(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .take_while(|tok| !tok.starts_with(|c: char| c.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_refer_both_directions() {
        assert!(names_refer("Lisinopril 10mg", "lisinopril"));
        assert!(names_refer("lisinopril", "Lisinopril 10mg"));
        assert!(names_refer("  WARFARIN ", "warfarin"));
        assert!(!names_refer("Warfarin 5mg", "aspirin"));
    }

    #[test]
    fn names_refer_rejects_empty() {
        assert!(!names_refer("", "aspirin"));
        assert!(!names_refer("aspirin", "   "));
        assert!(!names_refer("", ""));
    }

    #[test]
    fn pair_key_is_symmetric() {
        assert_eq!(
            pair_key("Warfarin 5mg", "Aspirin 81mg"),
            pair_key("aspirin 81mg", "WARFARIN 5mg")
        );
        assert_ne!(pair_key("a", "bc"), pair_key("ab", "c"));
    }

    #[test]
    fn pair_key_ignores_embedded_separator() {
        assert_ne!(pair_key("a\u{1f}b", "c"), pair_key("a", "b\u{1f}c"));
        assert_eq!(pair_key("Warfarin\u{1f}", "aspirin"), pair_key("warfarin", "Aspirin"));
    }

    #[test]
    fn generic_term_strips_dosage() {
        assert_eq!(generic_term("Warfarin 5mg"), "warfarin");
        assert_eq!(generic_term("Valproic Acid 250 mg tablet"), "valproic acid");
        assert_eq!(generic_term("Metformin"), "metformin");
        assert_eq!(generic_term("10mg"), "");
    }

    #[test]
    fn lowered_refers_matches_names_refer() {
        assert!(lowered_refers("lisinopril 10mg", "lisinopril"));
        assert!(!lowered_refers("", "lisinopril"));
    }
}
