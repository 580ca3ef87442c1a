//! Formality-register inference from the commenter's own text.
//!
//! Used when the profile's formality mode is `smart`: if the commenter
//! addresses the creator formally, the reply answers in kind.

use crate::guard::Language;
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formality {
    Formal,
    Informal,
}

impl Formality {
    /// The instruction line injected into the system prompt.
    pub fn instruction(self, language: Language) -> &'static str {
        match (language, self) {
            (Language::German, Formality::Formal) => {
                "Address the commenter formally (Sie/Ihnen)."
            }
            (Language::German, Formality::Informal) => {
                "Address the commenter informally (du)."
            }
            (Language::English, Formality::Formal) => {
                "Address the commenter politely and formally."
            }
            (Language::English, Formality::Informal) => {
                "Address the commenter casually, like a friend."
            }
        }
    }
}

fn german_markers() -> &'static [Regex] {
    static MARKERS: OnceLock<Vec<Regex>> = OnceLock::new();
    MARKERS.get_or_init(|| {
        [
            // Capitalised "Sie"/"Ihnen"/"Ihr..." mid-sentence is the formal
            // second person; sentence-initial position is ambiguous and
            // deliberately not matched.
            r"[\p{Ll},;:!?] Sie\b",
            r"\bIhnen\b",
            r"[\p{Ll},;:!?] Ihr(?:e[mnrs]?)?\b",
            // Honorific + surname.
            r"\b(?:Herr|Frau)\s+\p{Lu}\p{L}+",
            r"(?i)\bsehr geehrte",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid formality pattern: {e}")))
        .collect()
    })
}

fn english_markers() -> &'static [Regex] {
    static MARKERS: OnceLock<Vec<Regex>> = OnceLock::new();
    MARKERS.get_or_init(|| {
        [
            r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.?\s+\p{Lu}\p{L}+",
            r"\bDear\s+\p{Lu}",
            r"(?i)\b(?:sincerely|good day|dear sir|dear madam)\b",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid formality pattern: {e}")))
        .collect()
    })
}

/// Classify the commenter's register. Defaults to informal, which is the
/// dominant register on the platform.
pub fn infer(comment_text: &str, language: Language) -> Formality {
    let markers = match language {
        Language::German => german_markers(),
        Language::English => english_markers(),
    };

    if markers.iter().any(|m| m.is_match(comment_text)) {
        Formality::Formal
    } else {
        Formality::Informal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn german_sie_mid_sentence_is_formal() {
        assert_eq!(
            infer("Können Sie das Rezept teilen?", Language::German),
            Formality::Formal
        );
        assert_eq!(
            infer("Vielen Dank, das hat Ihnen sicher Arbeit gemacht!", Language::German),
            Formality::Formal
        );
    }

    #[test]
    fn german_du_is_informal() {
        assert_eq!(
            infer("Kannst du das Rezept teilen? Sieht mega aus!", Language::German),
            Formality::Informal
        );
    }

    #[test]
    fn german_sentence_initial_sie_is_ambiguous_and_informal() {
        // "Sie" opening a sentence could be "she"; don't force formal.
        assert_eq!(
            infer("Sie sehen toll aus, die Muffins!", Language::German),
            Formality::Informal
        );
    }

    #[test]
    fn german_honorific_surname_is_formal() {
        assert_eq!(
            infer("Danke Frau Meier, tolles Video!", Language::German),
            Formality::Formal
        );
    }

    #[test]
    fn english_honorific_is_formal() {
        assert_eq!(
            infer("Thank you Dr. Smith, very helpful.", Language::English),
            Formality::Formal
        );
    }

    #[test]
    fn english_casual_is_informal() {
        assert_eq!(
            infer("omg this looks amazing!!", Language::English),
            Formality::Informal
        );
    }

    #[test]
    fn empty_text_defaults_to_informal() {
        assert_eq!(infer("", Language::German), Formality::Informal);
    }
}
