//! Content-policy guard for generated replies.
//!
//! Pure function layer: no I/O, no state beyond compiled patterns. Every
//! candidate reply passes through [`ReplyGuard::validate`] before it may
//! leave the generation pipeline; [`ReplyGuard::sanitize`] is the
//! deterministic last line of defense that strips violations outright.

mod rules;
mod sanitize;

pub use rules::Rule;

use rules::CompiledRules;

/// Primary language of the creator's audience. Controls which
/// collective-voice stems and sign-off phrases the guard recognizes
/// on top of the always-active English set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    German,
}

impl Language {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "de" | "de-de" | "de-at" | "de-ch" | "german" | "deutsch" => Self::German,
            _ => Self::English,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::English => "en",
            Self::German => "de",
        }
    }
}

/// Fixed rule set enforcement for one creator profile.
pub struct ReplyGuard {
    rules: CompiledRules,
}

impl ReplyGuard {
    pub fn new(language: Language) -> Self {
        Self {
            rules: CompiledRules::for_language(language),
        }
    }

    /// Check a candidate reply against every rule. An empty result means
    /// the text is policy-compliant.
    pub fn validate(&self, text: &str) -> Vec<Rule> {
        self.rules.violations(text)
    }

    /// Deterministically strip every violation from `text`.
    ///
    /// Infallible and idempotent: the result always passes [`validate`],
    /// and sanitizing an already-clean string only normalizes whitespace.
    /// Grammar is not repaired; an empty string is an acceptable outcome
    /// for pathological input.
    ///
    /// [`validate`]: Self::validate
    pub fn sanitize(&self, text: &str) -> String {
        sanitize::sanitize(&self.rules, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> ReplyGuard {
        ReplyGuard::new(Language::German)
    }

    #[test]
    fn clean_text_passes() {
        let violations = guard().validate("Danke dir! Das freut mich sehr. 😊");
        assert!(violations.is_empty());
    }

    #[test]
    fn hashtag_is_flagged() {
        let violations = guard().validate("So grateful! #blessed");
        assert_eq!(violations, vec![Rule::Hashtag]);
    }

    #[test]
    fn collective_voice_is_flagged_in_both_languages() {
        assert!(guard().validate("We loved making this one.").contains(&Rule::CollectiveVoice));
        assert!(guard().validate("Das haben wir gern gemacht.").contains(&Rule::CollectiveVoice));
        assert!(guard().validate("Unser neues Video ist online.").contains(&Rule::CollectiveVoice));
    }

    #[test]
    fn call_to_action_is_flagged() {
        assert!(guard().validate("Glad you liked it, link in bio!").contains(&Rule::CallToAction));
        assert!(guard().validate("New recipe is up, CHECK IT OUT").contains(&Rule::CallToAction));
    }

    #[test]
    fn signature_lines_are_flagged() {
        let text = "Thanks a lot!\nBest regards";
        assert!(guard().validate(text).contains(&Rule::Signature));

        let german = "Danke!\nViele Grüße";
        assert!(guard().validate(german).contains(&Rule::Signature));

        let support = "Please reach out to my team for details.";
        assert!(guard().validate(support).contains(&Rule::Signature));
    }

    #[test]
    fn multiple_rules_reported_together() {
        let violations = guard().validate("We posted it! #new Check it out\nBest regards");
        assert!(violations.contains(&Rule::Hashtag));
        assert!(violations.contains(&Rule::CollectiveVoice));
        assert!(violations.contains(&Rule::CallToAction));
        assert!(violations.contains(&Rule::Signature));
    }

    #[test]
    fn sanitize_output_always_validates() {
        let inputs = [
            "Thanks for following! #grateful Link in bio!",
            "We are so happy!\nBest regards\n-- The Team",
            "#a #b #c",
            "",
            "   \n\n\n   ",
            "wir uns unser unsere",
            "check it out check it out check it out",
            "Normal clean reply with nothing to remove.",
            "c#check it outx our team my team",
        ];
        let guard = guard();
        for input in inputs {
            let sanitized = guard.sanitize(input);
            assert!(
                guard.validate(&sanitized).is_empty(),
                "sanitize({input:?}) left violations in {sanitized:?}"
            );
        }
    }

    #[test]
    fn sanitize_is_idempotent() {
        let guard = guard();
        let inputs = [
            "Thanks! #one two #three\nRegards",
            "We will post more info soon, click here!",
            "plain text",
        ];
        for input in inputs {
            let once = guard.sanitize(input);
            let twice = guard.sanitize(&once);
            assert_eq!(once, twice, "sanitize not idempotent for {input:?}");
        }
    }

    #[test]
    fn sanitize_strips_promo_phrases() {
        let out = guard().sanitize("Thanks for following! #grateful Link in bio!");
        assert!(!out.contains("#grateful"));
        assert!(!out.to_lowercase().contains("link in bio"));
        assert!(!out.contains("  "), "whitespace not collapsed: {out:?}");
        assert!(out.contains("Thanks for following!"));
    }

    #[test]
    fn sanitize_survives_pathological_input() {
        let out = guard().sanitize("#only #hash #tags");
        assert!(out.is_empty());
    }

    #[test]
    fn language_tag_parsing() {
        assert_eq!(Language::from_tag("de"), Language::German);
        assert_eq!(Language::from_tag("DE-AT"), Language::German);
        assert_eq!(Language::from_tag("en-US"), Language::English);
        assert_eq!(Language::from_tag("fr"), Language::English);
    }
}
