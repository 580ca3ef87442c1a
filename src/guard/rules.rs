use super::Language;
use regex::Regex;

/// The fixed, non-negotiable rule set. Rule names render into escalation
/// prompts, so the display strings are written for an LLM audience too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Rule {
    /// No hash-prefixed tokens anywhere in the message.
    Hashtag,
    /// No first-person-plural self-reference ("we", "us", "our" and the
    /// profile-language equivalents). The creator speaks as one person.
    CollectiveVoice,
    /// No call-to-action phrases ("link in bio", "check it out", ...).
    CallToAction,
    /// No sign-offs, signature lines, or support-handle mentions.
    Signature,
}

impl Rule {
    /// Prompt-facing restatement of the rule as a hard "never" instruction.
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Hashtag => "Never use hashtags.",
            Self::CollectiveVoice => {
                "Never speak as \"we\" or refer to a team. Always speak as \"I\", one person."
            }
            Self::CallToAction => {
                "Never add call-to-action phrases such as \"link in bio\", \"check it out\" or \"click here\"."
            }
            Self::Signature => {
                "Never close with a sign-off like \"Best regards\", never add a signature line, never mention a team or support account."
            }
        }
    }
}

const CTA_PHRASES_EN: &[&str] = &[
    "link in bio",
    "link in my bio",
    "check it out",
    "check out my",
    "click here",
    "click the link",
    "more info",
    "find out more",
    "learn more",
    "visit my profile",
    "follow for more",
    "dm me",
    "swipe up",
];

const CTA_PHRASES_DE: &[&str] = &[
    "link in der bio",
    "schau vorbei",
    "schau mal vorbei",
    "mehr infos",
    "klick hier",
    "jetzt entdecken",
];

const SUPPORT_MENTIONS_EN: &[&str] = &["my team", "the team", "support account", "support team"];

const SUPPORT_MENTIONS_DE: &[&str] = &["mein team", "unser support", "support-team"];

/// Collective-voice stems, longest-first so a single regex alternation
/// strips whole tokens ("we're" before "we").
const COLLECTIVE_EN: &[&str] = &[
    "we['’]re", "we['’]ll", "we['’]ve", "ourselves", "ours", "our", "we", "us",
];

const COLLECTIVE_DE: &[&str] = &[
    "unseres", "unserer", "unserem", "unseren", "unsere", "unserm", "unsern", "unser", "wir",
    "uns",
];

const CLOSING_LINES_EN: &[&str] = &[
    "kind regards",
    "best regards",
    "warm regards",
    "warmest regards",
    "regards",
    "best wishes",
    "all the best",
    "best",
    "sincerely",
    "yours truly",
    "cheers",
];

const CLOSING_LINES_DE: &[&str] = &[
    "mit freundlichen grüßen",
    "mit freundlichen gruessen",
    "freundliche grüße",
    "viele grüße",
    "liebe grüße",
    "beste grüße",
    "lg",
    "mfg",
];

pub(super) struct CompiledRules {
    pub(super) hashtag: Regex,
    pub(super) collective: Regex,
    pub(super) cta: Regex,
    /// A whole line consisting of a letter-closing, e.g. "Best regards,".
    pub(super) closing_line: Regex,
    /// A whole line that looks like an explicit signature, e.g. "-- Anna".
    pub(super) signature_line: Regex,
    pub(super) support_mention: Regex,
}

fn alternation(phrases: &[&str]) -> String {
    phrases
        .iter()
        .map(|p| regex::escape(p).replace(r"\'", "'"))
        .collect::<Vec<_>>()
        .join("|")
}

/// Join base + language-specific word lists into one case-insensitive,
/// word-bounded alternation.
fn word_list_regex(base: &[&str], extra: &[&str]) -> Regex {
    let mut all: Vec<&str> = base.to_vec();
    all.extend_from_slice(extra);
    // Collective stems carry their own character classes, so escaping is
    // applied per-phrase in `alternation` only for plain phrase lists.
    let pattern = format!(r"(?i)\b(?:{})\b", all.join("|"));
    Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid guard pattern: {e}"))
}

fn phrase_list_regex(base: &[&str], extra: &[&str]) -> Regex {
    let mut all: Vec<&str> = base.to_vec();
    all.extend_from_slice(extra);
    let pattern = format!(r"(?i)\b(?:{})\b", alternation(&all));
    Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid guard pattern: {e}"))
}

fn closing_line_regex(language: Language) -> Regex {
    let extra: &[&str] = match language {
        Language::German => CLOSING_LINES_DE,
        Language::English => &[],
    };
    let mut all: Vec<&str> = CLOSING_LINES_EN.to_vec();
    all.extend_from_slice(extra);
    let pattern = format!(r"(?im)^[ \t]*(?:{})\b[ \t]*[,.!]?[ \t]*$", alternation(&all));
    Regex::new(&pattern).unwrap_or_else(|e| panic!("invalid guard pattern: {e}"))
}

impl CompiledRules {
    pub(super) fn for_language(language: Language) -> Self {
        let (collective_extra, cta_extra, support_extra): (&[&str], &[&str], &[&str]) =
            match language {
                Language::German => (COLLECTIVE_DE, CTA_PHRASES_DE, SUPPORT_MENTIONS_DE),
                Language::English => (&[], &[], &[]),
            };

        Self {
            hashtag: Regex::new(r"#[\p{L}\p{N}_]+")
                .unwrap_or_else(|e| panic!("invalid guard pattern: {e}")),
            collective: word_list_regex(COLLECTIVE_EN, collective_extra),
            cta: phrase_list_regex(CTA_PHRASES_EN, cta_extra),
            closing_line: closing_line_regex(language),
            signature_line: Regex::new(r"(?m)^[ \t]*[-–—]{1,2}[ \t]*\p{Lu}[^\n]*$")
                .unwrap_or_else(|e| panic!("invalid guard pattern: {e}")),
            support_mention: phrase_list_regex(SUPPORT_MENTIONS_EN, support_extra),
        }
    }

    pub(super) fn violations(&self, text: &str) -> Vec<Rule> {
        let mut found = Vec::new();
        if self.hashtag.is_match(text) {
            found.push(Rule::Hashtag);
        }
        if self.collective.is_match(text) {
            found.push(Rule::CollectiveVoice);
        }
        if self.cta.is_match(text) {
            found.push(Rule::CallToAction);
        }
        if self.closing_line.is_match(text)
            || self.signature_line.is_match(text)
            || self.support_mention.is_match(text)
        {
            found.push(Rule::Signature);
        }
        found
    }
}
