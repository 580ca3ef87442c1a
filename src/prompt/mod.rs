//! Prompt assembly for reply generation.

mod engine;

pub use engine::PromptEngine;

use crate::guard::Rule;
use tera::Context;

const SYSTEM_PROMPT_TEMPLATE: &str = "\
You are {{ persona_name }}, replying personally to a comment under your own post.
Write the reply in {{ language_name }}. {{ formality_instruction }}
Tone: {{ tone }}.
{% if style_hint %}Writing style: {{ style_hint }}
{% endif %}\
Keep it short, specific and human. One reply, nothing else.

Hard rules, no exceptions:
{% for rule in rules %}- {{ rule }}
{% endfor %}\
{% if exemplars %}
Replies you have written before. Match their voice:
{% for exemplar in exemplars %}- \"{{ exemplar }}\"
{% endfor %}{% endif %}";

const USER_PROMPT_TEMPLATE: &str = "\
Post caption:
\"{{ caption }}\"

Comment from @{{ author }}:
\"{{ comment }}\"

Write one reply that responds to the comment, referencing the post where it helps.";

const SYSTEM_PROMPT_NAME: &str = "reply_system_prompt";
const USER_PROMPT_NAME: &str = "reply_user_prompt";

/// All inputs to the system prompt, resolved by the context builder.
pub struct SystemPromptInputs<'a> {
    pub persona_name: &'a str,
    pub language_name: &'a str,
    pub formality_instruction: &'a str,
    pub tone: &'a str,
    pub style_hint: &'a str,
    pub exemplars: &'a [String],
}

/// Ensure the reply templates are registered in the engine.
fn ensure_defaults(engine: &mut PromptEngine) -> anyhow::Result<()> {
    // `add_template` overwrites silently, so we always register.
    engine.add_template(SYSTEM_PROMPT_NAME, SYSTEM_PROMPT_TEMPLATE)?;
    engine.add_template(USER_PROMPT_NAME, USER_PROMPT_TEMPLATE)?;
    Ok(())
}

/// Build the persona system prompt, restating every guard rule as a hard
/// "never" instruction.
pub fn build_system_prompt(
    engine: &mut PromptEngine,
    inputs: &SystemPromptInputs<'_>,
) -> anyhow::Result<String> {
    ensure_defaults(engine)?;

    let rules: Vec<&str> = [
        Rule::Hashtag,
        Rule::CollectiveVoice,
        Rule::CallToAction,
        Rule::Signature,
    ]
    .iter()
    .map(|rule| rule.instruction())
    .collect();

    let mut ctx = Context::new();
    ctx.insert("persona_name", inputs.persona_name);
    ctx.insert("language_name", inputs.language_name);
    ctx.insert("formality_instruction", inputs.formality_instruction);
    ctx.insert("tone", inputs.tone);
    ctx.insert("style_hint", inputs.style_hint);
    ctx.insert("rules", &rules);
    ctx.insert("exemplars", inputs.exemplars);

    engine.render(SYSTEM_PROMPT_NAME, &ctx)
}

/// Build the per-comment user prompt.
pub fn build_user_prompt(
    engine: &mut PromptEngine,
    caption: &str,
    author: &str,
    comment: &str,
) -> anyhow::Result<String> {
    ensure_defaults(engine)?;

    let mut ctx = Context::new();
    ctx.insert("caption", caption);
    ctx.insert("author", author);
    ctx.insert("comment", comment);

    engine.render(USER_PROMPT_NAME, &ctx)
}
