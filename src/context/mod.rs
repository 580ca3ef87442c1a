//! Per-comment prompt context assembly.
//!
//! Gathers everything one generation call needs: the post caption, an
//! optionally validated image reference, the formality register, and the
//! creator's style exemplars, composed into system and user prompts.

mod formality;
mod media;

pub use formality::{infer as infer_formality, Formality};
pub use media::validate_image_url;

use crate::config::Config;
use crate::guard::Language;
use crate::prompt::{build_system_prompt, build_user_prompt, PromptEngine, SystemPromptInputs};
use crate::store::{self, Comment, FormalityMode, MediaKind, StyleProfile};
use anyhow::Result;
use reqwest::Client;

/// Caption length cap for prompt-size control.
const MAX_CAPTION_CHARS: usize = 400;

/// Few-shot exemplar cap.
const MAX_EXEMPLARS: usize = 20;

/// Fully assembled inputs for one guarded generation call.
#[derive(Debug, Clone)]
pub struct ReplyContext {
    pub system_prompt: String,
    pub user_prompt: String,
    pub image_url: Option<String>,
}

pub struct ContextBuilder<'a> {
    config: &'a Config,
    http: Client,
    engine: PromptEngine,
}

fn language_name(language: Language) -> &'static str {
    match language {
        Language::English => "English",
        Language::German => "German",
    }
}

fn truncate_caption(caption: &str) -> String {
    if caption.chars().count() <= MAX_CAPTION_CHARS {
        return caption.to_string();
    }
    let mut truncated: String = caption.chars().take(MAX_CAPTION_CHARS).collect();
    truncated.push('…');
    truncated
}

impl<'a> ContextBuilder<'a> {
    pub fn new(config: &'a Config) -> Result<Self> {
        Ok(Self {
            config,
            http: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            engine: PromptEngine::new()?,
        })
    }

    pub async fn build(
        &mut self,
        comment: &Comment,
        profile: &StyleProfile,
    ) -> Result<ReplyContext> {
        let post = match &comment.post_id {
            Some(post_id) => store::get_post(self.config, post_id)?,
            None => None,
        };

        let caption = post
            .as_ref()
            .map(|p| truncate_caption(&p.caption))
            .unwrap_or_default();

        let image_url = match &post {
            // A known-video asset is dropped without a probe.
            Some(p) if p.media_kind != MediaKind::Video => match &p.media_url {
                Some(url) => validate_image_url(&self.http, url).await,
                None => None,
            },
            _ => None,
        };

        let language = Language::from_tag(&profile.language);
        let register = match profile.formality {
            FormalityMode::Smart => infer_formality(&comment.text, language),
            FormalityMode::AlwaysFormal => Formality::Formal,
            FormalityMode::AlwaysInformal => Formality::Informal,
        };

        let exemplars: Vec<String> = profile
            .exemplars
            .iter()
            .take(MAX_EXEMPLARS)
            .cloned()
            .collect();

        let system_prompt = build_system_prompt(
            &mut self.engine,
            &SystemPromptInputs {
                persona_name: &self.config.persona.name,
                language_name: language_name(language),
                formality_instruction: register.instruction(language),
                tone: &profile.tone,
                style_hint: &profile.style_hint,
                exemplars: &exemplars,
            },
        )?;

        let user_prompt = build_user_prompt(
            &mut self.engine,
            &caption,
            &comment.author_handle,
            &comment.text,
        )?;

        Ok(ReplyContext {
            system_prompt,
            user_prompt,
            image_url,
        })
    }
}
