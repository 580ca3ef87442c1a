//! OpenAI-compatible chat completions backend.
//!
//! Most hosted completion APIs speak the same `/v1/chat/completions`
//! shape, so a single implementation covers the default hosted backend
//! and self-hosted gateways configured via `backend_base_url`.

use super::scrub::api_error;
use super::{CompletionRequest, TextBackend};
use crate::config::Config;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiCompatibleBackend {
    model: String,
    temperature: f64,
    /// Pre-computed `Authorization` value (avoids `format!` per request).
    cached_auth: Option<String>,
    cached_chat_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiCompatibleBackend {
    pub fn new(base_url: Option<&str>, api_key: Option<&str>, model: &str, temperature: f64) -> Self {
        let base = base_url
            .map_or(DEFAULT_BASE_URL, |u| u.trim_end_matches('/'))
            .to_string();
        let cached_chat_url = if base.contains("chat/completions") {
            base
        } else {
            format!("{base}/chat/completions")
        };
        let cached_auth = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| format!("Bearer {k}"));

        Self {
            model: model.to_string(),
            temperature,
            cached_auth,
            cached_chat_url,
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.backend_base_url.as_deref(),
            config.api_key.as_deref(),
            &config.model,
            config.temperature,
        )
    }

    fn user_message(request: &CompletionRequest) -> Message {
        match &request.image_url {
            Some(url) => Message {
                role: "user",
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: request.user_prompt.clone(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl { url: url.clone() },
                    },
                ]),
            },
            None => Message {
                role: "user",
                content: MessageContent::Text(request.user_prompt.clone()),
            },
        }
    }
}

#[async_trait]
impl TextBackend for OpenAiCompatibleBackend {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        let auth = self
            .cached_auth
            .as_ref()
            .context("Backend API key not set")?;

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system",
                    content: MessageContent::Text(request.system_prompt.clone()),
                },
                Self::user_message(request),
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.cached_chat_url)
            .header("Authorization", auth)
            .json(&body)
            .send()
            .await
            .context("Backend request failed")?;

        if !response.status().is_success() {
            return Err(api_error("backend", response).await);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse backend response")?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            anyhow::bail!("Backend returned an empty completion");
        }
        Ok(text)
    }
}
