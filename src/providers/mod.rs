//! Text-generation backend: the only outbound dependency of the
//! drafting pipeline. One trait seam, one HTTP implementation.

mod openai;
mod scrub;

pub use openai::OpenAiCompatibleBackend;
pub use scrub::{sanitize_api_error, scrub_secret_patterns};

pub(crate) use scrub::api_error;

use async_trait::async_trait;

/// One request to the completion backend. Fields are explicit rather
/// than a loose payload map; the image reference is only present when
/// it already passed media validation.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub image_url: Option<String>,
}

/// Request/response text-completion service.
///
/// Treated as unreliable: callers must expect timeouts, transport errors
/// and empty completions. The guarded generator is the sole caller in
/// production code; tests inject mocks through this trait.
#[async_trait]
pub trait TextBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String>;
}
