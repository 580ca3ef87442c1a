//! External social-platform API client.
//!
//! Two endpoints matter to the dispatcher: liking a comment (cosmetic,
//! best-effort) and replying to it (the hard requirement). Errors carry
//! the provider's message verbatim, scrubbed of secrets, so it can be
//! surfaced into a queue item's `error_message`.

mod graph;

pub use graph::GraphPlatformClient;

use async_trait::async_trait;

#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Best-effort like. Callers treat failure as non-fatal.
    async fn like_comment(
        &self,
        external_comment_id: &str,
        access_token: &str,
    ) -> anyhow::Result<()>;

    /// Post a reply under the comment. Returns the platform's id for the
    /// created reply.
    async fn reply_to_comment(
        &self,
        external_comment_id: &str,
        text: &str,
        access_token: &str,
    ) -> anyhow::Result<String>;
}
