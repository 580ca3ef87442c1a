use super::PlatformClient;
use crate::config::Config;
use crate::providers::api_error;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

/// Client for the platform's graph-style HTTP API.
pub struct GraphPlatformClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ReplyResponse {
    id: String,
}

impl GraphPlatformClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.platform.base_url)
    }
}

#[async_trait]
impl PlatformClient for GraphPlatformClient {
    async fn like_comment(
        &self,
        external_comment_id: &str,
        access_token: &str,
    ) -> anyhow::Result<()> {
        let url = format!("{}/{external_comment_id}/likes", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[("access_token", access_token)])
            .send()
            .await
            .context("Like request failed")?;

        if !response.status().is_success() {
            return Err(api_error("platform like", response).await);
        }
        Ok(())
    }

    async fn reply_to_comment(
        &self,
        external_comment_id: &str,
        text: &str,
        access_token: &str,
    ) -> anyhow::Result<String> {
        let url = format!("{}/{external_comment_id}/replies", self.base_url);
        let response = self
            .client
            .post(&url)
            .form(&[("message", text), ("access_token", access_token)])
            .send()
            .await
            .context("Reply request failed")?;

        if !response.status().is_success() {
            return Err(api_error("platform reply", response).await);
        }

        let parsed: ReplyResponse = response
            .json()
            .await
            .context("Failed to parse reply response")?;
        Ok(parsed.id)
    }
}
