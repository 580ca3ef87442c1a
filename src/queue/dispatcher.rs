use super::repository;
use super::types::QueueItem;
use crate::config::Config;
use crate::platform::PlatformClient;
use crate::providers::sanitize_api_error;
use crate::store::{audit, comments, connections};
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Aggregate result of one dispatcher tick. Per-item failures are
/// counted, never raised; only the due-items query itself can fail the
/// tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
}

enum ItemResult {
    Sent,
    Failed,
}

/// Drains due queue items against the external platform.
///
/// Invoked on an external cadence. Invocations are expected to be kept
/// non-overlapping by the scheduler; a crash mid-tick leaves committed
/// per-item transitions valid and the rest `pending` for the next tick
/// (at-least-once, de-duplicated by the already-replied short-circuit).
pub struct Dispatcher {
    config: Arc<Config>,
    platform: Arc<dyn PlatformClient>,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, platform: Arc<dyn PlatformClient>) -> Self {
        Self { config, platform }
    }

    pub async fn tick(&self) -> Result<TickOutcome> {
        let due = repository::due_items(
            &self.config,
            Utc::now(),
            self.config.pacing.dispatch_batch_size,
        )
        .context("Failed to read due queue items")?;

        let mut outcome = TickOutcome::default();
        for (index, item) in due.iter().enumerate() {
            if index > 0 && self.config.pacing.dispatch_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.pacing.dispatch_delay_ms)).await;
            }

            outcome.processed += 1;
            match self.process_item(item).await {
                Ok(ItemResult::Sent) => outcome.sent += 1,
                Ok(ItemResult::Failed) => outcome.failed += 1,
                Err(e) => {
                    // Store-level trouble for this item only; the rest of
                    // the batch still runs.
                    tracing::warn!(item = %item.id, "queue item processing error: {e:#}");
                    outcome.failed += 1;
                }
            }
        }

        tracing::info!(
            processed = outcome.processed,
            sent = outcome.sent,
            failed = outcome.failed,
            "dispatch tick complete"
        );
        Ok(outcome)
    }

    /// Run ticks on a fixed interval until the process is terminated.
    pub async fn run(&self, every_secs: u64) -> Result<()> {
        let mut interval = tokio::time::interval(Duration::from_secs(every_secs.max(10)));
        loop {
            interval.tick().await;
            if let Err(e) = self.tick().await {
                tracing::warn!("dispatch tick failed: {e:#}");
            }
        }
    }

    async fn process_item(&self, item: &QueueItem) -> Result<ItemResult> {
        let Some(comment) = comments::get(&self.config, &item.comment_id)? else {
            repository::mark_failed(&self.config, &item.id, "comment not found")?;
            tracing::warn!(item = %item.id, comment = %item.comment_id, "comment not found");
            return Ok(ItemResult::Failed);
        };

        // Another channel already answered; succeed without touching the
        // platform.
        if comment.is_replied {
            repository::mark_sent(&self.config, &item.id)?;
            tracing::debug!(item = %item.id, "comment already replied, short-circuit to sent");
            return Ok(ItemResult::Sent);
        }

        let Some(token) = connections::access_token(&self.config)? else {
            repository::mark_failed(&self.config, &item.id, "no platform connection")?;
            tracing::warn!(item = %item.id, "no platform connection");
            return Ok(ItemResult::Failed);
        };

        // Liking is cosmetic; its failure never fails the item.
        if let Err(e) = self
            .platform
            .like_comment(&comment.external_id, &token)
            .await
        {
            tracing::warn!(comment = %comment.id, "like failed (ignored): {e:#}");
        }

        match self
            .platform
            .reply_to_comment(&comment.external_id, &item.reply_text, &token)
            .await
        {
            Ok(reply_id) => {
                repository::mark_sent(&self.config, &item.id)?;
                comments::mark_replied(&self.config, &comment.id)?;
                audit::record(&self.config, &item.id, &comment.id, &reply_id)?;
                tracing::info!(
                    item = %item.id,
                    comment = %comment.id,
                    reply = %reply_id,
                    "reply dispatched"
                );
                Ok(ItemResult::Sent)
            }
            Err(e) => {
                let message = sanitize_api_error(&format!("{e:#}"));
                repository::mark_failed(&self.config, &item.id, &message)?;
                tracing::warn!(item = %item.id, "reply failed: {message}");
                Ok(ItemResult::Failed)
            }
        }
    }
}
