//! Batch draft generation.
//!
//! Walks a set of comment ids, builds the per-comment context, runs the
//! guarded generator and persists each draft the moment it exists. One
//! bad comment never poisons the rest of the batch, and a crash mid-run
//! keeps every draft generated so far.

use crate::config::Config;
use crate::context::ContextBuilder;
use crate::error::StoreError;
use crate::generation::{GuardTier, GuardedGenerator};
use crate::guard::Language;
use crate::providers::TextBackend;
use crate::store::{comments, profile, StyleProfile};
use anyhow::Result;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

/// Aggregate result of one drafting run. Per-comment failures are
/// counted, never raised.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub success_count: usize,
    pub error_count: usize,
}

pub struct DraftGenerator<'a> {
    config: &'a Config,
    backend: Arc<dyn TextBackend>,
}

impl<'a> DraftGenerator<'a> {
    pub fn new(config: &'a Config, backend: Arc<dyn TextBackend>) -> Self {
        Self { config, backend }
    }

    /// Draft replies for the given comments, pacing the backend calls
    /// with the configured delay. The style profile is loaded once for
    /// the whole batch.
    pub async fn run(&self, comment_ids: &[String]) -> Result<BatchOutcome> {
        let style = profile::load(self.config)?;
        let language = Language::from_tag(&style.language);
        let generator = GuardedGenerator::new(self.backend.clone(), language);
        let mut builder = ContextBuilder::new(self.config)?;

        let mut outcome = BatchOutcome::default();
        for (index, comment_id) in comment_ids.iter().enumerate() {
            if index > 0 && self.config.pacing.generation_delay_ms > 0 {
                sleep(Duration::from_millis(self.config.pacing.generation_delay_ms)).await;
            }

            match self
                .draft_one(&mut builder, &generator, &style, comment_id)
                .await
            {
                Ok(()) => outcome.success_count += 1,
                Err(e) => {
                    tracing::warn!(comment = %comment_id, "draft failed: {e:#}");
                    outcome.error_count += 1;
                }
            }
        }

        tracing::info!(
            success = outcome.success_count,
            errors = outcome.error_count,
            "draft batch complete"
        );
        Ok(outcome)
    }

    async fn draft_one(
        &self,
        builder: &mut ContextBuilder<'a>,
        generator: &GuardedGenerator,
        style: &StyleProfile,
        comment_id: &str,
    ) -> Result<()> {
        let comment = comments::get(self.config, comment_id)?
            .ok_or_else(|| StoreError::CommentNotFound(comment_id.to_string()))?;

        let context = builder.build(&comment, style).await?;
        let reply = generator.generate(&context).await?;

        if reply.tier == GuardTier::Sanitized {
            tracing::warn!(comment = %comment_id, "draft produced via sanitization fallback");
        }

        // Persisted immediately so earlier drafts survive a later failure.
        comments::set_reply_suggestion(self.config, comment_id, &reply.text)?;
        tracing::debug!(comment = %comment_id, tier = ?reply.tier, "draft stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::CompletionRequest;
    use crate::store::comments::test_comment;
    use crate::store::test_support::test_config;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedBackend {
        responses: Mutex<VecDeque<anyhow::Result<String>>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<anyhow::Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }

        fn always(text: &str) -> Arc<Self> {
            let copies = (0..16).map(|_| Ok(text.to_string())).collect();
            Self::new(copies)
        }
    }

    #[async_trait]
    impl TextBackend for ScriptedBackend {
        async fn complete(&self, _request: &CompletionRequest) -> anyhow::Result<String> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted response left")))
        }
    }

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn drafts_every_comment_in_the_batch() {
        let (_dir, config) = test_config();
        comments::insert(&config, &test_comment("c-1")).unwrap();
        comments::insert(&config, &test_comment("c-2")).unwrap();

        let backend = ScriptedBackend::always("Danke dir! 😊");
        let outcome = DraftGenerator::new(&config, backend)
            .run(&ids(&["c-1", "c-2"]))
            .await
            .unwrap();

        assert_eq!(outcome, BatchOutcome { success_count: 2, error_count: 0 });
        for id in ["c-1", "c-2"] {
            let loaded = comments::get(&config, id).unwrap().unwrap();
            assert_eq!(loaded.reply_suggestion.as_deref(), Some("Danke dir! 😊"));
        }
    }

    #[tokio::test]
    async fn missing_comment_is_isolated() {
        let (_dir, config) = test_config();
        comments::insert(&config, &test_comment("c-1")).unwrap();
        comments::insert(&config, &test_comment("c-3")).unwrap();

        let backend = ScriptedBackend::always("Danke dir!");
        let outcome = DraftGenerator::new(&config, backend)
            .run(&ids(&["c-1", "ghost", "c-3"]))
            .await
            .unwrap();

        assert_eq!(outcome, BatchOutcome { success_count: 2, error_count: 1 });
        assert!(comments::get(&config, "c-1")
            .unwrap()
            .unwrap()
            .reply_suggestion
            .is_some());
        assert!(comments::get(&config, "c-3")
            .unwrap()
            .unwrap()
            .reply_suggestion
            .is_some());
    }

    #[tokio::test]
    async fn backend_failure_mid_batch_keeps_earlier_drafts() {
        let (_dir, config) = test_config();
        comments::insert(&config, &test_comment("c-1")).unwrap();
        comments::insert(&config, &test_comment("c-2")).unwrap();
        comments::insert(&config, &test_comment("c-3")).unwrap();

        let backend = ScriptedBackend::new(vec![
            Ok("Erster Entwurf, danke dir!".into()),
            Err(anyhow::anyhow!("connection reset")),
            Ok("Dritter Entwurf, danke dir!".into()),
        ]);
        let outcome = DraftGenerator::new(&config, backend)
            .run(&ids(&["c-1", "c-2", "c-3"]))
            .await
            .unwrap();

        assert_eq!(outcome, BatchOutcome { success_count: 2, error_count: 1 });
        assert!(comments::get(&config, "c-1")
            .unwrap()
            .unwrap()
            .reply_suggestion
            .is_some());
        assert!(comments::get(&config, "c-2")
            .unwrap()
            .unwrap()
            .reply_suggestion
            .is_none());
    }

    #[tokio::test]
    async fn sanitized_draft_is_still_persisted() {
        let (_dir, config) = test_config();
        comments::insert(&config, &test_comment("c-1")).unwrap();

        // Both attempts violate; the stored draft is the stripped text.
        let backend = ScriptedBackend::always("#yum Danke dir!");
        let outcome = DraftGenerator::new(&config, backend)
            .run(&ids(&["c-1"]))
            .await
            .unwrap();

        assert_eq!(outcome.success_count, 1);
        let loaded = comments::get(&config, "c-1").unwrap().unwrap();
        assert_eq!(loaded.reply_suggestion.as_deref(), Some("Danke dir!"));
    }

    #[tokio::test]
    async fn empty_batch_is_a_noop() {
        let (_dir, config) = test_config();
        let backend = ScriptedBackend::new(Vec::new());
        let outcome = DraftGenerator::new(&config, backend).run(&[]).await.unwrap();
        assert_eq!(outcome, BatchOutcome::default());
    }
}
