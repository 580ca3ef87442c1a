//! Guarded reply generation.
//!
//! Wraps the text backend so that no reply can leave this module in
//! violation of the content policy. Escalation is a bounded three-tier
//! ladder rather than open-ended retries: one plain attempt, one
//! LLM-directed rewrite naming the broken rules, then deterministic
//! sanitization. The ladder always terminates and the last tier cannot
//! fail validation by construction.

use crate::context::ReplyContext;
use crate::guard::{Language, ReplyGuard, Rule};
use crate::providers::{CompletionRequest, TextBackend};
use anyhow::Result;
use std::sync::Arc;

/// Which tier produced the final text. `Sanitized` is the degraded
/// outcome worth monitoring; a rising rate means the prompts or the
/// model drifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardTier {
    /// First completion already passed validation.
    Clean,
    /// The rewrite attempt passed validation.
    Rewritten,
    /// Deterministic sanitization of the rewrite attempt.
    Sanitized,
}

#[derive(Debug, Clone)]
pub struct GuardedReply {
    pub text: String,
    pub tier: GuardTier,
}

/// Candidate text plus its violations; internal bookkeeping between
/// tiers, never persisted.
struct GenerationAttempt {
    text: String,
    violations: Vec<Rule>,
}

pub struct GuardedGenerator {
    backend: Arc<dyn TextBackend>,
    guard: ReplyGuard,
}

impl GuardedGenerator {
    pub fn new(backend: Arc<dyn TextBackend>, language: Language) -> Self {
        Self {
            backend,
            guard: ReplyGuard::new(language),
        }
    }

    /// Generate a reply that is guaranteed to satisfy the policy guard.
    ///
    /// Fails only when the backend is unreachable or a completion comes
    /// back empty (including empty after sanitization).
    pub async fn generate(&self, context: &ReplyContext) -> Result<GuardedReply> {
        let first = self.attempt(context, None).await?;
        if first.violations.is_empty() {
            return Ok(GuardedReply {
                text: first.text,
                tier: GuardTier::Clean,
            });
        }

        tracing::debug!(
            violations = %rule_list(&first.violations),
            "first completion violated policy, requesting rewrite"
        );

        let second = self.attempt(context, Some(&first.violations)).await?;
        if second.violations.is_empty() {
            return Ok(GuardedReply {
                text: second.text,
                tier: GuardTier::Rewritten,
            });
        }

        let sanitized = self.guard.sanitize(&second.text);
        tracing::warn!(
            violations = %rule_list(&second.violations),
            "rewrite still violated policy, falling back to sanitization"
        );

        if sanitized.is_empty() {
            anyhow::bail!("completion was empty after sanitization");
        }

        Ok(GuardedReply {
            text: sanitized,
            tier: GuardTier::Sanitized,
        })
    }

    async fn attempt(
        &self,
        context: &ReplyContext,
        broken_rules: Option<&[Rule]>,
    ) -> Result<GenerationAttempt> {
        let system_prompt = match broken_rules {
            Some(rules) => escalated_system_prompt(&context.system_prompt, rules),
            None => context.system_prompt.clone(),
        };

        let request = CompletionRequest {
            system_prompt,
            user_prompt: context.user_prompt.clone(),
            image_url: context.image_url.clone(),
        };

        let text = self.backend.complete(&request).await?;
        let violations = self.guard.validate(&text);
        Ok(GenerationAttempt { text, violations })
    }
}

fn rule_list(rules: &[Rule]) -> String {
    rules
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn escalated_system_prompt(system_prompt: &str, broken_rules: &[Rule]) -> String {
    let mut amended = String::from(system_prompt);
    amended.push_str("\n\nYour previous reply broke these rules: ");
    amended.push_str(&rule_list(broken_rules));
    amended.push_str(".\n");
    for rule in broken_rules {
        amended.push_str("- ");
        amended.push_str(rule.instruction());
        amended.push('\n');
    }
    amended.push_str("Write a completely new reply that avoids all of them.");
    amended
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct ScriptedBackend {
        responses: Mutex<VecDeque<anyhow::Result<String>>>,
        calls: AtomicUsize,
        seen_system_prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<anyhow::Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
                seen_system_prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextBackend for ScriptedBackend {
        async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_system_prompts
                .lock()
                .unwrap()
                .push(request.system_prompt.clone());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("no scripted response left")))
        }
    }

    fn context() -> ReplyContext {
        ReplyContext {
            system_prompt: "You are Lena.".into(),
            user_prompt: "Reply to: looks great!".into(),
            image_url: None,
        }
    }

    fn generator(backend: Arc<ScriptedBackend>) -> GuardedGenerator {
        GuardedGenerator::new(backend, Language::English)
    }

    #[tokio::test]
    async fn clean_first_completion_returns_immediately() {
        let backend = ScriptedBackend::new(vec![Ok("Thank you so much!".into())]);
        let reply = generator(backend.clone()).generate(&context()).await.unwrap();

        assert_eq!(reply.tier, GuardTier::Clean);
        assert_eq!(reply.text, "Thank you so much!");
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn violation_triggers_rewrite_naming_the_rules() {
        let backend = ScriptedBackend::new(vec![
            Ok("We loved it! #blessed".into()),
            Ok("I loved making it, thank you!".into()),
        ]);
        let reply = generator(backend.clone()).generate(&context()).await.unwrap();

        assert_eq!(reply.tier, GuardTier::Rewritten);
        assert_eq!(backend.calls(), 2);

        let prompts = backend.seen_system_prompts.lock().unwrap();
        assert!(!prompts[0].contains("broke these rules"));
        assert!(prompts[1].contains("broke these rules"));
        assert!(prompts[1].contains("hashtag"));
        assert!(prompts[1].contains("collective-voice"));
    }

    #[tokio::test]
    async fn persistent_violations_fall_back_to_sanitize() {
        let backend = ScriptedBackend::new(vec![
            Ok("Check it out! #promo".into()),
            Ok("Thanks a lot! Check it out! #promo".into()),
        ]);
        let generator = generator(backend.clone());
        let reply = generator.generate(&context()).await.unwrap();

        assert_eq!(reply.tier, GuardTier::Sanitized);
        assert_eq!(backend.calls(), 2, "sanitize tier must not call the backend");
        assert!(generator.guard.validate(&reply.text).is_empty());
        assert!(reply.text.contains("Thanks a lot!"));
    }

    #[tokio::test]
    async fn generator_never_returns_invalid_text() {
        // Backend that always violates forces the sanitize path; the
        // output must still validate.
        let backend = ScriptedBackend::new(vec![
            Ok("We post! #a link in bio".into()),
            Ok("We post! #a link in bio, click here".into()),
        ]);
        let generator = generator(backend);
        let reply = generator.generate(&context()).await.unwrap();
        assert!(generator.guard.validate(&reply.text).is_empty());
    }

    #[tokio::test]
    async fn backend_error_propagates() {
        let backend = ScriptedBackend::new(vec![Err(anyhow::anyhow!("connection refused"))]);
        let result = generator(backend).generate(&context()).await;
        assert!(result.unwrap_err().to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn rewrite_error_propagates() {
        let backend = ScriptedBackend::new(vec![
            Ok("#broken".into()),
            Err(anyhow::anyhow!("timeout")),
        ]);
        let result = generator(backend).generate(&context()).await;
        assert!(result.unwrap_err().to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn fully_stripped_completion_is_an_error() {
        let backend = ScriptedBackend::new(vec![
            Ok("#only #tags".into()),
            Ok("#still #only #tags".into()),
        ]);
        let result = generator(backend).generate(&context()).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("empty after sanitization"));
    }
}
