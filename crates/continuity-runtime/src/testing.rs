//! Scripted provider for runtime tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};

type Reply = Box<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>;
type Delay = Box<dyn Fn(&str) -> Duration + Send + Sync>;

/// Answers each prompt with a closure of the prompt text.
pub(crate) struct ScriptedProvider {
    reply: Reply,
    delay: Delay,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub(crate) fn new(
        reply: impl Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            reply: Box::new(reply),
            delay: Box::new(|_| Duration::ZERO),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always reply with `text`.
    pub(crate) fn constant(text: &'static str) -> Self {
        Self::new(move |_| Ok(text.to_string()))
    }

    /// Always fail.
    pub(crate) fn failing() -> Self {
        Self::new(|_| {
            Err(ProviderError::ApiError {
                status: 503,
                message: "unavailable".to_string(),
            })
        })
    }

    pub(crate) fn with_delay(
        mut self,
        delay: impl Fn(&str) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Box::new(delay);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let delay = (self.delay)(prompt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        (self.reply)(prompt).map(|content| CompletionResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 2,
            },
            model: config.model.clone(),
            stop_reason: Some("STOP".to_string()),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
