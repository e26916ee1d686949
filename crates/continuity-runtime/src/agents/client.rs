use std::sync::Arc;

use crate::providers::{ChatMessage, CompletionConfig, LlmProvider};
use crate::usage::UsageTracker;

use super::AgentError;

/// A provider plus the settings and usage tracker of one run.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
    usage: Arc<UsageTracker>,
}

impl ModelClient {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        config: CompletionConfig,
        usage: Arc<UsageTracker>,
    ) -> Self {
        Self {
            provider,
            config,
            usage,
        }
    }

    /// Send `prompt` as a single user message and return the reply text.
    pub async fn ask(&self, prompt: String) -> Result<String, AgentError> {
        match self
            .provider
            .complete(vec![ChatMessage::user(prompt)], &self.config)
            .await
        {
            Ok(response) => {
                self.usage.record(&response.usage, &response.model);
                Ok(response.content)
            }
            Err(e) => {
                self.usage.record_failure();
                Err(e.into())
            }
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn usage(&self) -> &Arc<UsageTracker> {
        &self.usage
    }
}

impl std::fmt::Debug for ModelClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelClient")
            .field("provider", &self.provider.name())
            .field("model", &self.config.model)
            .finish()
    }
}
