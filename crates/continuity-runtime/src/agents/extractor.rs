use continuity_core::{heuristic_claim_set, model_claim_set, ClaimSet, NarrativeChunk};

use super::ModelClient;
use crate::prompts::claim_extraction_prompt;

/// Derives the claim set for one example.
///
/// With a model: one call with the claim-extraction prompt, reply parsed as
/// a numbered list. Without one, or when the call fails: heuristic claims.
#[derive(Debug, Clone, Default)]
pub struct ClaimExtractor {
    client: Option<ModelClient>,
}

impl ClaimExtractor {
    pub fn new(client: Option<ModelClient>) -> Self {
        Self { client }
    }

    pub fn heuristic() -> Self {
        Self { client: None }
    }

    /// Extract claims from `backstory`.
    ///
    /// `chunks` is accepted as context and not used for filtering.
    pub async fn extract(&self, _chunks: &[NarrativeChunk], backstory: &str) -> ClaimSet {
        let Some(client) = &self.client else {
            return heuristic_claim_set(backstory);
        };

        match client.ask(claim_extraction_prompt(backstory)).await {
            Ok(reply) => model_claim_set(&reply, backstory),
            Err(e) => {
                tracing::warn!(
                    provider = client.provider_name(),
                    error = %e,
                    "Claim extraction failed, using heuristic claims"
                );
                heuristic_claim_set(backstory)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::CompletionConfig;
    use crate::testing::ScriptedProvider;
    use crate::usage::UsageTracker;
    use continuity_core::ClaimOrigin;
    use std::sync::Arc;

    const BACKSTORY: &str = "Ilse was raised by her uncle in Rotterdam. She learned to pick locks before she could read.";

    fn client(provider: ScriptedProvider) -> (ModelClient, Arc<UsageTracker>) {
        let usage = Arc::new(UsageTracker::new());
        let client = ModelClient::new(
            Arc::new(provider),
            CompletionConfig::default(),
            Arc::clone(&usage),
        );
        (client, usage)
    }

    #[tokio::test]
    async fn test_without_model_uses_heuristic() {
        let claims = ClaimExtractor::heuristic().extract(&[], BACKSTORY).await;

        assert_eq!(claims.origin(), ClaimOrigin::Heuristic);
        assert_eq!(
            claims.claims(),
            &[
                "Ilse was raised by her uncle in Rotterdam".to_string(),
                "She learned to pick locks before she could read".to_string(),
            ]
        );
        assert_eq!(claims.backstory(), BACKSTORY);
    }

    #[tokio::test]
    async fn test_model_reply_parsed_as_numbered_list() {
        let provider = ScriptedProvider::new(|prompt| {
            assert!(prompt.contains("Ilse was raised by her uncle"));
            Ok("Claims:\n1. Ilse grew up in Rotterdam.\n2. Her uncle raised her.\n3. She picks locks.".to_string())
        });
        let (client, usage) = client(provider);

        let claims = ClaimExtractor::new(Some(client)).extract(&[], BACKSTORY).await;

        assert_eq!(claims.origin(), ClaimOrigin::Model);
        assert_eq!(claims.len(), 3);
        assert_eq!(claims.claims()[0], "Ilse grew up in Rotterdam.");
        assert_eq!(usage.snapshot().llm_calls, 1);
    }

    #[tokio::test]
    async fn test_model_failure_degrades_to_heuristic() {
        let (client, usage) = client(ScriptedProvider::failing());

        let claims = ClaimExtractor::new(Some(client)).extract(&[], BACKSTORY).await;

        assert_eq!(claims.origin(), ClaimOrigin::Heuristic);
        assert_eq!(claims.len(), 2);
        assert_eq!(usage.snapshot().failed_calls, 1);
    }

    #[tokio::test]
    async fn test_unlisted_reply_yields_empty_model_claims() {
        let (client, _) = client(ScriptedProvider::constant("I cannot find any claims."));

        let claims = ClaimExtractor::new(Some(client)).extract(&[], BACKSTORY).await;

        assert_eq!(claims.origin(), ClaimOrigin::Model);
        assert!(claims.is_empty());
    }
}
