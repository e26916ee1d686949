use continuity_core::{
    parse_verdict, ChunkVerdict, ClaimSet, NarrativeChunk, MAX_CLAIMS, PROMPT_CHUNK_CHARS,
};
use std::time::Duration;

use super::{AgentError, ModelClient};
use crate::prompts::chunk_evaluation_prompt;

const DEFAULT_EVALUATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Checks one chunk against the claim set.
///
/// # Failure policy
/// [`evaluate`](Self::evaluate) never fails. A transport error, a timeout or
/// an undecodable reply is logged and replaced by [`ChunkVerdict::empty`].
/// Absence of evidence never counts as a contradiction.
#[derive(Debug, Clone)]
pub struct ChunkEvaluator {
    client: Option<ModelClient>,
    prompt_chunk_chars: usize,
    max_prompt_claims: usize,
    timeout: Duration,
}

impl Default for ChunkEvaluator {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ChunkEvaluator {
    pub fn new(client: Option<ModelClient>) -> Self {
        Self {
            client,
            prompt_chunk_chars: PROMPT_CHUNK_CHARS,
            max_prompt_claims: MAX_CLAIMS,
            timeout: DEFAULT_EVALUATION_TIMEOUT,
        }
    }

    /// Limit the excerpt length and the number of enumerated claims.
    pub fn with_prompt_limits(mut self, chunk_chars: usize, max_claims: usize) -> Self {
        self.prompt_chunk_chars = chunk_chars;
        self.max_prompt_claims = max_claims;
        self
    }

    /// Bound each evaluation, model call included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn evaluate(&self, chunk: &NarrativeChunk, claims: &ClaimSet) -> ChunkVerdict {
        let Some(client) = &self.client else {
            return ChunkVerdict::empty();
        };

        match self.try_evaluate(client, chunk, claims).await {
            Ok(verdict) => {
                tracing::debug!(
                    chunk = chunk.index,
                    contradictions = verdict.contradictions.len(),
                    support = verdict.support.len(),
                    relevant = verdict.relevant,
                    "Chunk evaluated"
                );
                verdict
            }
            Err(e) => {
                tracing::warn!(
                    chunk = chunk.index,
                    error = %e,
                    "Chunk evaluation failed, using empty verdict"
                );
                ChunkVerdict::empty()
            }
        }
    }

    async fn try_evaluate(
        &self,
        client: &ModelClient,
        chunk: &NarrativeChunk,
        claims: &ClaimSet,
    ) -> Result<ChunkVerdict, AgentError> {
        let prompt = chunk_evaluation_prompt(
            chunk,
            claims,
            self.prompt_chunk_chars,
            self.max_prompt_claims,
        );

        let reply = match tokio::time::timeout(self.timeout, client.ask(prompt)).await {
            Ok(reply) => reply?,
            Err(_) => {
                // The dropped call never reached its own failure accounting
                client.usage().record_failure();
                return Err(AgentError::Timeout(self.timeout));
            }
        };

        Ok(parse_verdict(&reply)?)
    }
}
