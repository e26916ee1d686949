//! Pipeline driver for one (narrative, backstory) pair.
//!
//! The pipeline implements:
//! - Chunking and claim extraction
//! - Uniform sampling of at most `sample_cap` chunks
//! - Bounded fan-out of chunk evaluations via `buffer_unordered`
//! - Deterministic fan-in through the Aggregator, in chunk order

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use continuity_core::{
    chunk_narrative, sample_chunks, Aggregator, ChunkVerdict, ClaimSet, EvidenceTally, Judgment,
    NarrativeChunk, StoryInput, StoryJudgment,
};

use crate::agents::{ChunkEvaluator, ClaimExtractor, ModelClient};
use crate::config::{ConfigError, RuntimeConfig};
use crate::providers::{LlmProvider, ProviderError, ProviderRegistry};
use crate::usage::{LlmUsage, UsageTracker};

/// Errors from building a pipeline. A built pipeline never fails a run.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),
}

/// Everything known about one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    /// Result-sink record
    pub story: StoryJudgment,

    pub judgment: Judgment,

    pub tally: EvidenceTally,

    /// Chunks produced by the chunker
    pub chunk_count: usize,

    /// Indices of the chunks actually evaluated, ascending
    pub evaluated_chunks: Vec<usize>,

    pub claims: ClaimSet,

    pub usage: LlmUsage,

    pub evaluated_at: DateTime<Utc>,
}

/// Runs chunk → claims → sample → evaluate → aggregate.
///
/// Without a provider the pipeline runs heuristic-only: claims come from the
/// backstory's sentences and every verdict is empty.
pub struct Pipeline {
    provider: Option<Arc<dyn LlmProvider>>,
    config: RuntimeConfig,
    aggregator: Aggregator,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn is_heuristic_only(&self) -> bool {
        self.provider.is_none()
    }

    /// Judge one example. `story_id` is echoed unchanged.
    pub async fn run(&self, input: &StoryInput) -> PipelineReport {
        let usage = Arc::new(UsageTracker::new());
        let client = self.provider.as_ref().map(|provider| {
            ModelClient::new(
                Arc::clone(provider),
                self.config.completion.clone(),
                Arc::clone(&usage),
            )
        });
        let extractor = ClaimExtractor::new(client.clone());
        let evaluator = ChunkEvaluator::new(client)
            .with_prompt_limits(self.config.prompt_chunk_chars, self.config.max_prompt_claims)
            .with_timeout(self.config.evaluation_timeout);

        let chunks = chunk_narrative(&input.narrative, self.config.chunk_size);
        tracing::info!(story_id = %input.story_id, chunks = chunks.len(), "Narrative chunked");

        let claims = extractor.extract(&chunks, &input.backstory).await;
        tracing::info!(
            story_id = %input.story_id,
            claims = claims.len(),
            origin = ?claims.origin(),
            "Claims extracted"
        );

        let sampled = sample_chunks(&chunks, self.config.sample_cap);
        let evaluated = self.evaluate_chunks(&evaluator, &sampled, &claims).await;

        let (evaluated_chunks, verdicts): (Vec<usize>, Vec<ChunkVerdict>) =
            evaluated.into_iter().unzip();
        let judgment = self.aggregator.judge(&verdicts);
        let tally = EvidenceTally::from_verdicts(&verdicts);

        tracing::info!(
            story_id = %input.story_id,
            prediction = judgment.prediction.label(),
            rule = ?judgment.rule,
            evaluated = evaluated_chunks.len(),
            "Example judged"
        );

        PipelineReport {
            story: StoryJudgment::new(input.story_id.clone(), &judgment),
            judgment,
            tally,
            chunk_count: chunks.len(),
            evaluated_chunks,
            claims,
            usage: usage.snapshot(),
            evaluated_at: Utc::now(),
        }
    }

    /// Judge examples one at a time, in input order.
    pub async fn run_batch(&self, inputs: &[StoryInput]) -> Vec<PipelineReport> {
        let mut reports = Vec::with_capacity(inputs.len());
        for (position, input) in inputs.iter().enumerate() {
            tracing::debug!(
                story_id = %input.story_id,
                position,
                total = inputs.len(),
                "Starting example"
            );
            reports.push(self.run(input).await);
        }
        reports
    }

    /// Fan out evaluations with at most `max_concurrency` in flight.
    ///
    /// Results come back in completion order and are re-sorted by chunk
    /// index, so the aggregator never sees completion order.
    async fn evaluate_chunks(
        &self,
        evaluator: &ChunkEvaluator,
        sampled: &[&NarrativeChunk],
        claims: &ClaimSet,
    ) -> Vec<(usize, ChunkVerdict)> {
        let mut results: Vec<(usize, ChunkVerdict)> = stream::iter(sampled.iter().copied())
            .map(|chunk| async move { (chunk.index, evaluator.evaluate(chunk, claims).await) })
            .buffer_unordered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`Pipeline`].
///
/// The provider comes from whichever of [`provider`](Self::provider),
/// [`maybe_provider`](Self::maybe_provider) or [`registry`](Self::registry)
/// was called last. A registry is resolved against the final config in
/// [`build`](Self::build), so it may be set before or after
/// [`config`](Self::config).
#[derive(Default)]
pub struct PipelineBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    registry: Option<ProviderRegistry>,
    config: RuntimeConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reasoning-service provider.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self.registry = None;
        self
    }

    /// Set or clear the provider. `None` selects heuristic-only mode.
    pub fn maybe_provider(mut self, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        self.provider = provider;
        self.registry = None;
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Create the provider named by the config's `provider` block at build time.
    ///
    /// The pipeline is heuristic-only when no credential is available.
    pub fn registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Some(registry);
        self.provider = None;
        self
    }

    /// Validate the configuration and build the pipeline.
    ///
    /// Fails on an invalid config, or when a registry is set and the
    /// provider type is unknown or its settings are invalid.
    pub fn build(self) -> Result<Pipeline, RuntimeError> {
        self.config.validate()?;

        let provider = match &self.registry {
            Some(registry) => registry.create_if_configured(
                self.config.provider_type(),
                &self.config.provider_settings(),
            )?,
            None => self.provider,
        };

        Ok(Pipeline {
            provider,
            config: self.config,
            aggregator: Aggregator::new(),
        })
    }
}
