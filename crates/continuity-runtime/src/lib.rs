//! # continuity-runtime
//!
//! Model-assisted stages of the Continuity pipeline.
//!
//! `continuity-core` decides; this crate asks. It owns the reasoning-service
//! provider, the two prompt templates, the claim extractor and chunk
//! evaluator, and the [`Pipeline`] that fans chunk evaluations out and feeds
//! the verdicts back to the core aggregator in chunk order.
//!
//! ## Heuristic-only mode
//!
//! A pipeline built without a provider never calls a model. Claims come
//! from the backstory's sentences and every chunk verdict is empty, so the
//! judgment is always consistent. Missing credentials select this mode;
//! they are not an error.
//!
//! ## Example
//!
//! ```rust,ignore
//! use continuity_core::StoryInput;
//! use continuity_runtime::{Pipeline, ProviderRegistry, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_file("continuity.yaml")?;
//! let pipeline = Pipeline::builder()
//!     .config(config)
//!     .registry(ProviderRegistry::with_defaults())
//!     .build()?;
//!
//! let report = pipeline
//!     .run(&StoryInput::new("42", narrative, backstory))
//!     .await;
//! println!("{} {}", report.story.prediction, report.story.rationale);
//! ```

pub mod agents;
pub mod config;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod usage;

#[cfg(test)]
mod testing;

pub use agents::{AgentError, ChunkEvaluator, ClaimExtractor, ModelClient};
pub use config::{ConfigError, RuntimeConfig};
pub use orchestrator::{Pipeline, PipelineBuilder, PipelineReport, RuntimeError};
pub use providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, CredentialSource,
    LlmProvider, ProviderError, ProviderFactory, ProviderRegistry, TokenUsage,
};
pub use usage::{LlmUsage, UsageTracker};

#[cfg(feature = "gemini")]
pub use providers::{GeminiProvider, GeminiProviderFactory, GOOGLE_API_KEY_ENV};
