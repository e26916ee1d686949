//! Model-assisted pipeline stages.
//!
//! Both stages degrade instead of failing: the claim extractor falls back to
//! heuristic claims, the chunk evaluator to an empty verdict.

use continuity_core::VerdictParseError;
use std::time::Duration;
use thiserror::Error;

use crate::providers::ProviderError;

mod client;
mod evaluator;
mod extractor;

pub use client::ModelClient;
pub use evaluator::ChunkEvaluator;
pub use extractor::ClaimExtractor;

/// Errors inside a model-assisted stage. Never escape the stage.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("model call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("unusable model response: {0}")]
    Parse(#[from] VerdictParseError),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}
