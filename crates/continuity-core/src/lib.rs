//! # continuity-core
//!
//! Deterministic logic for checking a character backstory against a
//! long-form narrative.
//!
//! This crate answers the model-free half of the question:
//! - How is the narrative cut into chunks?
//! - What claims does a backstory make, when no model is available?
//! - What verdict does a model response actually contain?
//! - Given every chunk verdict, is the backstory consistent?
//!
//! ## Key Guarantees
//!
//! 1. **No model calls, no I/O**: everything here is a pure function
//! 2. **Deterministic**: the same verdicts always produce the same judgment
//! 3. **Tolerant**: malformed upstream data is absorbed, never surfaced
//!
//! ## Example
//!
//! ```rust
//! use continuity_core::{chunk_narrative, Aggregator, ChunkVerdict, Prediction, DEFAULT_CHUNK_SIZE};
//!
//! let chunks = chunk_narrative("The ship sailed at dawn.\n\nNo one waved.", DEFAULT_CHUNK_SIZE);
//! assert_eq!(chunks.len(), 1);
//!
//! let verdicts = vec![ChunkVerdict::empty(); chunks.len()];
//! let judgment = Aggregator::new().judge(&verdicts);
//! assert_eq!(judgment.prediction, Prediction::Consistent);
//! ```

pub mod aggregator;
pub mod chunker;
pub mod claims;
pub mod sampling;
pub mod types;
pub mod verdict;

// Re-export main types at crate root
pub use aggregator::{Aggregator, EvidenceTally};
pub use chunker::{chunk_narrative, DEFAULT_CHUNK_SIZE};
pub use claims::{heuristic_claim_set, model_claim_set, MAX_CLAIMS};
pub use sampling::{sample_chunks, sample_indices, DEFAULT_SAMPLE_CAP};
pub use types::{
    ChunkVerdict, ClaimOrigin, ClaimSet, DecisionRule, EvidenceEntry, Judgment, NarrativeChunk,
    Prediction, StoryInput, StoryJudgment,
};
pub use verdict::{parse_verdict, VerdictParseError};

/// Characters of a chunk embedded in an evaluation prompt.
pub const PROMPT_CHUNK_CHARS: usize = 3000;
