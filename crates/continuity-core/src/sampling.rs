//! Evenly spaced chunk sampling.
//!
//! Bounds the number of model calls per example regardless of narrative
//! length, trading recall for bounded cost.

use crate::types::NarrativeChunk;

/// Default maximum number of chunks evaluated per example.
pub const DEFAULT_SAMPLE_CAP: usize = 20;

/// Indices to evaluate out of `total` chunks.
///
/// Every index when `total <= cap`; otherwise `cap` indices
/// `floor(i * total / cap)` for `i in 0..cap`.
pub fn sample_indices(total: usize, cap: usize) -> Vec<usize> {
    let size = total.min(cap);
    (0..size).map(|i| i * total / size).collect()
}

/// The sampled chunks, in chunk order.
pub fn sample_chunks(chunks: &[NarrativeChunk], cap: usize) -> Vec<&NarrativeChunk> {
    sample_indices(chunks.len(), cap)
        .into_iter()
        .map(|i| &chunks[i])
        .collect()
}
