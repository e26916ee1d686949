//! Paragraph-bounded narrative chunking.
//!
//! Paragraphs (separated by a blank line) are accumulated greedily until the
//! next one would bring the buffer to the size threshold. A paragraph is never
//! split: one longer than the threshold becomes an oversized chunk of its own.
//! That is an accepted limitation, not something to work around here.

use crate::types::NarrativeChunk;

/// Default chunk size threshold, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Paragraph separator.
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Split a narrative into ordered, non-overlapping chunks.
///
/// Lengths are counted in characters. Chunks are trimmed; chunks that are
/// empty after trimming are dropped, so empty or whitespace-only input yields
/// no chunks.
pub fn chunk_narrative(narrative: &str, max_chars: usize) -> Vec<NarrativeChunk> {
    let separator_len = PARAGRAPH_SEPARATOR.chars().count();
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for paragraph in narrative.split(PARAGRAPH_SEPARATOR) {
        let paragraph_len = paragraph.chars().count();

        if buffer_len + paragraph_len >= max_chars {
            push_chunk(&mut chunks, &buffer);
            buffer.clear();
            buffer_len = 0;
        }

        buffer.push_str(paragraph);
        buffer.push_str(PARAGRAPH_SEPARATOR);
        buffer_len += paragraph_len + separator_len;
    }

    push_chunk(&mut chunks, &buffer);

    tracing::trace!(chunks = chunks.len(), max_chars, "Chunked narrative");
    chunks
}

fn push_chunk(chunks: &mut Vec<NarrativeChunk>, buffer: &str) {
    let text = buffer.trim();
    if !text.is_empty() {
        let index = chunks.len();
        chunks.push(NarrativeChunk::new(index, text));
    }
}
