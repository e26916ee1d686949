//! Prompt templates for the two reasoning-service calls.
//!
//! Both prompts are sent as a single user message:
//! 1. Claim extraction - reply is a numbered list
//! 2. Chunk evaluation - reply is a JSON object, possibly wrapped in prose

use continuity_core::{ClaimSet, NarrativeChunk};

/// Asks for 5-10 enumerated, independently testable claims.
pub const CLAIM_EXTRACTION_TEMPLATE: &str = r#"Analyze this character backstory and extract specific, testable claims:

Backstory:
{backstory}

List 5-10 key claims that could be verified or contradicted by the main narrative. Format:
1. [Specific claim]
2. [Specific claim]
..."#;

/// Asks for contradictions and support in one narrative excerpt.
pub const CHUNK_EVALUATION_TEMPLATE: &str = r#"You are analyzing a section of a novel to check consistency with a character's hypothetical backstory.

NARRATIVE EXCERPT:
{excerpt}

BACKSTORY CLAIMS:
{claims}

Task: Identify any CONTRADICTIONS or STRONG SUPPORT in this excerpt.

Respond in JSON format:
{
  "contradictions": [
    {"claim_num": 1, "evidence": "quote from text", "explanation": "why it contradicts"}
  ],
  "support": [
    {"claim_num": 2, "evidence": "quote from text", "explanation": "why it supports"}
  ],
  "relevant": true/false
}

Only include clear, specific contradictions or support. Be conservative."#;

pub fn claim_extraction_prompt(backstory: &str) -> String {
    fill_template(CLAIM_EXTRACTION_TEMPLATE, &[("backstory", backstory)])
}

/// Build the evaluation prompt for one chunk.
///
/// The excerpt is cut to `max_chars` characters and only the first
/// `max_claims` claims are enumerated, numbered from 1.
pub fn chunk_evaluation_prompt(
    chunk: &NarrativeChunk,
    claims: &ClaimSet,
    max_chars: usize,
    max_claims: usize,
) -> String {
    let enumerated = claims
        .leading(max_claims)
        .iter()
        .enumerate()
        .map(|(i, claim)| format!("{}. {}", i + 1, claim))
        .collect::<Vec<_>>()
        .join("\n");

    fill_template(
        CHUNK_EVALUATION_TEMPLATE,
        &[
            ("excerpt", truncate_chars(&chunk.text, max_chars)),
            ("claims", &enumerated),
        ],
    )
}

/// Substitute `{name}` placeholders in a single pass over `template`.
///
/// Inserted values are never rescanned. Braces that do not form a known
/// placeholder, such as the JSON example, are copied as-is.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];

        let placeholder = values.iter().find(|(name, _)| {
            tail.strip_prefix(name)
                .is_some_and(|after| after.starts_with('}'))
        });

        match placeholder {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
