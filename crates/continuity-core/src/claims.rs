//! Claim parsing and heuristic claim extraction.
//!
//! Model-produced claim lists arrive as free text with an enumerated list
//! somewhere inside. When no model is available, claims are approximated by
//! the backstory's longer sentences.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{ClaimOrigin, ClaimSet};

/// Maximum number of claims kept per backstory.
pub const MAX_CLAIMS: usize = 10;

/// Heuristic claims must be strictly longer than this many characters.
pub const MIN_HEURISTIC_CLAIM_CHARS: usize = 20;

lazy_static! {
    /// A numeric list marker at the start of a trimmed line: `12.`
    static ref NUMBERED_ITEM: Regex = Regex::new(r"^\d+\.\s*(?P<claim>.*)$").unwrap();
}

/// Parse claims from an enumerated list in a model response.
///
/// Only lines that start with `<digits>.` count. The marker is stripped,
/// model order is kept, empty items are dropped, and at most [`MAX_CLAIMS`]
/// are returned.
pub fn parse_numbered_claims(response: &str) -> Vec<String> {
    response
        .lines()
        .map(str::trim)
        .filter_map(|line| NUMBERED_ITEM.captures(line))
        .filter_map(|caps| {
            let claim = caps.name("claim")?.as_str().trim();
            (!claim.is_empty()).then(|| claim.to_string())
        })
        .take(MAX_CLAIMS)
        .collect()
}

/// Approximate claims by splitting the backstory on periods.
///
/// Keeps fragments longer than [`MIN_HEURISTIC_CLAIM_CHARS`] characters, in
/// source order, capped at [`MAX_CLAIMS`]. Never fails; may be empty.
pub fn heuristic_claims(backstory: &str) -> Vec<String> {
    backstory
        .split('.')
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() > MIN_HEURISTIC_CLAIM_CHARS)
        .take(MAX_CLAIMS)
        .map(str::to_string)
        .collect()
}

/// Build a claim set without a model.
pub fn heuristic_claim_set(backstory: &str) -> ClaimSet {
    ClaimSet::new(heuristic_claims(backstory), backstory, ClaimOrigin::Heuristic)
}

/// Build a claim set from a model response.
pub fn model_claim_set(response: &str, backstory: &str) -> ClaimSet {
    ClaimSet::new(parse_numbered_claims(response), backstory, ClaimOrigin::Model)
}
