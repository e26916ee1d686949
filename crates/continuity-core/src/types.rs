//! Core types for backstory consistency evaluation.
//!
//! Everything here is created and consumed within a single evaluation of one
//! (narrative, backstory) pair. Nothing persists across examples.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A bounded, contiguous excerpt of the narrative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarrativeChunk {
    /// Stable 0-based position in the narrative's chunk sequence
    pub index: usize,

    /// Chunk text, trimmed of leading/trailing whitespace
    pub text: String,
}

impl NarrativeChunk {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Length in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Which extraction path produced a claim set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimOrigin {
    /// Parsed from a numbered list returned by the reasoning service
    Model,
    /// Split from the backstory sentences without a model
    Heuristic,
}

/// Claims derived from a backstory, plus the backstory itself.
///
/// Immutable once built: there are no mutating methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    claims: Vec<String>,
    backstory: String,
    origin: ClaimOrigin,
}

impl ClaimSet {
    pub fn new(claims: Vec<String>, backstory: impl Into<String>, origin: ClaimOrigin) -> Self {
        Self {
            claims,
            backstory: backstory.into(),
            origin,
        }
    }

    /// Claims in extraction order.
    pub fn claims(&self) -> &[String] {
        &self.claims
    }

    /// The first `limit` claims, as sent to the chunk evaluator.
    pub fn leading(&self, limit: usize) -> &[String] {
        &self.claims[..self.claims.len().min(limit)]
    }

    pub fn backstory(&self) -> &str {
        &self.backstory
    }

    pub fn origin(&self) -> ClaimOrigin {
        self.origin
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

/// One contradiction or support item reported for a chunk.
///
/// `claim_num` is a 1-based position in the active claim set. It is never
/// validated: out-of-range or missing values are carried through as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceEntry {
    #[serde(
        default,
        alias = "claim_index",
        deserialize_with = "crate::verdict::lenient::claim_number"
    )]
    pub claim_num: Option<u32>,

    /// Quote from the narrative
    #[serde(default, deserialize_with = "crate::verdict::lenient::text")]
    pub evidence: String,

    /// Why the quote contradicts or supports the claim
    #[serde(default, deserialize_with = "crate::verdict::lenient::text")]
    pub explanation: String,
}

impl EvidenceEntry {
    pub fn new(
        claim_num: u32,
        evidence: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            claim_num: Some(claim_num),
            evidence: evidence.into(),
            explanation: explanation.into(),
        }
    }
}

/// Structured result of checking one chunk against a claim set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkVerdict {
    #[serde(default, deserialize_with = "crate::verdict::lenient::entries")]
    pub contradictions: Vec<EvidenceEntry>,

    #[serde(default, deserialize_with = "crate::verdict::lenient::entries")]
    pub support: Vec<EvidenceEntry>,

    #[serde(default, deserialize_with = "crate::verdict::lenient::flag")]
    pub relevant: bool,
}

impl ChunkVerdict {
    /// The conservative default: no contradictions, no support, not relevant.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.contradictions.is_empty() && self.support.is_empty() && !self.relevant
    }
}

/// Binary consistency prediction. Serialized as its integer label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prediction {
    /// Label 0
    Inconsistent,
    /// Label 1
    Consistent,
}

impl Prediction {
    pub fn label(self) -> u8 {
        match self {
            Prediction::Inconsistent => 0,
            Prediction::Consistent => 1,
        }
    }

    pub fn from_label(label: u8) -> Option<Self> {
        match label {
            0 => Some(Prediction::Inconsistent),
            1 => Some(Prediction::Consistent),
            _ => None,
        }
    }
}

impl std::fmt::Display for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Prediction::Consistent => write!(f, "Consistent"),
            Prediction::Inconsistent => write!(f, "Inconsistent"),
        }
    }
}

impl Serialize for Prediction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.label())
    }
}

impl<'de> Deserialize<'de> for Prediction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = u8::deserialize(deserializer)?;
        Prediction::from_label(label).ok_or_else(|| {
            serde::de::Error::custom(format!("prediction must be 0 or 1, got {}", label))
        })
    }
}

/// Which row of the decision table produced a judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    /// At least one contradiction was reported
    Contradicted,
    /// Enough support across enough relevant chunks
    Supported,
    /// No chunk was relevant
    NoEvidence,
    /// Some relevance, but not enough support
    WeakSupport,
}

/// Final output for one example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Judgment {
    pub prediction: Prediction,
    pub rationale: String,
    pub rule: DecisionRule,
}

/// One dataset example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryInput {
    /// Opaque identifier echoed back unchanged
    #[serde(alias = "id", deserialize_with = "crate::verdict::lenient::identifier")]
    pub story_id: String,
    pub narrative: String,
    pub backstory: String,
}

impl StoryInput {
    pub fn new(
        story_id: impl Into<String>,
        narrative: impl Into<String>,
        backstory: impl Into<String>,
    ) -> Self {
        Self {
            story_id: story_id.into(),
            narrative: narrative.into(),
            backstory: backstory.into(),
        }
    }
}

/// Result-sink record: `story_id, prediction, rationale`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryJudgment {
    pub story_id: String,
    pub prediction: Prediction,
    pub rationale: String,
}

impl StoryJudgment {
    pub fn new(story_id: impl Into<String>, judgment: &Judgment) -> Self {
        Self {
            story_id: story_id.into(),
            prediction: judgment.prediction,
            rationale: judgment.rationale.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_serializes_as_label() {
        let record = StoryJudgment {
            story_id: "s1".to_string(),
            prediction: Prediction::Inconsistent,
            rationale: "r".to_string(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["prediction"], 0);

        let back: StoryJudgment = serde_json::from_value(json).unwrap();
        assert_eq!(back.prediction, Prediction::Inconsistent);
    }

    #[test]
    fn test_prediction_rejects_other_labels() {
        let result: Result<Prediction, _> = serde_json::from_str("2");
        assert!(result.is_err());
    }

    #[test]
    fn test_claim_set_leading_caps() {
        let claims: Vec<String> = (1..=12).map(|i| format!("claim {}", i)).collect();
        let set = ClaimSet::new(claims, "backstory", ClaimOrigin::Model);

        assert_eq!(set.len(), 12);
        assert_eq!(set.leading(10).len(), 10);
        assert_eq!(set.leading(10)[9], "claim 10");
        assert_eq!(set.leading(50).len(), 12);
    }

    #[test]
    fn test_story_input_accepts_id_alias() {
        let input: StoryInput =
            serde_json::from_str(r#"{"id": 42, "narrative": "n", "backstory": "b"}"#).unwrap();
        assert_eq!(input.story_id, "42");
    }

    #[test]
    fn test_chunk_char_len_counts_characters() {
        let chunk = NarrativeChunk::new(0, "héllo");
        assert_eq!(chunk.char_len(), 5);
        assert_eq!(chunk.text.len(), 6);
    }
}
