//! Aggregator: turns per-chunk verdicts into one judgment.
//!
//! The decision table is fixed and evaluated in order, first match wins:
//! 1. Any contradiction → INCONSISTENT
//! 2. Support ≥ 2 across ≥ 2 relevant chunks → CONSISTENT (supported)
//! 3. No relevant chunk at all → CONSISTENT (no evidence)
//! 4. Otherwise → CONSISTENT (weak support)
//!
//! Only rule 1 yields INCONSISTENT. Missing or sparse evidence always lands
//! on CONSISTENT. That asymmetry is the policy and must not be "fixed" here.

use serde::{Deserialize, Serialize};

use crate::types::{ChunkVerdict, DecisionRule, EvidenceEntry, Judgment, Prediction};

/// Minimum support entries for rule 2.
pub const MIN_SUPPORT: usize = 2;

/// Minimum relevant chunks for rule 2.
pub const MIN_RELEVANT_CHUNKS: usize = 2;

const FALLBACK_CONTRADICTION: &str = "conflicts with narrative";

/// Evidence counts across all verdicts of one example.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceTally {
    pub contradictions: usize,
    pub support: usize,
    pub relevant_chunks: usize,
    pub evaluated_chunks: usize,
}

impl EvidenceTally {
    pub fn from_verdicts(verdicts: &[ChunkVerdict]) -> Self {
        verdicts.iter().fold(Self::default(), |mut tally, v| {
            tally.contradictions += v.contradictions.len();
            tally.support += v.support.len();
            tally.relevant_chunks += usize::from(v.relevant);
            tally.evaluated_chunks += 1;
            tally
        })
    }
}

/// The Aggregator applies the decision table. Pure and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator;

impl Aggregator {
    pub fn new() -> Self {
        Self
    }

    /// Judge an example from its verdicts.
    ///
    /// `verdicts` must be in chunk order: the rationale for rule 1 quotes the
    /// first contradiction by chunk order, then by position within the chunk.
    pub fn judge(&self, verdicts: &[ChunkVerdict]) -> Judgment {
        let tally = EvidenceTally::from_verdicts(verdicts);

        // Rule 1: any contradiction
        if tally.contradictions > 0 {
            let explanation = first_contradiction(verdicts)
                .map(|entry| entry.explanation.trim())
                .filter(|text| !text.is_empty())
                .unwrap_or(FALLBACK_CONTRADICTION);

            return Judgment {
                prediction: Prediction::Inconsistent,
                rationale: format!(
                    "Found {} contradiction(s): {}",
                    tally.contradictions, explanation
                ),
                rule: DecisionRule::Contradicted,
            };
        }

        // Rule 2: corroborated across the narrative
        if tally.support >= MIN_SUPPORT && tally.relevant_chunks >= MIN_RELEVANT_CHUNKS {
            return Judgment {
                prediction: Prediction::Consistent,
                rationale: format!(
                    "Backstory supported by {} evidence points across narrative",
                    tally.support
                ),
                rule: DecisionRule::Supported,
            };
        }

        // Rule 3: nothing relevant anywhere
        if tally.relevant_chunks == 0 {
            return Judgment {
                prediction: Prediction::Consistent,
                rationale: "No contradictions found; backstory is plausible with narrative"
                    .to_string(),
                rule: DecisionRule::NoEvidence,
            };
        }

        // Rule 4
        Judgment {
            prediction: Prediction::Consistent,
            rationale: "Backstory is consistent with narrative constraints".to_string(),
            rule: DecisionRule::WeakSupport,
        }
    }
}

fn first_contradiction(verdicts: &[ChunkVerdict]) -> Option<&EvidenceEntry> {
    verdicts.iter().flat_map(|v| v.contradictions.iter()).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relevant(support: Vec<EvidenceEntry>) -> ChunkVerdict {
        ChunkVerdict {
            contradictions: vec![],
            support,
            relevant: true,
        }
    }

    fn contradicted(explanation: &str) -> ChunkVerdict {
        ChunkVerdict {
            contradictions: vec![EvidenceEntry::new(1, "quote", explanation)],
            support: vec![],
            relevant: true,
        }
    }

    #[test]
    fn test_single_contradiction_is_inconsistent() {
        let judgment = Aggregator::new().judge(&[contradicted("born in 1820, not 1840")]);

        assert_eq!(judgment.prediction, Prediction::Inconsistent);
        assert_eq!(judgment.rule, DecisionRule::Contradicted);
        assert_eq!(
            judgment.rationale,
            "Found 1 contradiction(s): born in 1820, not 1840"
        );
    }

    #[test]
    fn test_contradiction_beats_support() {
        let verdicts = vec![
            relevant(vec![EvidenceEntry::new(1, "a", "x"), EvidenceEntry::new(2, "b", "y")]),
            relevant(vec![EvidenceEntry::new(3, "c", "z")]),
            contradicted("never left the island"),
        ];
        let judgment = Aggregator::new().judge(&verdicts);

        assert_eq!(judgment.prediction, Prediction::Inconsistent);
    }

    #[test]
    fn test_rationale_quotes_first_contradiction_in_order() {
        let mut first = contradicted("first chunk, first entry");
        first
            .contradictions
            .push(EvidenceEntry::new(2, "q", "first chunk, second entry"));
        let verdicts = vec![ChunkVerdict::empty(), first, contradicted("second chunk")];

        let judgment = Aggregator::new().judge(&verdicts);
        assert_eq!(
            judgment.rationale,
            "Found 3 contradiction(s): first chunk, first entry"
        );
    }

    #[test]
    fn test_blank_explanation_uses_fallback_text() {
        let judgment = Aggregator::new().judge(&[contradicted("   ")]);
        assert_eq!(
            judgment.rationale,
            "Found 1 contradiction(s): conflicts with narrative"
        );
    }

    #[test]
    fn test_two_supports_across_two_relevant_chunks() {
        let verdicts = vec![
            relevant(vec![EvidenceEntry::new(1, "x", "fits")]),
            relevant(vec![EvidenceEntry::new(2, "y", "fits")]),
        ];
        let judgment = Aggregator::new().judge(&verdicts);

        assert_eq!(judgment.prediction, Prediction::Consistent);
        assert_eq!(judgment.rule, DecisionRule::Supported);
        assert!(judgment.rationale.contains("supported by 2 evidence points"));
    }

    #[test]
    fn test_no_relevant_chunks_defaults_to_consistent() {
        let verdicts = vec![ChunkVerdict::empty(), ChunkVerdict::empty()];
        let judgment = Aggregator::new().judge(&verdicts);

        assert_eq!(judgment.prediction, Prediction::Consistent);
        assert_eq!(judgment.rule, DecisionRule::NoEvidence);
        assert_eq!(
            judgment.rationale,
            "No contradictions found; backstory is plausible with narrative"
        );
    }

    #[test]
    fn test_no_verdicts_defaults_to_consistent() {
        let judgment = Aggregator::new().judge(&[]);
        assert_eq!(judgment.prediction, Prediction::Consistent);
        assert_eq!(judgment.rule, DecisionRule::NoEvidence);
    }

    #[test]
    fn test_support_in_one_chunk_is_weak() {
        // Two supports but only one relevant chunk does not satisfy rule 2.
        let verdicts = vec![
            relevant(vec![EvidenceEntry::new(1, "x", "a"), EvidenceEntry::new(2, "y", "b")]),
            ChunkVerdict::empty(),
        ];
        let judgment = Aggregator::new().judge(&verdicts);

        assert_eq!(judgment.prediction, Prediction::Consistent);
        assert_eq!(judgment.rule, DecisionRule::WeakSupport);
        assert_eq!(
            judgment.rationale,
            "Backstory is consistent with narrative constraints"
        );
    }

    /// Known policy: sparse or missing evidence never yields INCONSISTENT.
    /// Only an explicit contradiction can.
    #[test]
    fn test_policy_never_inconsistent_without_contradiction() {
        let cases = vec![
            vec![],
            vec![ChunkVerdict::empty()],
            vec![relevant(vec![])],
            vec![relevant(vec![]), relevant(vec![])],
            vec![ChunkVerdict {
                contradictions: vec![],
                support: vec![EvidenceEntry::new(1, "x", "y")],
                relevant: false,
            }],
        ];

        for verdicts in cases {
            let judgment = Aggregator::new().judge(&verdicts);
            assert_eq!(judgment.prediction, Prediction::Consistent);
        }
    }

    #[test]
    fn test_judgment_is_deterministic() {
        let verdicts = vec![
            relevant(vec![EvidenceEntry::new(1, "x", "a")]),
            contradicted("mismatch"),
            contradicted("another"),
        ];
        let aggregator = Aggregator::new();
        let first = aggregator.judge(&verdicts);

        for _ in 0..10 {
            assert_eq!(aggregator.judge(&verdicts), first);
        }
    }

    #[test]
    fn test_tally_counts() {
        let verdicts = vec![
            relevant(vec![EvidenceEntry::new(1, "x", "a")]),
            contradicted("c"),
            ChunkVerdict::empty(),
        ];
        let tally = EvidenceTally::from_verdicts(&verdicts);

        assert_eq!(
            tally,
            EvidenceTally {
                contradictions: 1,
                support: 1,
                relevant_chunks: 2,
                evaluated_chunks: 3,
            }
        );
    }
}
