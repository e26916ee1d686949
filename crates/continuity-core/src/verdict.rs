//! Decoding chunk verdicts from free-text model responses.
//!
//! The reasoning service is asked for a strict JSON object, but responses
//! routinely wrap it in prose or code fences, drop keys, or use loose types.
//! Decoding is a dedicated step with an explicit outcome; the caller decides
//! what a failure means.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::types::ChunkVerdict;

lazy_static! {
    /// First `{` through last `}`, across newlines.
    static ref OBJECT_SPAN: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

/// Errors from verdict decoding.
#[derive(Error, Debug)]
pub enum VerdictParseError {
    #[error("No JSON object found in response")]
    NoJsonObject,

    #[error("Malformed verdict JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decode the verdict object embedded in a model response.
///
/// Tries the widest `{...}` span first, then the first brace-balanced object
/// if the wide span does not decode (for example when trailing prose also
/// contains a `}`).
pub fn parse_verdict(response: &str) -> Result<ChunkVerdict, VerdictParseError> {
    let span = OBJECT_SPAN
        .find(response)
        .ok_or(VerdictParseError::NoJsonObject)?
        .as_str();

    match serde_json::from_str::<ChunkVerdict>(span) {
        Ok(verdict) => Ok(verdict),
        Err(wide_err) => match balanced_object(response) {
            Some(candidate) if candidate != span => {
                serde_json::from_str::<ChunkVerdict>(candidate).map_err(VerdictParseError::from)
            }
            _ => Err(VerdictParseError::Malformed(wide_err)),
        },
    }
}

/// The first brace-balanced object in `text`, ignoring braces inside strings.
pub fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Tolerant field decoders used by the verdict and input types.
pub(crate) mod lenient {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::types::EvidenceEntry;

    /// Integer or numeric string; anything else is treated as absent.
    pub fn claim_number<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Strings pass through, null is empty, other scalars are rendered.
    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    /// A list of entries. `null` is an empty list; a bare string element
    /// becomes an entry carrying only an explanation.
    pub fn entries<'de, D>(deserializer: D) -> Result<Vec<EvidenceEntry>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(_) => serde_json::from_value(item).map_err(D::Error::custom),
                    Value::String(s) => Ok(EvidenceEntry {
                        explanation: s,
                        ..EvidenceEntry::default()
                    }),
                    _ => Ok(EvidenceEntry::default()),
                })
                .collect(),
            other => Err(D::Error::custom(format!(
                "expected a list of evidence entries, got {}",
                other
            ))),
        }
    }

    /// Booleans, `"true"`/`"yes"` strings, and non-zero numbers are true.
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Bool(b) => b,
            Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
            Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
            _ => false,
        })
    }

    /// Dataset identifiers may be strings or integers; both become text.
    pub fn identifier<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!(
                "story id must be a string or number, got {}",
                other
            ))),
        }
    }
}
