//! Runtime configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration:
//!
//! ```yaml
//! chunk_size: 4000
//! sample_cap: 20
//! max_concurrency: 4
//! evaluation_timeout: 60s
//! completion:
//!   model: gemini-1.5-pro
//!   request_timeout: 30s
//! provider:
//!   type: gemini
//!   base_url: https://generativelanguage.googleapis.com/v1beta
//! ```

use continuity_core::{DEFAULT_CHUNK_SIZE, DEFAULT_SAMPLE_CAP, MAX_CLAIMS, PROMPT_CHUNK_CHARS};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::providers::CompletionConfig;

/// Provider type used when the `provider` block names none.
pub const DEFAULT_PROVIDER_TYPE: &str = "gemini";

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Explicit configuration value handed to the pipeline builder.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Chunk threshold in characters
    pub chunk_size: usize,

    /// Maximum chunks evaluated per example
    pub sample_cap: usize,

    /// Chunk evaluations in flight at once
    pub max_concurrency: usize,

    /// Characters of each chunk embedded in the evaluation prompt
    pub prompt_chunk_chars: usize,

    /// Claims enumerated in the evaluation prompt
    pub max_prompt_claims: usize,

    /// Upper bound on one chunk evaluation, request included
    #[serde(with = "duration_str")]
    pub evaluation_timeout: Duration,

    pub completion: CompletionConfig,

    /// Provider block (`type`, `api_key`, `base_url`)
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "redacted_provider"
    )]
    pub provider: Option<JsonValue>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            sample_cap: DEFAULT_SAMPLE_CAP,
            max_concurrency: 4,
            prompt_chunk_chars: PROMPT_CHUNK_CHARS,
            max_prompt_claims: MAX_CLAIMS,
            evaluation_timeout: Duration::from_secs(60),
            completion: CompletionConfig::default(),
            provider: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null, not as an empty mapping
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    /// Reject values that would stall or misconfigure a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "chunk_size",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "max_concurrency",
                reason: "must be greater than 0".to_string(),
            });
        }
        if self.prompt_chunk_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "prompt_chunk_chars",
                reason: "must be greater than 0".to_string(),
            });
        }
        let temperature = self.completion.temperature;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                field: "completion.temperature",
                reason: format!("{} is outside [0, 2]", temperature),
            });
        }
        Ok(())
    }

    /// Provider type named by the `provider` block.
    pub fn provider_type(&self) -> &str {
        self.provider
            .as_ref()
            .and_then(|p| p["type"].as_str())
            .unwrap_or(DEFAULT_PROVIDER_TYPE)
    }

    /// Provider block for a factory, `{}` when absent.
    pub fn provider_settings(&self) -> JsonValue {
        self.provider
            .clone()
            .unwrap_or_else(|| JsonValue::Object(Default::default()))
    }
}

// The provider block may carry an API key
impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("chunk_size", &self.chunk_size)
            .field("sample_cap", &self.sample_cap)
            .field("max_concurrency", &self.max_concurrency)
            .field("prompt_chunk_chars", &self.prompt_chunk_chars)
            .field("max_prompt_claims", &self.max_prompt_claims)
            .field("evaluation_timeout", &self.evaluation_timeout)
            .field("completion", &self.completion)
            .field("provider", &self.provider.as_ref().map(|_| self.provider_type()))
            .finish()
    }
}

/// Serialize the provider block with `api_key` masked.
fn redacted_provider<S>(provider: &Option<JsonValue>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let mut provider = provider.clone();
    if let Some(JsonValue::Object(block)) = provider.as_mut() {
        if let Some(key) = block.get_mut("api_key") {
            *key = JsonValue::String("[REDACTED]".to_string());
        }
    }
    provider.serialize(serializer)
}

/// Serde helper for humantime strings such as `"45s"` or `"2m"`.
pub(crate) mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
