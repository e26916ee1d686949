//! Credential handling for reasoning-service providers.
//!
//! A missing credential is not an error for the pipeline as a whole: it
//! selects heuristic-only mode. Loaders therefore come in two flavours, one
//! that reports absence as `None` and one that reports it as
//! [`ProviderError::NotConfigured`] for callers that require a key.
//!
//! Credential values are held in [`SecretString`] and never appear in
//! `Debug` or `Display` output.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Provider configuration block
    Config,
    /// Environment variable
    Environment,
    /// Passed in by the caller
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Look up a credential in `config[config_key]`, then `env_var`.
    ///
    /// Empty values count as absent.
    pub fn lookup(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Option<Self> {
        if let Some(value) = config[config_key].as_str().filter(|v| !v.trim().is_empty()) {
            return Some(Self::new(value, CredentialSource::Config, name));
        }

        std::env::var(env_var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| Self::new(v, CredentialSource::Environment, name))
    }

    /// Like [`lookup`](Self::lookup), but absence is an error.
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        Self::lookup(config, config_key, env_var, name).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "{} required: set '{}' in config or {} environment variable",
                name, config_key, env_var
            ))
        })
    }

    /// Whether a credential could be loaded, without loading it.
    pub fn is_available(config: &JsonValue, config_key: &str, env_var: &str) -> bool {
        config[config_key]
            .as_str()
            .is_some_and(|v| !v.trim().is_empty())
            || std::env::var(env_var).is_ok_and(|v| !v.trim().is_empty())
    }

    /// Expose the value at the point of use (an HTTP header). Never store it.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_redacted_in_debug_and_display() {
        let secret = "AIza-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Config, "Google API key");

        let debug = format!("{:?}", cred);
        let display = format!("{}", cred);
        assert!(!debug.contains(secret), "Secret exposed in Debug!");
        assert!(!display.contains(secret), "Secret exposed in Display!");
        assert!(debug.contains("[REDACTED]"));
        assert!(display.contains("Google API key from config"));
    }

    #[test]
    fn test_expose_returns_value() {
        let cred = ApiCredential::new("key", CredentialSource::Programmatic, "Test key");
        assert_eq!(cred.expose(), "key");
        assert!(!cred.is_empty());
    }

    #[test]
    fn test_lookup_prefers_config() {
        std::env::set_var("CONTINUITY_TEST_KEY_PRIORITY", "env-key");
        let config = serde_json::json!({ "api_key": "config-key" });

        let cred =
            ApiCredential::lookup(&config, "api_key", "CONTINUITY_TEST_KEY_PRIORITY", "Test key")
                .unwrap();
        assert_eq!(cred.expose(), "config-key");
        assert_eq!(cred.source(), CredentialSource::Config);

        std::env::remove_var("CONTINUITY_TEST_KEY_PRIORITY");
    }

    #[test]
    fn test_lookup_falls_back_to_env() {
        std::env::set_var("CONTINUITY_TEST_KEY_FALLBACK", "env-key");
        let config = serde_json::json!({ "api_key": "  " });

        let cred =
            ApiCredential::lookup(&config, "api_key", "CONTINUITY_TEST_KEY_FALLBACK", "Test key")
                .unwrap();
        assert_eq!(cred.expose(), "env-key");
        assert_eq!(cred.source(), CredentialSource::Environment);

        std::env::remove_var("CONTINUITY_TEST_KEY_FALLBACK");
    }

    #[test]
    fn test_absence_is_none_or_not_configured() {
        let config = serde_json::json!({});

        assert!(ApiCredential::lookup(&config, "api_key", "CONTINUITY_NO_SUCH_VAR", "Test key")
            .is_none());
        assert!(!ApiCredential::is_available(&config, "api_key", "CONTINUITY_NO_SUCH_VAR"));

        let err = ApiCredential::from_config_or_env(
            &config,
            "api_key",
            "CONTINUITY_NO_SUCH_VAR",
            "Test key",
        )
        .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert!(err.to_string().contains("CONTINUITY_NO_SUCH_VAR"));
    }
}
