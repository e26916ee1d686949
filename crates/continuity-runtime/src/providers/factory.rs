//! Provider registry for creating reasoning-service backends by name.
//!
//! A provider block in the runtime configuration names a type (`gemini`)
//! and carries backend-specific settings. The registry maps that type to
//! a factory.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = ProviderRegistry::with_defaults();
//!
//! // None when no credential is available: heuristic-only mode
//! let provider = registry.create_if_configured("gemini", &config)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{LlmProvider, ProviderError};

/// Creates providers of one type from a JSON configuration block.
pub trait ProviderFactory: Send + Sync {
    /// Unique identifier for this provider type, e.g. `"gemini"`.
    fn provider_type(&self) -> &'static str;

    /// Create a provider instance from JSON configuration.
    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError>;

    /// Validate configuration without creating a provider.
    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError>;

    /// Whether a credential can be found for this configuration.
    ///
    /// Providers that need no credential keep the default.
    fn credential_available(&self, _config: &JsonValue) -> bool {
        true
    }
}

/// Registry of available provider factories, keyed by type name.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any with the same type.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    fn factory(&self, provider_type: &str) -> Result<&Arc<dyn ProviderFactory>, ProviderError> {
        self.factories.get(provider_type).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown provider type: '{}'. Available: {:?}",
                provider_type,
                self.available_types()
            ))
        })
    }

    /// Create a provider from type name and configuration.
    pub fn create(
        &self,
        provider_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        self.factory(provider_type)?.create(config)
    }

    /// Create a provider only when its credential is available.
    ///
    /// `Ok(None)` means the pipeline should run heuristic-only. An unknown
    /// type or an invalid configuration is still an error.
    pub fn create_if_configured(
        &self,
        provider_type: &str,
        config: &JsonValue,
    ) -> Result<Option<Arc<dyn LlmProvider>>, ProviderError> {
        let factory = self.factory(provider_type)?;
        if !factory.credential_available(config) {
            return Ok(None);
        }
        factory.validate_config(config)?;
        factory.create(config).map(Some)
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    /// Create a registry with all built-in providers registered.
    #[cfg(feature = "gemini")]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::GeminiProviderFactory));
        registry
    }

    /// Create a registry with all built-in providers registered.
    #[cfg(not(feature = "gemini"))]
    pub fn with_defaults() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse, TokenUsage};
    use async_trait::async_trait;

    struct EchoProvider {
        name: String,
    }

    #[async_trait]
    impl LlmProvider for EchoProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                content: messages
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default(),
                usage: TokenUsage::default(),
                model: "echo".to_string(),
                stop_reason: None,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    /// Needs `token` in its config to count as credentialed.
    struct EchoProviderFactory;

    impl ProviderFactory for EchoProviderFactory {
        fn provider_type(&self) -> &'static str {
            "echo"
        }

        fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
            let name = config["name"].as_str().unwrap_or("echo").to_string();
            Ok(Arc::new(EchoProvider { name }))
        }

        fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
            match config.get("name") {
                Some(name) if !name.is_string() => Err(ProviderError::NotConfigured(
                    "name must be a string".to_string(),
                )),
                _ => Ok(()),
            }
        }

        fn credential_available(&self, config: &JsonValue) -> bool {
            config["token"].is_string()
        }
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(EchoProviderFactory));
        registry
    }

    #[test]
    fn test_registry_register_and_create() {
        let registry = registry();
        assert!(registry.has_provider("echo"));
        assert!(!registry.has_provider("unknown"));

        let provider = registry
            .create("echo", &serde_json::json!({"name": "story-echo"}))
            .unwrap();
        assert_eq!(provider.name(), "story-echo");
    }

    #[test]
    fn test_registry_unknown_provider() {
        let result = ProviderRegistry::new().create("unknown", &serde_json::json!({}));
        match result {
            Err(ProviderError::NotConfigured(msg)) => {
                assert!(msg.contains("Unknown provider type"));
            }
            _ => panic!("Expected NotConfigured error"),
        }
    }

    #[test]
    fn test_create_if_configured_without_credential_is_none() {
        let provider = registry()
            .create_if_configured("echo", &serde_json::json!({}))
            .unwrap();
        assert!(provider.is_none());
    }

    #[test]
    fn test_create_if_configured_with_credential() {
        let provider = registry()
            .create_if_configured("echo", &serde_json::json!({"token": "t"}))
            .unwrap();
        assert!(provider.is_some());
    }

    #[test]
    fn test_create_if_configured_still_validates() {
        let result =
            registry().create_if_configured("echo", &serde_json::json!({"token": "t", "name": 7}));
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[test]
    fn test_registry_available_types() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.available_types().is_empty());

        registry.register(Arc::new(EchoProviderFactory));
        assert_eq!(registry.available_types(), vec!["echo"]);
    }

    #[cfg(feature = "gemini")]
    #[test]
    fn test_defaults_include_gemini() {
        assert!(ProviderRegistry::with_defaults().has_provider("gemini"));
    }
}
