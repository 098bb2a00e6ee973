use crate::config::{ClipperConfig, ProviderConfig};
use crate::providers::{AnthropicProvider, FakeProvider, LlmError, LlmProvider, OpenAIProvider};
use log::{info, warn};
use std::sync::Arc;

pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider instance from configuration
    pub fn create(
        provider_name: &str,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn LlmProvider>, LlmError> {
        // Validate that provider is enabled
        if !config.enabled {
            return Err(LlmError::NotConfigured(format!(
                "Provider '{}' is not enabled in configuration",
                provider_name
            )));
        }

        match provider_name {
            "openai" => Ok(Arc::new(OpenAIProvider::new(config)?)),
            "anthropic" => Ok(Arc::new(AnthropicProvider::new(config)?)),
            "fake" => Ok(Arc::new(FakeProvider::default())),
            _ => Err(LlmError::NotConfigured(format!(
                "Unknown provider: {}",
                provider_name
            ))),
        }
    }

    /// Build the configured default provider.
    ///
    /// A known provider without credentials, or one switched off, disables AI
    /// extraction (`Ok(None)`) instead of failing startup.
    pub fn from_config(config: &ClipperConfig) -> Result<Option<Arc<dyn LlmProvider>>, LlmError> {
        let provider_name = config.default_provider.as_str();
        if !Self::available_providers().contains(&provider_name) {
            return Err(LlmError::NotConfigured(format!(
                "Unknown provider: {}",
                provider_name
            )));
        }

        let provider_config = config
            .providers
            .get(provider_name)
            .cloned()
            .unwrap_or_else(|| ProviderConfig::with_model(Self::default_model(provider_name)));

        match Self::create(provider_name, &provider_config) {
            Ok(provider) => {
                info!(
                    "AI extraction using provider '{}' ({})",
                    provider_name, provider_config.model
                );
                Ok(Some(provider))
            }
            Err(LlmError::NotConfigured(reason)) => {
                warn!("AI extraction disabled: {}", reason);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// List all available provider names
    pub fn available_providers() -> Vec<&'static str> {
        vec!["openai", "anthropic", "fake"]
    }

    fn default_model(provider_name: &str) -> &'static str {
        match provider_name {
            "anthropic" => "claude-3-5-sonnet-20241022",
            "fake" => "fake",
            _ => "gpt-4.1-mini",
        }
    }
}
