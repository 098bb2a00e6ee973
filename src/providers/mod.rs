mod anthropic;
mod factory;
mod fake;
mod open_ai;
mod prompt;

pub use anthropic::AnthropicProvider;
pub use factory::ProviderFactory;
pub use fake::FakeProvider;
pub use open_ai::OpenAIProvider;
pub use prompt::{build_extraction_prompt, EXTRACTION_PROMPT};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors raised while invoking a generative model
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::RequestFailed(err.to_string())
    }
}

/// Unified trait for all LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn provider_name(&self) -> &str;

    /// Send `prompt` and return the response as a multi-message structure:
    /// `{"output": [{"role": ..., "content": [{"type": ..., "text": ...}]}]}`.
    async fn invoke(&self, prompt: &str) -> Result<Value, LlmError>;
}
