//! Fake LLM provider for tests and offline runs.

use super::{LlmError, LlmProvider};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns one canned reply for every prompt and counts invocations.
#[derive(Debug)]
pub struct FakeProvider {
    response: Value,
    calls: AtomicUsize,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::with_text("null")
    }
}

impl FakeProvider {
    /// Reply with `text` as the single assistant message.
    pub fn with_text(text: &str) -> Self {
        Self::with_raw(json!({
            "output": [{
                "role": "assistant",
                "content": [{"type": "output_text", "text": text}]
            }]
        }))
    }

    /// Reply with an arbitrary response object.
    pub fn with_raw(response: Value) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of times the provider has been invoked.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn invoke(&self, _prompt: &str) -> Result<Value, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}
