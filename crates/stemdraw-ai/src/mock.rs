use crate::provider::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Deterministic in-process provider for tests and offline runs. Returns
/// queued canned responses in order, then an empty JSON object forever.
pub struct MockProvider {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().push_back(response.into());
    }

    /// Prompts received so far, for assertions.
    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        _config: &GenerationConfig,
    ) -> LlmResult<LlmResponse> {
        if let Some(last) = messages.last() {
            self.calls.lock().push(last.content.clone());
        }
        let content = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| "{}".to_string());
        let completion_tokens = content.split_whitespace().count();
        Ok(LlmResponse {
            content,
            total_tokens: Some(completion_tokens + 10),
            prompt_tokens: Some(10),
            completion_tokens: Some(completion_tokens),
            finish_reason: Some("stop".to_string()),
            model: "mock".to_string(),
        })
    }

    async fn is_available(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "mock"
    }

    fn characteristics(&self) -> ProviderCharacteristics {
        ProviderCharacteristics {
            max_tokens: 1_000_000,
            avg_latency_ms: 0,
            supports_json: true,
            requires_network: false,
        }
    }
}
