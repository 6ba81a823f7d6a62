use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for LLM operations.
pub type LlmResult<T> = anyhow::Result<T>;

/// Performance characteristics of an LLM provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCharacteristics {
    /// Maximum context window in tokens.
    pub max_tokens: usize,
    /// Typical latency in milliseconds (for budgeting).
    pub avg_latency_ms: u64,
    /// Whether the provider honors a JSON response format hint.
    pub supports_json: bool,
    /// Whether calls leave the machine.
    pub requires_network: bool,
}

/// Generation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: Option<usize>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
    /// Ask the backend for a JSON object response when supported.
    pub json_mode: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: Some(2048),
            top_p: None,
            stop: None,
            json_mode: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Response from the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub total_tokens: Option<usize>,
    pub prompt_tokens: Option<usize>,
    pub completion_tokens: Option<usize>,
    pub finish_reason: Option<String>,
    pub model: String,
}

/// Main trait for LLM providers. All calls are stateless.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a single prompt.
    async fn generate(&self, prompt: &str) -> LlmResult<LlmResponse> {
        let messages = vec![Message::user(prompt)];
        self.generate_chat(&messages, &GenerationConfig::default())
            .await
    }

    /// Generate a chat completion with message history.
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LlmResult<LlmResponse>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;

    fn provider_name(&self) -> &str;

    fn model_name(&self) -> &str;

    fn characteristics(&self) -> ProviderCharacteristics;

    /// Rough cost estimate in USD for a finished call. Local providers
    /// return zero.
    fn estimate_cost(&self, prompt_tokens: usize, completion_tokens: usize) -> f64 {
        let _ = (prompt_tokens, completion_tokens);
        0.0
    }
}

/// Transport errors shaped like a local proxy misconfiguration. The
/// structured layer retries exactly once with the proxy bypassed when it
/// sees one of these.
pub fn is_proxy_error(error: &reqwest::Error) -> bool {
    let text = error.to_string().to_lowercase();
    text.contains("socks") || text.contains("proxy")
}

/// Build the standard HTTP client pair: one honoring the environment
/// proxy settings, one bypassing them.
pub fn build_clients(
    timeout: std::time::Duration,
) -> anyhow::Result<(reqwest::Client, reqwest::Client)> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let no_proxy = reqwest::Client::builder()
        .timeout(timeout)
        .no_proxy()
        .build()?;
    Ok((client, no_proxy))
}
