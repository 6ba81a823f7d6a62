use crate::provider::*;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "qwen2.5:7b";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

/// Local LLM provider speaking the Ollama chat API.
pub struct OllamaProvider {
    config: OllamaConfig,
    client: reqwest::Client,
    no_proxy_client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let (client, no_proxy_client) =
            build_clients(Duration::from_secs(config.timeout_secs))?;
        Ok(Self {
            config,
            client,
            no_proxy_client,
        })
    }

    async fn try_request(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<OllamaChatResponse> {
        let request = OllamaChatRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| OllamaMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            stream: false,
            format: if config.json_mode {
                Some("json".to_string())
            } else {
                None
            },
            options: OllamaOptions {
                temperature: config.temperature,
                num_predict: config.max_tokens.map(|t| t as i64),
                top_p: config.top_p,
                stop: config.stop.clone(),
            },
        };

        let url = format!("{}/api/chat", self.config.base_url.trim_end_matches('/'));
        let response = match self.client.post(&url).json(&request).send().await {
            Ok(response) => response,
            Err(e) if is_proxy_error(&e) => {
                tracing::warn!("proxy error talking to ollama, retrying without proxy");
                self.no_proxy_client.post(&url).json(&request).send().await?
            }
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("ollama API error ({}): {}", status, body));
        }

        response
            .json::<OllamaChatResponse>()
            .await
            .context("failed to parse ollama chat response")
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LlmResult<LlmResponse> {
        let response = self.try_request(messages, config).await?;
        let prompt_tokens = response.prompt_eval_count;
        let completion_tokens = response.eval_count;
        Ok(LlmResponse {
            content: response.message.content,
            total_tokens: match (prompt_tokens, completion_tokens) {
                (Some(p), Some(c)) => Some(p + c),
                _ => None,
            },
            prompt_tokens,
            completion_tokens,
            finish_reason: response.done_reason,
            model: response.model,
        })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn characteristics(&self) -> ProviderCharacteristics {
        ProviderCharacteristics {
            max_tokens: 32_768,
            avg_latency_ms: 2_000,
            supports_json: true,
            requires_network: false,
        }
    }
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    model: String,
    message: OllamaMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
    #[serde(default)]
    eval_count: Option<usize>,
}
