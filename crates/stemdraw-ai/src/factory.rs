use crate::anthropic::{AnthropicConfig, AnthropicProvider};
use crate::mock::MockProvider;
use crate::ollama::{OllamaConfig, OllamaProvider};
use crate::openai::{OpenAiConfig, OpenAiProvider};
use crate::provider::LlmProvider;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use stemdraw_core::LlmBackendConfig;

/// Factory for creating LLM providers from the validated pipeline config.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    pub fn create(config: &LlmBackendConfig) -> Result<Arc<dyn LlmProvider>> {
        match config.backend.as_str() {
            "ollama" => {
                let mut ollama = OllamaConfig::default();
                if let Some(model) = &config.model {
                    ollama.model = model.clone();
                }
                if let Some(url) = &config.base_url {
                    ollama.base_url = url.clone();
                }
                Ok(Arc::new(OllamaProvider::new(ollama)?))
            }
            "openai" => {
                let mut openai = OpenAiConfig {
                    api_key: Self::read_key(config, "OPENAI_API_KEY")?,
                    ..OpenAiConfig::default()
                };
                if let Some(model) = &config.model {
                    openai.model = model.clone();
                }
                if let Some(url) = &config.base_url {
                    openai.base_url = url.clone();
                }
                Ok(Arc::new(OpenAiProvider::new(openai)?))
            }
            "anthropic" => {
                let mut anthropic = AnthropicConfig {
                    api_key: Self::read_key(config, "ANTHROPIC_API_KEY")?,
                    ..AnthropicConfig::default()
                };
                if let Some(model) = &config.model {
                    anthropic.model = model.clone();
                }
                if let Some(url) = &config.base_url {
                    anthropic.base_url = url.clone();
                }
                Ok(Arc::new(AnthropicProvider::new(anthropic)?))
            }
            "mock" => Ok(Arc::new(MockProvider::new())),
            other => Err(anyhow!(
                "unsupported LLM backend: {}. Available: ollama, openai, anthropic, mock",
                other
            )),
        }
    }

    fn read_key(config: &LlmBackendConfig, default_env: &str) -> Result<String> {
        let env_name = config.api_key_env.as_deref().unwrap_or(default_env);
        std::env::var(env_name)
            .map_err(|_| anyhow!("API key environment variable {} is not set", env_name))
    }

    pub fn supported_backends() -> Vec<&'static str> {
        vec!["ollama", "openai", "anthropic", "mock"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_backend_always_constructs() {
        let config = LlmBackendConfig {
            backend: "mock".to_string(),
            ..Default::default()
        };
        let provider = LlmProviderFactory::create(&config).unwrap();
        assert_eq!(provider.provider_name(), "mock");
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let config = LlmBackendConfig {
            backend: "palm".to_string(),
            ..Default::default()
        };
        assert!(LlmProviderFactory::create(&config).is_err());
    }

    #[test]
    fn ollama_backend_applies_overrides() {
        let config = LlmBackendConfig {
            backend: "ollama".to_string(),
            model: Some("llama3.1:8b".to_string()),
            base_url: Some("http://10.0.0.2:11434".to_string()),
            ..Default::default()
        };
        let provider = LlmProviderFactory::create(&config).unwrap();
        assert_eq!(provider.model_name(), "llama3.1:8b");
    }
}
