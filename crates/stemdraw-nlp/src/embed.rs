use crate::vocab;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use stemdraw_core::{
    DiagramError, ExtractedItem, Extractor, ExtractorResult, Result, TextEmbedder, ToolId,
};

/// Embedding target id for the whole problem text.
pub const DOCUMENT_TARGET: &str = "__document__";

/// Deterministic hash-projection embedder. No model download, identical
/// vectors for identical text on every platform; the quality floor when
/// no sentence-transformer backend is reachable.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl TextEmbedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn available(&self) -> bool {
        true
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for token in text.to_lowercase().split_whitespace() {
            let digest = Sha256::digest(token.as_bytes());
            for (i, chunk) in digest.chunks_exact(2).enumerate() {
                let raw = u16::from_le_bytes([chunk[0], chunk[1]]);
                let slot = (raw as usize + i) % self.dimension;
                // map to [-1, 1] so common tokens do not dominate by sign
                vector[slot] += (raw as f32 / u16::MAX as f32) * 2.0 - 1.0;
            }
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaEmbedderConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for OllamaEmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "all-minilm:latest".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

/// Remote embedder speaking the Ollama embeddings API.
pub struct OllamaEmbedder {
    config: OllamaEmbedderConfig,
    client: reqwest::Client,
    dimension: usize,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaEmbedderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DiagramError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            client,
            dimension: 384,
        })
    }
}

#[async_trait]
impl TextEmbedder for OllamaEmbedder {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn available(&self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url.trim_end_matches('/'));
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/api/embeddings",
            self.config.base_url.trim_end_matches('/')
        );
        let request = OllamaEmbeddingRequest {
            model: &self.config.model,
            prompt: text,
        };
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DiagramError::LlmFailure(format!("ollama embeddings: {}", e)))?;
        if !response.status().is_success() {
            return Err(DiagramError::LlmFailure(format!(
                "ollama embeddings returned {}",
                response.status()
            )));
        }
        let parsed: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| DiagramError::LlmFailure(format!("ollama embeddings body: {}", e)))?;
        Ok(parsed.embedding)
    }
}

/// Extractor adapter around a text embedder: emits one embedding for the
/// document and one per indicator term found in the text. Transport
/// failures become a failed result, never an error.
pub struct EmbedderAdapter {
    embedder: Arc<dyn TextEmbedder>,
}

impl EmbedderAdapter {
    pub fn new(embedder: Arc<dyn TextEmbedder>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl Extractor for EmbedderAdapter {
    fn tool(&self) -> ToolId {
        ToolId::Embedder
    }

    async fn extract(&self, text: &str) -> ExtractorResult {
        let mut items = Vec::new();

        match self.embedder.embed(text).await {
            Ok(vector) => items.push(ExtractedItem::Embedding {
                target: DOCUMENT_TARGET.to_string(),
                vector,
            }),
            Err(e) => return ExtractorResult::failed(self.tool(), e.to_string()),
        }

        let lower = text.to_lowercase();
        for (term, _) in vocab::PHYSICAL_INDICATORS {
            if !lower.contains(term) {
                continue;
            }
            match self.embedder.embed(term).await {
                Ok(vector) => items.push(ExtractedItem::Embedding {
                    target: term.to_string(),
                    vector,
                }),
                Err(e) => {
                    let mut result = ExtractorResult::ok(self.tool(), items);
                    result.errors.push(e.to_string());
                    return result;
                }
            }
        }

        let mut result = ExtractorResult::ok(self.tool(), items);
        result
            .metadata
            .insert("embedder".to_string(), self.embedder.name().to_string());
        result
            .metadata
            .insert("dimension".to_string(), self.embedder.dimension().to_string());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("two capacitors in series").await.unwrap();
        let b = embedder.embed("two capacitors in series").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[tokio::test]
    async fn hash_embedder_normalizes() {
        let embedder = HashEmbedder::default();
        let v = embedder.embed("battery resistor switch").await.unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn adapter_emits_document_and_term_embeddings() {
        let adapter = EmbedderAdapter::new(Arc::new(HashEmbedder::default()));
        let result = adapter.extract("a battery and a resistor").await;
        let targets: Vec<_> = result
            .items
            .iter()
            .filter_map(|i| match i {
                ExtractedItem::Embedding { target, .. } => Some(target.as_str()),
                _ => None,
            })
            .collect();
        assert!(targets.contains(&DOCUMENT_TARGET));
        assert!(targets.contains(&"battery"));
        assert!(targets.contains(&"resistor"));
    }
}
