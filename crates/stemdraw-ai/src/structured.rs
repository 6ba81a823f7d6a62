use crate::provider::{GenerationConfig, LlmProvider, Message};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Prompt templates by id. Variables use `{name}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptId {
    GraphEnrichment,
    DiagramPlanning,
    SceneAudit,
    SemanticValidation,
}

impl PromptId {
    fn template(self) -> &'static str {
        match self {
            PromptId::GraphEnrichment => {
                "You analyze STEM problem statements. Given the problem text and the \
                 entities already extracted, list anything missing.\n\n\
                 Problem:\n{text}\n\nKnown entities:\n{entities}\n\n\
                 Respond with JSON only: {\"nodes\": [{\"id\": ..., \"label\": ..., \
                 \"kind\": \"object|concept|quantity|material|agent|event\"}], \
                 \"edges\": [{\"source\": ..., \"target\": ..., \"relation\": ...}]}"
            }
            PromptId::DiagramPlanning => {
                "You plan 2-D STEM diagrams. Given the canonical problem below, propose \
                 layout constraints.\n\nProblem:\n{spec}\n\n\
                 Respond with JSON only: {\"strategy\": \"heuristic|constraint_based|\
                 symbolic_physics|hierarchical\", \"constraints\": [{\"kind\": ..., \
                 \"ids\": [...], \"value\": null}]}"
            }
            PromptId::SceneAudit => {
                "You audit rendered STEM diagrams. Scene summary:\n{scene}\n\n\
                 Problem:\n{text}\n\nList visual or semantic problems. Respond with \
                 JSON only: {\"overall_score\": 0-100, \"issues\": [{\"category\": ..., \
                 \"severity\": \"critical|major|minor|suggestion\", \"description\": ..., \
                 \"confidence\": 0-1}], \"suggestions\": [...]}"
            }
            PromptId::SemanticValidation => {
                "Check whether the diagram plan below is consistent with the problem \
                 text.\n\nProblem:\n{text}\n\nPlan:\n{plan}\n\n\
                 Respond with JSON only: {\"consistent\": true|false, \"notes\": [...]}"
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PromptId::GraphEnrichment => "graph_enrichment",
            PromptId::DiagramPlanning => "diagram_planning",
            PromptId::SceneAudit => "scene_audit",
            PromptId::SemanticValidation => "semantic_validation",
        }
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accounting record for one structured call, attempts included. The
/// pipeline copies these into the phase trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallStats {
    pub provider: String,
    pub model: String,
    pub prompt_id: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub cost_usd: f64,
    pub latency_ms: u64,
    pub attempts: u32,
    pub succeeded: bool,
}

impl LlmCallStats {
    pub fn summary(&self) -> String {
        format!(
            "llm call {} provider={} model={} tokens={}+{} cost=${:.6} latency={}ms attempts={} ok={}",
            self.prompt_id,
            self.provider,
            self.model,
            self.prompt_tokens,
            self.completion_tokens,
            self.cost_usd,
            self.latency_ms,
            self.attempts,
            self.succeeded,
        )
    }
}

/// Schema-validated call layer over any provider. Renders a template,
/// requests JSON, validates the response against the expected type and
/// retries with exponential backoff on schema or transport failures.
/// Persistent failure yields `None`; callers fall back to deterministic
/// heuristics.
pub struct StructuredLlm {
    provider: Arc<dyn LlmProvider>,
    max_retries: u32,
    backoff_base: Duration,
}

impl StructuredLlm {
    pub fn new(provider: Arc<dyn LlmProvider>, max_retries: u32) -> Self {
        Self {
            provider,
            max_retries,
            backoff_base: Duration::from_millis(500),
        }
    }

    /// Shrink the backoff for tests.
    pub fn with_backoff(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        prompt_id: PromptId,
        vars: &BTreeMap<String, String>,
    ) -> (Option<T>, LlmCallStats) {
        let prompt = render(prompt_id.template(), vars);
        let mut config = GenerationConfig::default();
        config.json_mode = self.provider.characteristics().supports_json;

        let started = Instant::now();
        let mut stats = LlmCallStats {
            provider: self.provider.provider_name().to_string(),
            model: self.provider.model_name().to_string(),
            prompt_id: prompt_id.as_str().to_string(),
            prompt_tokens: 0,
            completion_tokens: 0,
            cost_usd: 0.0,
            latency_ms: 0,
            attempts: 0,
            succeeded: false,
        };

        let messages = vec![Message::user(&prompt)];
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.backoff_base * 2u32.pow(attempt - 1)).await;
            }
            stats.attempts = attempt + 1;

            match self.provider.generate_chat(&messages, &config).await {
                Ok(response) => {
                    let prompt_tokens = response.prompt_tokens.unwrap_or(0);
                    let completion_tokens = response.completion_tokens.unwrap_or(0);
                    stats.prompt_tokens += prompt_tokens;
                    stats.completion_tokens += completion_tokens;
                    stats.cost_usd += self
                        .provider
                        .estimate_cost(prompt_tokens, completion_tokens);

                    match parse_json_payload::<T>(&response.content) {
                        Ok(value) => {
                            stats.succeeded = true;
                            stats.latency_ms = started.elapsed().as_millis() as u64;
                            return (Some(value), stats);
                        }
                        Err(e) => {
                            tracing::warn!(
                                prompt = %prompt_id,
                                attempt,
                                "LLM response failed schema validation: {}",
                                e
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(prompt = %prompt_id, attempt, "LLM transport error: {}", e);
                }
            }
        }

        stats.latency_ms = started.elapsed().as_millis() as u64;
        (None, stats)
    }
}

fn render(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{}}}", key), value);
    }
    out
}

/// Pull the JSON object out of a model response that may wrap it in prose
/// or code fences, then deserialize it.
fn parse_json_payload<T: DeserializeOwned>(content: &str) -> Result<T, String> {
    let trimmed = content.trim();
    let candidate = if trimmed.starts_with('{') && trimmed.ends_with('}') {
        trimmed.to_string()
    } else {
        let start = trimmed.find('{').ok_or("no JSON object in response")?;
        let end = trimmed.rfind('}').ok_or("no closing brace in response")?;
        if end <= start {
            return Err("malformed JSON braces".to_string());
        }
        trimmed[start..=end].to_string()
    };
    serde_json::from_str(&candidate).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;
    use crate::schemas::EnrichmentResponse;

    fn vars() -> BTreeMap<String, String> {
        let mut v = BTreeMap::new();
        v.insert("text".to_string(), "a block on an incline".to_string());
        v.insert("entities".to_string(), "block, incline".to_string());
        v
    }

    #[tokio::test]
    async fn valid_json_parses_first_try() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            r#"{"nodes": [{"id": "gravity", "label": "gravity", "kind": "concept"}], "edges": []}"#
                .to_string(),
        ]));
        let llm = StructuredLlm::new(provider, 3);
        let (parsed, stats) = llm
            .call::<EnrichmentResponse>(PromptId::GraphEnrichment, &vars())
            .await;
        assert_eq!(parsed.unwrap().nodes.len(), 1);
        assert!(stats.succeeded);
        assert_eq!(stats.attempts, 1);
    }

    #[tokio::test]
    async fn code_fenced_json_still_parses() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            "Here you go:\n```json\n{\"nodes\": [], \"edges\": []}\n```".to_string(),
        ]));
        let llm = StructuredLlm::new(provider, 0);
        let (parsed, _) = llm
            .call::<EnrichmentResponse>(PromptId::GraphEnrichment, &vars())
            .await;
        assert!(parsed.is_some());
    }

    #[tokio::test]
    async fn schema_failure_retries_then_gives_up() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            "not json at all".to_string(),
            "still not json".to_string(),
        ]));
        let llm = StructuredLlm::new(provider, 1).with_backoff(Duration::from_millis(1));
        let (parsed, stats) = llm
            .call::<EnrichmentResponse>(PromptId::GraphEnrichment, &vars())
            .await;
        assert!(parsed.is_none());
        assert!(!stats.succeeded);
        assert_eq!(stats.attempts, 2);
    }

    #[tokio::test]
    async fn schema_failure_recovers_on_retry() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            "garbage".to_string(),
            r#"{"nodes": [], "edges": []}"#.to_string(),
        ]));
        let llm = StructuredLlm::new(provider, 2).with_backoff(Duration::from_millis(1));
        let (parsed, stats) = llm
            .call::<EnrichmentResponse>(PromptId::GraphEnrichment, &vars())
            .await;
        assert!(parsed.is_some());
        assert_eq!(stats.attempts, 2);
    }
}
