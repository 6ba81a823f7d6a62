use crate::adapters::{
    ChemistryParser, DependencyParser, MathExpressionParser, RuleTripleExtractor, ScientificNer,
    SemanticRoleParser,
};
use crate::embed::EmbedderAdapter;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use stemdraw_core::{Extractor, ExtractorResult, TextEmbedder, ToolId};

/// Owns one adapter per NLP tool and runs the phase-0 fan-out.
///
/// Availability is probed exactly once, at construction; an adapter that
/// fails its probe is pinned unavailable for the life of the registry and
/// is reported as skipped on every request. Per-adapter timeouts convert
/// slow tools into failed results without blocking the join.
pub struct ExtractorRegistry {
    adapters: BTreeMap<ToolId, Arc<dyn Extractor>>,
    unavailable: BTreeMap<ToolId, String>,
    timeout: Duration,
}

impl ExtractorRegistry {
    pub fn new(extractor_timeout_ms: u64, embedder: Arc<dyn TextEmbedder>) -> Self {
        let all: Vec<Arc<dyn Extractor>> = vec![
            Arc::new(RuleTripleExtractor::new()),
            Arc::new(DependencyParser::new()),
            Arc::new(ScientificNer::new()),
            Arc::new(EmbedderAdapter::new(embedder)),
            Arc::new(ChemistryParser::new()),
            Arc::new(MathExpressionParser::new()),
            Arc::new(SemanticRoleParser::new()),
        ];

        let mut adapters = BTreeMap::new();
        let mut unavailable = BTreeMap::new();
        for adapter in all {
            let tool = adapter.tool();
            if adapter.available() {
                adapters.insert(tool, adapter);
            } else {
                tracing::warn!(tool = %tool, "extractor unavailable, pinning disabled");
                unavailable.insert(tool, "model load failed".to_string());
            }
        }

        Self {
            adapters,
            unavailable,
            timeout: Duration::from_millis(extractor_timeout_ms),
        }
    }

    /// Tool → availability, for the health endpoint.
    pub fn availability(&self) -> BTreeMap<ToolId, bool> {
        ToolId::ALL
            .iter()
            .map(|tool| (*tool, self.adapters.contains_key(tool)))
            .collect()
    }

    /// Fan out every enabled adapter concurrently and join. The returned
    /// map covers all seven tools: disabled and unavailable tools appear
    /// as skipped results so the trace can show why they did not run.
    /// Map ordering (BTreeMap over ToolId) fixes the merge order.
    pub async fn extract_all(
        &self,
        text: &str,
        enabled: &BTreeSet<ToolId>,
    ) -> BTreeMap<ToolId, ExtractorResult> {
        let mut handles = Vec::new();
        let mut results: BTreeMap<ToolId, ExtractorResult> = BTreeMap::new();

        for tool in ToolId::ALL {
            if !enabled.contains(&tool) {
                results.insert(tool, ExtractorResult::skipped(tool, "not enabled"));
                continue;
            }
            match self.adapters.get(&tool) {
                None => {
                    let reason = self
                        .unavailable
                        .get(&tool)
                        .cloned()
                        .unwrap_or_else(|| "unavailable".to_string());
                    results.insert(
                        tool,
                        ExtractorResult::skipped(tool, format!("unavailable: {}", reason)),
                    );
                }
                Some(adapter) => {
                    let adapter = Arc::clone(adapter);
                    let text = text.to_string();
                    let timeout = self.timeout;
                    handles.push((
                        tool,
                        tokio::spawn(async move {
                            tokio::time::timeout(timeout, adapter.extract(&text)).await
                        }),
                    ));
                }
            }
        }

        for (tool, handle) in handles {
            let result = match handle.await {
                Ok(Ok(result)) => result,
                Ok(Err(_elapsed)) => ExtractorResult::failed(
                    tool,
                    format!("timed out after {}ms", self.timeout.as_millis()),
                ),
                Err(join_error) => {
                    ExtractorResult::failed(tool, format!("adapter task failed: {}", join_error))
                }
            };
            results.insert(tool, result);
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::HashEmbedder;
    use stemdraw_core::ExtractorStatus;

    fn all_tools() -> BTreeSet<ToolId> {
        ToolId::ALL.iter().copied().collect()
    }

    #[tokio::test]
    async fn all_enabled_tools_report() {
        let registry = ExtractorRegistry::new(2_000, Arc::new(HashEmbedder::default()));
        let results = registry
            .extract_all("A 12V battery connected to a 100Ω resistor.", &all_tools())
            .await;
        assert_eq!(results.len(), ToolId::ALL.len());
        assert_eq!(
            results[&ToolId::ScientificNer].status,
            ExtractorStatus::Success
        );
    }

    #[tokio::test]
    async fn disabled_tool_is_skipped_with_reason() {
        let mut enabled = all_tools();
        enabled.remove(&ToolId::ScientificNer);
        let registry = ExtractorRegistry::new(2_000, Arc::new(HashEmbedder::default()));
        let results = registry.extract_all("a battery", &enabled).await;
        let ner = &results[&ToolId::ScientificNer];
        assert_eq!(ner.status, ExtractorStatus::Skipped);
        assert!(ner.errors[0].contains("not enabled"));
        assert!(ner.items.is_empty());
    }

    #[tokio::test]
    async fn disabling_a_tool_never_adds_items() {
        let registry = ExtractorRegistry::new(2_000, Arc::new(HashEmbedder::default()));
        let mut reduced_set = all_tools();
        reduced_set.remove(&ToolId::Semantic);

        let text = "The battery is connected to the resistor.";
        let full_results = registry.extract_all(text, &all_tools()).await;
        let reduced_results = registry.extract_all(text, &reduced_set).await;

        for tool in ToolId::ALL {
            let full_count = full_results[&tool].items.len();
            let reduced_count = reduced_results[&tool].items.len();
            assert!(reduced_count <= full_count);
        }
    }
}
