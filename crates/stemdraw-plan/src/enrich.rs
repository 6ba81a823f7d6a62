use std::collections::BTreeMap;
use stemdraw_ai::schemas::EnrichmentResponse;
use stemdraw_ai::{LlmCallStats, PromptId, StructuredLlm};
use stemdraw_core::{NodeKind, RelationKind, ToolId};
use stemdraw_graph::{GraphEdge, GraphNode, PropertyGraph};
use stemdraw_nlp::text::slug;
use stemdraw_nlp::vocab;

#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub added_nodes: usize,
    pub added_edges: usize,
    pub used_llm: bool,
    pub stats: Option<LlmCallStats>,
}

/// Optional graph-enrichment phase. With an LLM configured the model
/// proposes missing nodes and edges; on any failure (or with no LLM) the
/// deterministic heuristic fallback runs instead, so the phase always
/// completes. LLM-proposed facts merge with top tool priority so they can
/// refine kinds the extractors guessed.
pub async fn enrich_graph(
    graph: &mut PropertyGraph,
    text: &str,
    llm: Option<&StructuredLlm>,
) -> EnrichmentOutcome {
    if let Some(llm) = llm {
        let mut vars = BTreeMap::new();
        vars.insert("text".to_string(), text.to_string());
        vars.insert(
            "entities".to_string(),
            graph
                .nodes()
                .map(|n| n.label.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        let (response, stats) = llm
            .call::<EnrichmentResponse>(PromptId::GraphEnrichment, &vars)
            .await;
        if let Some(response) = response {
            let outcome = apply_llm_enrichment(graph, response);
            return EnrichmentOutcome {
                added_nodes: outcome.0,
                added_edges: outcome.1,
                used_llm: true,
                stats: Some(stats),
            };
        }
        tracing::warn!("LLM enrichment failed, falling back to heuristic enrichment");
        let (nodes, edges) = heuristic_enrich(graph, text);
        return EnrichmentOutcome {
            added_nodes: nodes,
            added_edges: edges,
            used_llm: false,
            stats: Some(stats),
        };
    }

    let (nodes, edges) = heuristic_enrich(graph, text);
    EnrichmentOutcome {
        added_nodes: nodes,
        added_edges: edges,
        used_llm: false,
        stats: None,
    }
}

fn apply_llm_enrichment(graph: &mut PropertyGraph, response: EnrichmentResponse) -> (usize, usize) {
    let before_nodes = graph.node_count();
    let before_edges = graph.edge_count();

    for node in response.nodes {
        let id = slug(&node.id);
        if id.is_empty() {
            continue;
        }
        let kind = match node.kind.as_str() {
            "object" => NodeKind::Object,
            "quantity" => NodeKind::Quantity,
            "material" => NodeKind::Material,
            "agent" => NodeKind::Agent,
            "event" => NodeKind::Event,
            _ => NodeKind::Concept,
        };
        graph.add_node(GraphNode::new(id, node.label, kind, ToolId::Semantic));
    }

    for edge in response.edges {
        let source = slug(&edge.source);
        let target = slug(&edge.target);
        if graph.node(&source).is_none() || graph.node(&target).is_none() {
            continue;
        }
        let _ = graph.add_edge(GraphEdge::new(
            source,
            target,
            edge.relation,
            RelationKind::Semantic,
            0.7,
            ToolId::Semantic,
        ));
    }

    (
        graph.node_count() - before_nodes,
        graph.edge_count() - before_edges,
    )
}

/// Deterministic enrichment: add the implicit context objects a diagram
/// of each domain needs when the text implies but never names them.
fn heuristic_enrich(graph: &mut PropertyGraph, text: &str) -> (usize, usize) {
    let before_nodes = graph.node_count();
    let before_edges = graph.edge_count();
    let lower = text.to_lowercase();

    let mentions_electric = ["voltage", "potential difference", "capacit", "resist", "circuit"]
        .iter()
        .any(|t| lower.contains(t));
    if mentions_electric && graph.node("circuit").is_none() {
        graph.add_node(GraphNode::new(
            "circuit",
            "circuit",
            NodeKind::Concept,
            ToolId::Semantic,
        ));
    }

    let mentions_support = ["incline", "sits on", "rests on", "hangs", "block"]
        .iter()
        .any(|t| lower.contains(t));
    if mentions_support && graph.node("gravity").is_none() {
        graph.add_node(GraphNode::new(
            "gravity",
            "gravity",
            NodeKind::Concept,
            ToolId::Semantic,
        ));
        // gravity acts on every supported body we know about
        let targets: Vec<String> = graph
            .nodes()
            .filter(|n| n.kind == NodeKind::Object && vocab::is_indicator(&n.label))
            .filter(|n| {
                let l = n.label.to_lowercase();
                l.contains("block") || l.contains("mass") || l.contains("body")
            })
            .map(|n| n.id.clone())
            .collect();
        for target in targets {
            let _ = graph.add_edge(GraphEdge::new(
                "gravity",
                target,
                "acts_on",
                RelationKind::ActsOn,
                0.9,
                ToolId::Semantic,
            ));
        }
    }

    (
        graph.node_count() - before_nodes,
        graph.edge_count() - before_edges,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stemdraw_ai::MockProvider;

    #[tokio::test]
    async fn heuristic_adds_gravity_for_mechanics() {
        let mut graph = PropertyGraph::new();
        graph.add_node(GraphNode::new(
            "block",
            "block",
            NodeKind::Object,
            ToolId::ScientificNer,
        ));
        let outcome = enrich_graph(&mut graph, "A block sits on an incline.", None).await;
        assert!(!outcome.used_llm);
        assert!(graph.node("gravity").is_some());
        assert!(outcome.added_nodes >= 1);
        assert!(outcome.added_edges >= 1);
    }

    #[tokio::test]
    async fn llm_enrichment_merges_valid_response() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            r#"{"nodes": [{"id": "normal force", "label": "normal force", "kind": "object"}],
                "edges": [{"source": "normal_force", "target": "block", "relation": "acts_on"}]}"#
                .to_string(),
        ]));
        let llm = StructuredLlm::new(provider, 0);
        let mut graph = PropertyGraph::new();
        graph.add_node(GraphNode::new(
            "block",
            "block",
            NodeKind::Object,
            ToolId::ScientificNer,
        ));
        let outcome = enrich_graph(&mut graph, "a block", Some(&llm)).await;
        assert!(outcome.used_llm);
        assert!(graph.node("normal_force").is_some());
        assert_eq!(outcome.added_edges, 1);
    }

    #[tokio::test]
    async fn llm_failure_falls_back_to_heuristic() {
        let provider = Arc::new(MockProvider::with_responses(vec![
            "no json here".to_string(),
        ]));
        let llm = StructuredLlm::new(provider, 0)
            .with_backoff(std::time::Duration::from_millis(1));
        let mut graph = PropertyGraph::new();
        let outcome = enrich_graph(&mut graph, "a 12V circuit", Some(&llm)).await;
        assert!(!outcome.used_llm);
        assert!(graph.node("circuit").is_some());
    }
}
