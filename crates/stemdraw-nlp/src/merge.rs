use crate::embed::DOCUMENT_TARGET;
use crate::text::slug;
use crate::vocab;
use std::collections::BTreeMap;
use stemdraw_core::{
    AttrValue, ExtractedItem, ExtractorResult, ExtractorStatus, NodeKind, RelationKind, ToolId,
};
use stemdraw_graph::{GraphEdge, GraphNode, PropertyGraph};

/// Fuse all extractor results into one property graph.
///
/// Tools are visited in fixed `ToolId` order so identical inputs always
/// produce identical graphs regardless of task completion order. Every
/// item is merged; deduplication is the graph's job, nothing is
/// truncated here. Embeddings are attached in a final pass once all
/// nodes exist.
pub fn merge_results(results: &BTreeMap<ToolId, ExtractorResult>) -> PropertyGraph {
    let mut graph = PropertyGraph::new();
    let mut embeddings: Vec<(String, Vec<f32>)> = Vec::new();

    for (tool, result) in results {
        if result.status != ExtractorStatus::Success {
            continue;
        }
        for item in &result.items {
            merge_item(&mut graph, *tool, item, &mut embeddings);
        }
    }

    for (target, vector) in embeddings {
        graph.set_embedding(&target, vector);
    }

    graph
}

fn merge_item(
    graph: &mut PropertyGraph,
    tool: ToolId,
    item: &ExtractedItem,
    embeddings: &mut Vec<(String, Vec<f32>)>,
) {
    match item {
        ExtractedItem::Triple {
            subject,
            predicate,
            object,
        } => {
            let source = ensure_node(graph, tool, subject);
            let target = ensure_node(graph, tool, object);
            let kind = triple_relation_kind(predicate);
            let _ = graph.add_edge(GraphEdge::new(source, target, predicate, kind, 0.6, tool));
        }
        ExtractedItem::DepEdge {
            head,
            dependent,
            relation,
        } => {
            let source = ensure_node(graph, tool, head);
            let target = ensure_node(graph, tool, dependent);
            let _ = graph.add_edge(GraphEdge::new(
                source,
                target,
                relation,
                RelationKind::Grammatical,
                0.4,
                tool,
            ));
        }
        ExtractedItem::Entity {
            text,
            label,
            value,
            unit,
        } => {
            let id = slug(text);
            if id.is_empty() {
                return;
            }
            let kind = match label.as_str() {
                "QUANTITY" | "SYMBOL" => NodeKind::Quantity,
                "COMPONENT" | "OBJECT" => NodeKind::Object,
                _ => classify_label(text),
            };
            let mut node = GraphNode::new(id, text.clone(), kind, tool);
            if let Some(v) = value {
                node = node.with_attribute("value", AttrValue::Num(*v));
            }
            if let Some(u) = unit {
                node = node.with_attribute("unit", AttrValue::Str(u.clone()));
            }
            if label == "SYMBOL" {
                node = node.with_attribute("symbol", AttrValue::Bool(true));
            }
            graph.add_node(node);
        }
        ExtractedItem::Embedding { target, vector } => {
            if target != DOCUMENT_TARGET {
                embeddings.push((slug(target), vector.clone()));
            }
        }
        ExtractedItem::Formula { raw, elements } => {
            let id = slug(raw);
            if id.is_empty() {
                return;
            }
            let element_list: Vec<String> = elements
                .iter()
                .map(|(symbol, count)| format!("{}:{}", symbol, count))
                .collect();
            graph.add_node(
                GraphNode::new(id, raw.clone(), NodeKind::Material, tool)
                    .with_attribute("formula", AttrValue::Str(raw.clone()))
                    .with_attribute("elements", AttrValue::List(element_list)),
            );
        }
        ExtractedItem::Equation { raw, lhs, rhs } => {
            if raw.contains("->") || raw.contains('→') {
                // reaction: an event node carrying both sides
                let id = format!("reaction_{}", slug(lhs));
                graph.add_node(
                    GraphNode::new(id, raw.clone(), NodeKind::Event, tool)
                        .with_attribute("lhs", AttrValue::Str(lhs.clone()))
                        .with_attribute("rhs", AttrValue::Str(rhs.clone())),
                );
            } else {
                let id = slug(lhs);
                if id.is_empty() {
                    return;
                }
                graph.add_node(
                    GraphNode::new(id, lhs.clone(), NodeKind::Quantity, tool)
                        .with_attribute("expression", AttrValue::Str(rhs.clone()))
                        .with_attribute("equation", AttrValue::Str(raw.clone())),
                );
            }
        }
        ExtractedItem::Frame { predicate, roles } => {
            let agent = roles.iter().find(|(r, _)| r == "agent").map(|(_, v)| v);
            let patient = roles.iter().find(|(r, _)| r == "patient").map(|(_, v)| v);
            if let (Some(agent), Some(patient)) = (agent, patient) {
                let source = ensure_node(graph, tool, agent);
                let target = ensure_node(graph, tool, patient);
                let kind = if predicate == "acts_on" {
                    RelationKind::ActsOn
                } else {
                    RelationKind::Semantic
                };
                let _ = graph.add_edge(GraphEdge::new(source, target, predicate, kind, 0.8, tool));
            }
        }
    }
}

/// Insert a node for a surface form if missing; returns its id.
fn ensure_node(graph: &mut PropertyGraph, tool: ToolId, label: &str) -> String {
    let id = slug(label);
    if !id.is_empty() && graph.node(&id).is_none() {
        graph.add_node(GraphNode::new(
            id.clone(),
            label.to_string(),
            classify_label(label),
            tool,
        ));
    }
    id
}

fn triple_relation_kind(predicate: &str) -> RelationKind {
    match predicate {
        "connected_to" | "connected_in_series" | "connected_in_parallel" | "applied_to"
        | "attached_to" => RelationKind::Scientific,
        "rests_on" => RelationKind::ActsOn,
        "filled_with" | "contains" | "consists_of" => RelationKind::PartOf,
        p if p.starts_with("between") => RelationKind::Other("spatial".to_string()),
        _ => RelationKind::Grammatical,
    }
}

fn classify_label(label: &str) -> NodeKind {
    if vocab::is_indicator(label) {
        NodeKind::Object
    } else if label.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        NodeKind::Quantity
    } else {
        NodeKind::Concept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::ExtractorResult;

    fn results_from(tool: ToolId, items: Vec<ExtractedItem>) -> BTreeMap<ToolId, ExtractorResult> {
        let mut map = BTreeMap::new();
        map.insert(tool, ExtractorResult::ok(tool, items));
        map
    }

    #[test]
    fn triples_become_nodes_and_edges() {
        let results = results_from(
            ToolId::RuleTriples,
            vec![ExtractedItem::Triple {
                subject: "block".to_string(),
                predicate: "rests_on".to_string(),
                object: "incline".to_string(),
            }],
        );
        let graph = merge_results(&results);
        assert!(graph.node("block").is_some());
        assert!(graph.node("incline").is_some());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn failed_results_contribute_nothing() {
        let mut results = results_from(
            ToolId::RuleTriples,
            vec![ExtractedItem::Triple {
                subject: "a".to_string(),
                predicate: "contains".to_string(),
                object: "b".to_string(),
            }],
        );
        results.insert(
            ToolId::ScientificNer,
            ExtractorResult::failed(ToolId::ScientificNer, "model crashed"),
        );
        let graph = merge_results(&results);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn quantities_carry_value_and_unit() {
        let results = results_from(
            ToolId::ScientificNer,
            vec![ExtractedItem::Entity {
                text: "300 V".to_string(),
                label: "QUANTITY".to_string(),
                value: Some(300.0),
                unit: Some("V".to_string()),
            }],
        );
        let graph = merge_results(&results);
        let node = graph.node("300_v").unwrap();
        assert_eq!(node.kind, NodeKind::Quantity);
        assert_eq!(node.attributes.get("value"), Some(&AttrValue::Num(300.0)));
    }

    #[test]
    fn embeddings_attach_after_all_nodes_exist() {
        let mut results = BTreeMap::new();
        // embedder runs "before" semantic in tool order, but its embedding
        // still lands on the node semantic creates
        results.insert(
            ToolId::Embedder,
            ExtractorResult::ok(
                ToolId::Embedder,
                vec![ExtractedItem::Embedding {
                    target: "battery".to_string(),
                    vector: vec![0.25; 8],
                }],
            ),
        );
        results.insert(
            ToolId::Semantic,
            ExtractorResult::ok(
                ToolId::Semantic,
                vec![ExtractedItem::Frame {
                    predicate: "linked".to_string(),
                    roles: vec![
                        ("agent".to_string(), "battery".to_string()),
                        ("patient".to_string(), "resistor".to_string()),
                    ],
                }],
            ),
        );
        let graph = merge_results(&results);
        assert!(graph.embedding("battery").is_some());
    }

    #[test]
    fn subset_of_tools_yields_subset_graph() {
        let full_items = vec![
            ExtractedItem::Triple {
                subject: "battery".to_string(),
                predicate: "connected_to".to_string(),
                object: "resistor".to_string(),
            },
        ];
        let mut full = results_from(ToolId::RuleTriples, full_items.clone());
        full.insert(
            ToolId::ScientificNer,
            ExtractorResult::ok(
                ToolId::ScientificNer,
                vec![ExtractedItem::Entity {
                    text: "switch".to_string(),
                    label: "COMPONENT".to_string(),
                    value: None,
                    unit: None,
                }],
            ),
        );
        let reduced = results_from(ToolId::RuleTriples, full_items);

        let full_graph = merge_results(&full);
        let reduced_graph = merge_results(&reduced);
        for node in reduced_graph.nodes() {
            assert!(full_graph.node(&node.id).is_some());
        }
        assert!(reduced_graph.node_count() < full_graph.node_count());
    }
}
