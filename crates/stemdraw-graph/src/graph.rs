use crate::{GraphEdge, GraphNode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use stemdraw_core::{DiagramError, NodeKind, Result};

/// Typed, attributed multigraph of the concepts, entities, quantities and
/// relations extracted from a problem text. Constructed empty at phase
/// start, populated by extractor merges, queried by the planner and
/// discarded when the response returns.
///
/// Cycles are legal (A acts_on B acts_on A); every traversal keeps an
/// explicit visited set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyGraph {
    nodes: BTreeMap<String, GraphNode>,
    edges: BTreeMap<(String, String, String), GraphEdge>,
    /// Opaque per-node embeddings. Kept out of node attributes so they can
    /// never leak into primitive-typed attribute exports.
    embeddings: BTreeMap<String, Vec<f32>>,
}

impl PropertyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.values()
    }

    /// Insert or merge a node by id equality.
    pub fn add_node(&mut self, node: GraphNode) {
        match self.nodes.get_mut(&node.id) {
            Some(existing) => existing.absorb(node),
            None => {
                self.nodes.insert(node.id.clone(), node);
            }
        }
    }

    /// Insert or collapse an edge. Both endpoints must already exist.
    /// Duplicate (source, relation, target) tuples merge: max weight,
    /// union provenance.
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<()> {
        if !self.nodes.contains_key(&edge.source) {
            return Err(DiagramError::Graph(format!(
                "edge references unknown source node '{}'",
                edge.source
            )));
        }
        if !self.nodes.contains_key(&edge.target) {
            return Err(DiagramError::Graph(format!(
                "edge references unknown target node '{}'",
                edge.target
            )));
        }
        match self.edges.get_mut(&edge.key()) {
            Some(existing) => {
                existing.weight = existing.weight.max(edge.weight);
                existing.provenance.extend(edge.provenance);
            }
            None => {
                self.edges.insert(edge.key(), edge);
            }
        }
        Ok(())
    }

    /// Merge another graph into this one: node merge by id, edge collapse
    /// by (source, relation, target).
    pub fn merge_graph(&mut self, other: PropertyGraph) -> Result<()> {
        for (_, node) in other.nodes {
            self.add_node(node);
        }
        for (_, edge) in other.edges {
            self.add_edge(edge)?;
        }
        for (id, embedding) in other.embeddings {
            self.embeddings.entry(id).or_insert(embedding);
        }
        Ok(())
    }

    pub fn query_by_kind(&self, kind: &NodeKind) -> Vec<&GraphNode> {
        self.nodes.values().filter(|n| &n.kind == kind).collect()
    }

    /// Outgoing neighbor ids, sorted.
    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .edges
            .values()
            .filter(|e| e.source == id)
            .map(|e| e.target.as_str())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Neighbors ignoring edge direction, sorted.
    pub fn neighbors_undirected(&self, id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .edges
            .values()
            .filter_map(|e| {
                if e.source == id {
                    Some(e.target.as_str())
                } else if e.target == id {
                    Some(e.source.as_str())
                } else {
                    None
                }
            })
            .collect();
        out.sort();
        out.dedup();
        out
    }

    pub fn edges_from(&self, id: &str) -> Vec<&GraphEdge> {
        self.edges.values().filter(|e| e.source == id).collect()
    }

    pub fn degree(&self, id: &str) -> usize {
        self.edges
            .values()
            .filter(|e| e.source == id || e.target == id)
            .count()
    }

    /// Node ids reachable from `start` ignoring direction. BFS with an
    /// explicit visited set; cycles terminate.
    pub fn connected_component(&self, start: &str) -> BTreeSet<String> {
        let mut visited = BTreeSet::new();
        if !self.nodes.contains_key(start) {
            return visited;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start.to_string());
        visited.insert(start.to_string());
        while let Some(current) = queue.pop_front() {
            for neighbor in self.neighbors_undirected(&current) {
                if visited.insert(neighbor.to_string()) {
                    queue.push_back(neighbor.to_string());
                }
            }
        }
        visited
    }

    /// Subgraph containing the nodes the predicate keeps and every edge
    /// whose endpoints both survive.
    pub fn subgraph<F: Fn(&GraphNode) -> bool>(&self, keep: F) -> PropertyGraph {
        let mut out = PropertyGraph::new();
        for node in self.nodes.values() {
            if keep(node) {
                out.nodes.insert(node.id.clone(), node.clone());
            }
        }
        for edge in self.edges.values() {
            if out.nodes.contains_key(&edge.source) && out.nodes.contains_key(&edge.target) {
                out.edges.insert(edge.key(), edge.clone());
            }
        }
        for (id, embedding) in &self.embeddings {
            if out.nodes.contains_key(id) {
                out.embeddings.insert(id.clone(), embedding.clone());
            }
        }
        out
    }

    pub fn set_embedding(&mut self, id: &str, embedding: Vec<f32>) {
        if self.nodes.contains_key(id) {
            self.embeddings.insert(id.to_string(), embedding);
        }
    }

    pub fn embedding(&self, id: &str) -> Option<&[f32]> {
        self.embeddings.get(id).map(Vec::as_slice)
    }

    /// Deterministic JSON serialization (BTreeMap key order).
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn parse(raw: &str) -> Result<PropertyGraph> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{AttrValue, RelationKind, ToolId};

    fn node(id: &str, kind: NodeKind, tool: ToolId) -> GraphNode {
        GraphNode::new(id, id, kind, tool)
    }

    #[test]
    fn duplicate_edges_collapse_with_max_weight() {
        let mut graph = PropertyGraph::new();
        graph.add_node(node("a", NodeKind::Object, ToolId::RuleTriples));
        graph.add_node(node("b", NodeKind::Object, ToolId::RuleTriples));
        graph
            .add_edge(GraphEdge::new(
                "a",
                "b",
                "connects_to",
                RelationKind::Scientific,
                0.4,
                ToolId::RuleTriples,
            ))
            .unwrap();
        graph
            .add_edge(GraphEdge::new(
                "a",
                "b",
                "connects_to",
                RelationKind::Scientific,
                0.9,
                ToolId::Semantic,
            ))
            .unwrap();

        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edges().next().unwrap();
        assert_eq!(edge.weight, 0.9);
        assert!(edge.provenance.contains(&ToolId::RuleTriples));
        assert!(edge.provenance.contains(&ToolId::Semantic));
    }

    #[test]
    fn edge_to_missing_node_is_rejected() {
        let mut graph = PropertyGraph::new();
        graph.add_node(node("a", NodeKind::Object, ToolId::RuleTriples));
        let result = graph.add_edge(GraphEdge::new(
            "a",
            "ghost",
            "uses",
            RelationKind::Other("x".into()),
            1.0,
            ToolId::RuleTriples,
        ));
        assert!(result.is_err());
    }

    #[test]
    fn kind_conflict_resolved_by_tool_priority() {
        let mut graph = PropertyGraph::new();
        graph.add_node(node("block", NodeKind::Concept, ToolId::RuleTriples));
        graph.add_node(node("block", NodeKind::Object, ToolId::ScientificNer));

        // one vote each: NER outranks the rule extractor
        assert_eq!(graph.node("block").unwrap().kind, NodeKind::Object);
    }

    #[test]
    fn dominant_kind_wins_over_priority() {
        let mut graph = PropertyGraph::new();
        graph.add_node(node("spring", NodeKind::Object, ToolId::RuleTriples));
        graph.add_node(node("spring", NodeKind::Object, ToolId::Dependency));
        graph.add_node(node("spring", NodeKind::Concept, ToolId::Semantic));

        // two votes for Object beat one higher-priority Concept vote
        assert_eq!(graph.node("spring").unwrap().kind, NodeKind::Object);
    }

    #[test]
    fn merge_is_ingestion_order_invariant() {
        let build = |order: &[ToolId]| {
            let mut graph = PropertyGraph::new();
            for &tool in order {
                let kind = if tool == ToolId::Semantic {
                    NodeKind::Concept
                } else {
                    NodeKind::Object
                };
                graph.add_node(
                    GraphNode::new("plate", "plate", kind, tool)
                        .with_attribute("mentions", AttrValue::List(vec![tool.to_string()])),
                );
            }
            graph
        };

        let forward = build(&[ToolId::RuleTriples, ToolId::ScientificNer, ToolId::Semantic]);
        let backward = build(&[ToolId::Semantic, ToolId::ScientificNer, ToolId::RuleTriples]);
        assert_eq!(
            forward.node("plate").unwrap().kind,
            backward.node("plate").unwrap().kind
        );
        assert_eq!(
            forward.node("plate").unwrap().attributes,
            backward.node("plate").unwrap().attributes
        );
    }

    #[test]
    fn scalar_attribute_conflict_respects_priority() {
        let mut graph = PropertyGraph::new();
        graph.add_node(
            GraphNode::new("r1", "resistor", NodeKind::Object, ToolId::RuleTriples)
                .with_attribute("value", AttrValue::Str("unknown".into())),
        );
        graph.add_node(
            GraphNode::new("r1", "resistor", NodeKind::Object, ToolId::ScientificNer)
                .with_attribute("value", AttrValue::Str("100 ohm".into())),
        );
        assert_eq!(
            graph.node("r1").unwrap().attributes.get("value"),
            Some(&AttrValue::Str("100 ohm".into()))
        );

        // a lower-priority tool cannot overwrite it back
        graph.add_node(
            GraphNode::new("r1", "resistor", NodeKind::Object, ToolId::RuleTriples)
                .with_attribute("value", AttrValue::Str("unknown".into())),
        );
        assert_eq!(
            graph.node("r1").unwrap().attributes.get("value"),
            Some(&AttrValue::Str("100 ohm".into()))
        );
    }

    #[test]
    fn cyclic_traversal_terminates() {
        let mut graph = PropertyGraph::new();
        graph.add_node(node("a", NodeKind::Object, ToolId::RuleTriples));
        graph.add_node(node("b", NodeKind::Object, ToolId::RuleTriples));
        for (s, t) in [("a", "b"), ("b", "a")] {
            graph
                .add_edge(GraphEdge::new(
                    s,
                    t,
                    "acts_on",
                    RelationKind::ActsOn,
                    1.0,
                    ToolId::RuleTriples,
                ))
                .unwrap();
        }
        let component = graph.connected_component("a");
        assert_eq!(component.len(), 2);
    }

    #[test]
    fn serialize_round_trip() {
        let mut graph = PropertyGraph::new();
        graph.add_node(
            node("c1", NodeKind::Object, ToolId::ScientificNer)
                .with_attribute("capacitance", AttrValue::Num(2.0)),
        );
        graph.add_node(node("v", NodeKind::Quantity, ToolId::ScientificNer));
        graph
            .add_edge(GraphEdge::new(
                "v",
                "c1",
                "value_of",
                RelationKind::ValueOf,
                1.0,
                ToolId::ScientificNer,
            ))
            .unwrap();
        graph.set_embedding("c1", vec![0.1, 0.2, 0.3]);

        let serialized = graph.serialize().unwrap();
        let parsed = PropertyGraph::parse(&serialized).unwrap();
        assert_eq!(graph, parsed);
    }

    #[test]
    fn embeddings_stay_out_of_attributes() {
        let mut graph = PropertyGraph::new();
        graph.add_node(node("c1", NodeKind::Object, ToolId::Embedder));
        graph.set_embedding("c1", vec![0.5; 8]);
        assert!(graph.node("c1").unwrap().attributes.is_empty());
        assert_eq!(graph.embedding("c1").unwrap().len(), 8);
    }
}
