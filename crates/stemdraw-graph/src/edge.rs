use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use stemdraw_core::{RelationKind, ToolId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub relation: String,
    pub kind: RelationKind,
    pub weight: f32,
    pub provenance: BTreeSet<ToolId>,
}

impl GraphEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation: impl Into<String>,
        kind: RelationKind,
        weight: f32,
        tool: ToolId,
    ) -> Self {
        let mut provenance = BTreeSet::new();
        provenance.insert(tool);
        Self {
            source: source.into(),
            target: target.into(),
            relation: relation.into(),
            kind,
            weight: weight.clamp(0.0, 1.0),
            provenance,
        }
    }

    /// Dedup key: duplicate (source, relation, target) tuples collapse.
    pub fn key(&self) -> (String, String, String) {
        (
            self.source.clone(),
            self.relation.clone(),
            self.target.clone(),
        )
    }
}
