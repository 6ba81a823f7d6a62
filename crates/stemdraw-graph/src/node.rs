use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use stemdraw_core::{AttrValue, NodeKind, ToolId};

/// Vote bookkeeping for the dominant-kind rule: each producing tool casts
/// one vote for the kind it observed; the dominant kind wins, ties broken
/// by the highest tool priority among the kind's proposers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindVote {
    pub kind: NodeKind,
    pub count: u32,
    pub best_priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    /// Primitive-valued attributes only. Embeddings live on the graph as
    /// opaque vectors, never in this map.
    pub attributes: BTreeMap<String, AttrValue>,
    pub provenance: BTreeSet<ToolId>,
    pub(crate) kind_votes: BTreeMap<String, KindVote>,
    /// Merge priority of the tool that set each scalar attribute; a lower
    /// priority tool never overwrites a higher one.
    pub(crate) attr_priority: BTreeMap<String, u8>,
}

fn kind_key(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Other(s) => format!("other:{}", s),
        other => format!("{:?}", other).to_lowercase(),
    }
}

impl GraphNode {
    pub fn new(id: impl Into<String>, label: impl Into<String>, kind: NodeKind, tool: ToolId) -> Self {
        let mut node = Self {
            id: id.into(),
            label: label.into(),
            kind: kind.clone(),
            attributes: BTreeMap::new(),
            provenance: BTreeSet::new(),
            kind_votes: BTreeMap::new(),
            attr_priority: BTreeMap::new(),
        };
        node.provenance.insert(tool);
        node.vote_kind(kind, tool);
        node
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        let key = key.into();
        let priority = self.provenance.iter().map(|t| t.merge_priority()).max().unwrap_or(0);
        self.attr_priority.insert(key.clone(), priority);
        self.attributes.insert(key, value.into());
        self
    }

    pub(crate) fn vote_kind(&mut self, kind: NodeKind, tool: ToolId) {
        let entry = self
            .kind_votes
            .entry(kind_key(&kind))
            .or_insert(KindVote {
                kind,
                count: 0,
                best_priority: 0,
            });
        entry.count += 1;
        entry.best_priority = entry.best_priority.max(tool.merge_priority());
        self.recompute_kind();
    }

    fn recompute_kind(&mut self) {
        // BTreeMap iteration gives a stable order, so equal (count,
        // priority) pairs resolve identically for any ingestion order.
        if let Some(winner) = self
            .kind_votes
            .values()
            .max_by(|a, b| (a.count, a.best_priority).cmp(&(b.count, b.best_priority)))
        {
            self.kind = winner.kind.clone();
        }
    }

    /// Merge another observation of the same node (same id) into this one.
    pub(crate) fn absorb(&mut self, other: GraphNode) {
        for (key, vote) in other.kind_votes {
            let entry = self.kind_votes.entry(key).or_insert(KindVote {
                kind: vote.kind.clone(),
                count: 0,
                best_priority: 0,
            });
            entry.count += vote.count;
            entry.best_priority = entry.best_priority.max(vote.best_priority);
        }
        self.recompute_kind();

        for (key, value) in other.attributes {
            let incoming_priority = other.attr_priority.get(&key).copied().unwrap_or(0);
            match self.attributes.get_mut(&key) {
                None => {
                    self.attr_priority.insert(key.clone(), incoming_priority);
                    self.attributes.insert(key, value);
                }
                Some(AttrValue::List(existing)) => {
                    if let AttrValue::List(incoming) = value {
                        for item in incoming {
                            if !existing.contains(&item) {
                                existing.push(item);
                            }
                        }
                        existing.sort();
                    }
                }
                Some(existing) => {
                    let current_priority = self.attr_priority.get(&key).copied().unwrap_or(0);
                    if incoming_priority > current_priority {
                        *existing = value;
                        self.attr_priority.insert(key, incoming_priority);
                    }
                }
            }
        }

        self.provenance.extend(other.provenance);
        if self.label.is_empty() {
            self.label = other.label;
        }
    }
}
