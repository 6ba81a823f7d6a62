use std::collections::{BTreeMap, BTreeSet, VecDeque};
use stemdraw_core::{
    CanonicalSpec, Domain, DomainRule, IssueKind, PrimitiveKind, Scene, ValidationIssue,
};

/// Kirchhoff-loop check: the wire graph must contain a cycle through the
/// declared power source. A source with fewer than two connections, or
/// whose neighbors cannot reach each other without it, leaves the
/// circuit open.
pub struct CircuitLoopRule;

impl DomainRule for CircuitLoopRule {
    fn name(&self) -> &'static str {
        "circuit_loop"
    }

    fn applies(&self, domain: Domain) -> bool {
        domain == Domain::Electronics
    }

    fn check(&self, scene: &Scene, _spec: &CanonicalSpec) -> Vec<ValidationIssue> {
        let components: Vec<&str> = scene
            .objects
            .iter()
            .filter(|o| {
                matches!(
                    o.primitive,
                    PrimitiveKind::Battery
                        | PrimitiveKind::Capacitor
                        | PrimitiveKind::Resistor
                        | PrimitiveKind::Switch
                )
            })
            .map(|o| o.id.as_str())
            .collect();
        if components.is_empty() {
            return Vec::new();
        }

        let Some(source) = scene
            .objects
            .iter()
            .find(|o| o.primitive == PrimitiveKind::Battery)
        else {
            return vec![ValidationIssue::new(
                IssueKind::OpenCircuit,
                "circuit has components but no power source",
                components.iter().map(|s| s.to_string()).collect(),
            )];
        };

        // undirected wire graph
        let mut adjacency: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for wire in &scene.objects {
            let from = wire.properties.get("from").and_then(|v| v.as_str());
            let to = wire.properties.get("to").and_then(|v| v.as_str());
            if let (Some(from), Some(to)) = (from, to) {
                adjacency.entry(from).or_default().insert(to);
                adjacency.entry(to).or_default().insert(from);
            }
        }

        let neighbors: Vec<&str> = adjacency
            .get(source.id.as_str())
            .map(|n| n.iter().copied().collect())
            .unwrap_or_default();
        if neighbors.len() < 2 {
            return vec![ValidationIssue::new(
                IssueKind::OpenCircuit,
                format!("no closed loop through power source '{}'", source.id),
                vec![source.id.clone()],
            )];
        }

        // a loop through the source exists iff two of its neighbors are
        // connected when the source itself is removed
        let mut reachable: BTreeSet<&str> = BTreeSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(neighbors[0]);
        reachable.insert(neighbors[0]);
        while let Some(current) = queue.pop_front() {
            for &next in adjacency.get(current).into_iter().flatten() {
                if next == source.id.as_str() {
                    continue;
                }
                if reachable.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        let closed = neighbors[1..].iter().any(|n| reachable.contains(n));
        if closed {
            Vec::new()
        } else {
            vec![ValidationIssue::new(
                IssueKind::OpenCircuit,
                format!("no closed loop through power source '{}'", source.id),
                vec![source.id.clone()],
            )]
        }
    }
}
