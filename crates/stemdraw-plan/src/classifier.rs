use std::collections::BTreeMap;
use stemdraw_core::{
    AttrValue, CanonicalSpec, Constraint, ConstraintKind, Domain, NodeKind, SpecObject,
    SpecRelationship, Strategy,
};
use stemdraw_graph::PropertyGraph;
use stemdraw_nlp::vocab;

#[derive(Debug, Clone)]
pub struct Classification {
    pub domain: Domain,
    pub confidence: f64,
}

/// Keyword + node-kind histogram over the domain vocabulary. Graph labels
/// and raw text both vote; the domain with the most votes wins, ties
/// broken by longest matched term. Below the confidence floor the result
/// is `Other`.
pub fn classify(graph: &PropertyGraph, text: &str, confidence_floor: f64) -> Classification {
    let mut votes: BTreeMap<Domain, f64> = BTreeMap::new();
    let mut longest_match: BTreeMap<Domain, usize> = BTreeMap::new();

    let mut tally = |label: &str, weight: f64| {
        let lower = label.to_lowercase();
        for (term, domain) in vocab::PHYSICAL_INDICATORS {
            if lower.contains(term) {
                *votes.entry(*domain).or_insert(0.0) += weight;
                let best = longest_match.entry(*domain).or_insert(0);
                *best = (*best).max(term.len());
            }
        }
    };

    for node in graph.nodes() {
        tally(&node.label, 1.0);
    }
    tally(text, 1.0);

    let total: f64 = votes.values().sum();
    if total == 0.0 {
        return Classification {
            domain: Domain::Other,
            confidence: 0.0,
        };
    }

    let (&domain, &score) = votes
        .iter()
        .max_by(|(da, a), (db, b)| {
            a.partial_cmp(b)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| longest_match.get(da).cmp(&longest_match.get(db)))
        })
        .expect("non-empty votes");

    let confidence = score / total;
    Classification {
        domain: if confidence < confidence_floor {
            Domain::Other
        } else {
            domain
        },
        confidence,
    }
}

/// Build the canonical problem spec from the enriched graph.
///
/// Filtering drops what never becomes a drawable object: bare
/// measurements with no attached object, standalone spatial descriptors,
/// connective scraps, and naked symbols with no value or context. A node
/// naming a physical-indicator term always survives.
pub fn canonicalize(graph: &PropertyGraph, domain: Domain, text: &str) -> CanonicalSpec {
    let mut objects: Vec<SpecObject> = Vec::new();

    for node in graph.nodes() {
        if !keep_node(graph, node) {
            continue;
        }
        let object_type = object_type_for(node);
        let mut properties = node.attributes.clone();
        properties.insert("label".to_string(), AttrValue::Str(node.label.clone()));
        objects.push(SpecObject {
            id: node.id.clone(),
            object_type,
            properties,
        });
    }
    objects.sort_by(|a, b| a.id.cmp(&b.id));

    let ids: Vec<&str> = objects.iter().map(|o| o.id.as_str()).collect();
    let mut relationships: Vec<SpecRelationship> = Vec::new();
    for edge in graph.edges() {
        if !ids.contains(&edge.source.as_str()) || !ids.contains(&edge.target.as_str()) {
            continue;
        }
        relationships.push(SpecRelationship {
            subject: edge.source.clone(),
            relation: edge.relation.clone(),
            target: edge.target.clone(),
            properties: BTreeMap::new(),
        });
    }

    let constraints = spatial_constraints(&relationships, &objects);
    let complexity_score = complexity(
        objects.len(),
        relationships.len(),
        constraints.len(),
        domain,
    );

    CanonicalSpec {
        domain,
        problem_type: problem_type(domain, &objects),
        objects,
        relationships,
        constraints,
        complexity_score,
        raw_text: Some(text.to_string()),
    }
}

fn keep_node(graph: &PropertyGraph, node: &stemdraw_graph::GraphNode) -> bool {
    // physical indicators always survive
    if vocab::is_indicator(&node.label) {
        return true;
    }
    // standalone spatial descriptors and connective scraps never do
    if vocab::is_discard_fragment(&node.label) {
        return false;
    }
    let degree = graph.degree(&node.id);
    match &node.kind {
        // a bare measurement ("12 mm") with nothing attached is dropped;
        // quantities with an expression or an edge stay
        NodeKind::Quantity => {
            let is_symbol = node
                .attributes
                .get("symbol")
                .and_then(|v| match v {
                    AttrValue::Bool(b) => Some(*b),
                    _ => None,
                })
                .unwrap_or(false);
            let has_expression = node.attributes.contains_key("expression");
            if is_symbol {
                // naked symbol without context
                has_expression || degree > 0
            } else {
                has_expression
                    || (degree > 0 && !node.label.chars().next().is_some_and(|c| c.is_ascii_digit()))
            }
        }
        NodeKind::Object | NodeKind::Material | NodeKind::Agent => true,
        NodeKind::Event => true,
        NodeKind::Concept | NodeKind::Other(_) => degree >= 2,
    }
}

fn object_type_for(node: &stemdraw_graph::GraphNode) -> String {
    if let Some(domain_term) = vocab::PHYSICAL_INDICATORS
        .iter()
        .filter(|(term, _)| node.label.to_lowercase().contains(term))
        .max_by_key(|(term, _)| term.len())
        .map(|(term, _)| *term)
    {
        return domain_term.replace(' ', "_");
    }
    // symbol-derived components: C1 → capacitor, R2 → resistor, κ1 → dielectric
    if let Some(first) = node.label.chars().next() {
        if node.attributes.contains_key("expression") || node.attributes.contains_key("symbol") {
            let mapped = match first {
                'C' => Some("capacitor"),
                'R' => Some("resistor"),
                'L' => Some("inductor"),
                'V' | 'U' => Some("source"),
                'κ' => Some("dielectric"),
                'F' => Some("force"),
                _ => None,
            };
            if let Some(t) = mapped {
                return t.to_string();
            }
        }
    }
    match node.kind {
        NodeKind::Material => "material".to_string(),
        NodeKind::Quantity => "quantity".to_string(),
        NodeKind::Event => "event".to_string(),
        _ => "object".to_string(),
    }
}

/// Explicitly stated spatial facts become spec-level constraints; the
/// planner adds domain-implied ones later.
fn spatial_constraints(
    relationships: &[SpecRelationship],
    objects: &[SpecObject],
) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    let exists = |id: &str| objects.iter().any(|o| o.id == id);

    // between_first/between_second pairs reassemble into Between
    let mut between: BTreeMap<&str, (Option<&str>, Option<&str>)> = BTreeMap::new();
    for rel in relationships {
        match rel.relation.as_str() {
            "rests_on" => {
                constraints.push(Constraint::critical(ConstraintKind::Above {
                    a: rel.subject.clone(),
                    b: rel.target.clone(),
                    min_gap: 0.0,
                }));
                constraints.push(Constraint::high(ConstraintKind::Adjacent {
                    a: rel.subject.clone(),
                    b: rel.target.clone(),
                }));
            }
            "between_first" => {
                between.entry(&rel.subject).or_default().0 = Some(&rel.target);
            }
            "between_second" => {
                between.entry(&rel.subject).or_default().1 = Some(&rel.target);
            }
            _ => {}
        }
    }
    for (inner, (first, second)) in between {
        if let (Some(first), Some(second)) = (first, second) {
            if exists(inner) && exists(first) && exists(second) {
                constraints.push(Constraint::critical(ConstraintKind::Between {
                    inner: inner.to_string(),
                    first: first.to_string(),
                    second: second.to_string(),
                }));
            }
        }
    }

    constraints.retain(|c| c.object_ids().iter().all(|id| exists(id)));
    constraints
}

/// Monotone in every count and in the domain difficulty weight, clamped
/// to [0, 1].
pub fn complexity(objects: usize, relationships: usize, constraints: usize, domain: Domain) -> f64 {
    let raw = 0.08 * objects as f64 + 0.05 * relationships as f64 + 0.09 * constraints as f64;
    (raw * (0.5 + 0.5 * domain.difficulty_weight())).min(1.0)
}

/// Strategy routing. Constraint presence dominates: any explicit
/// constraint forces at least `ConstraintBased`, whatever the score says.
pub fn choose_strategy(spec: &CanonicalSpec) -> Strategy {
    let by_score = if spec.complexity_score < 0.3 {
        Strategy::Heuristic
    } else if spec.complexity_score <= 0.6 {
        Strategy::ConstraintBased
    } else if matches!(
        spec.domain,
        Domain::Mechanics | Domain::Optics | Domain::Electronics
    ) {
        Strategy::SymbolicPhysics
    } else {
        Strategy::Hierarchical
    };

    if !spec.constraints.is_empty() && by_score == Strategy::Heuristic {
        Strategy::ConstraintBased
    } else {
        by_score
    }
}

fn problem_type(domain: Domain, objects: &[SpecObject]) -> String {
    let has = |t: &str| objects.iter().any(|o| o.object_type == t);
    match domain {
        Domain::Electronics if has("capacitor") && has("plate") => {
            "parallel_plate_capacitor".to_string()
        }
        Domain::Electronics if has("capacitor") => "capacitor_network".to_string(),
        Domain::Electronics => "circuit".to_string(),
        Domain::Mechanics if has("incline") || has("inclined_plane") => {
            "incline_statics".to_string()
        }
        Domain::Mechanics if has("spring") => "spring_system".to_string(),
        Domain::Mechanics => "statics".to_string(),
        Domain::Optics => "ray_diagram".to_string(),
        Domain::Chemistry => "reaction".to_string(),
        Domain::Thermodynamics => "thermal_system".to_string(),
        Domain::Geometry => "figure".to_string(),
        Domain::Biology => "cell_diagram".to_string(),
        Domain::Other => "general".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{Priority, RelationKind, ToolId};
    use stemdraw_graph::{GraphEdge, GraphNode};

    fn graph_with(labels: &[(&str, NodeKind)]) -> PropertyGraph {
        let mut graph = PropertyGraph::new();
        for (label, kind) in labels {
            graph.add_node(GraphNode::new(
                *label,
                *label,
                kind.clone(),
                ToolId::ScientificNer,
            ));
        }
        graph
    }

    #[test]
    fn classifies_circuit_text() {
        let graph = graph_with(&[
            ("battery", NodeKind::Object),
            ("resistor", NodeKind::Object),
            ("switch", NodeKind::Object),
        ]);
        let result = classify(&graph, "a 12V battery with a resistor and switch", 0.3);
        assert_eq!(result.domain, Domain::Electronics);
        assert!(result.confidence > 0.5);
    }

    #[test]
    fn empty_graph_and_text_classify_as_other() {
        let graph = PropertyGraph::new();
        let result = classify(&graph, "hello world", 0.3);
        assert_eq!(result.domain, Domain::Other);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn canonicalize_drops_descriptor_garbage() {
        let graph = graph_with(&[
            ("capacitor", NodeKind::Object),
            ("left half", NodeKind::Concept),
            ("filled with", NodeKind::Concept),
            ("12 mm", NodeKind::Quantity),
        ]);
        let spec = canonicalize(&graph, Domain::Electronics, "test");
        let ids: Vec<&str> = spec.objects.iter().map(|o| o.id.as_str()).collect();
        assert!(ids.contains(&"capacitor"));
        assert!(!ids.contains(&"left half"));
        assert!(!ids.contains(&"filled with"));
        assert!(!ids.contains(&"12 mm"));
    }

    #[test]
    fn naked_symbols_dropped_but_valued_symbols_kept() {
        let mut graph = PropertyGraph::new();
        graph.add_node(
            GraphNode::new("κ₃", "κ₃", NodeKind::Quantity, ToolId::ScientificNer)
                .with_attribute("symbol", AttrValue::Bool(true)),
        );
        graph.add_node(
            GraphNode::new("c1", "C1", NodeKind::Quantity, ToolId::MathExpr)
                .with_attribute("symbol", AttrValue::Bool(true))
                .with_attribute("expression", AttrValue::Str("2.00 µF".into())),
        );
        let spec = canonicalize(&graph, Domain::Electronics, "test");
        let ids: Vec<&str> = spec.objects.iter().map(|o| o.id.as_str()).collect();
        assert!(!ids.contains(&"κ₃"));
        assert!(ids.contains(&"c1"));
        assert_eq!(spec.object("c1").unwrap().object_type, "capacitor");
    }

    #[test]
    fn rests_on_becomes_above_constraint() {
        let mut graph = graph_with(&[
            ("block", NodeKind::Object),
            ("incline", NodeKind::Object),
        ]);
        graph
            .add_edge(GraphEdge::new(
                "block",
                "incline",
                "rests_on",
                RelationKind::ActsOn,
                0.8,
                ToolId::RuleTriples,
            ))
            .unwrap();
        let spec = canonicalize(&graph, Domain::Mechanics, "a block on an incline");
        assert!(spec.constraints.iter().any(|c| matches!(
            &c.kind,
            ConstraintKind::Above { a, b, .. } if a == "block" && b == "incline"
        )));
    }

    #[test]
    fn complexity_is_monotone() {
        let small = complexity(2, 1, 0, Domain::Geometry);
        let bigger = complexity(5, 4, 3, Domain::Geometry);
        let harder_domain = complexity(5, 4, 3, Domain::Electronics);
        assert!(small < bigger);
        assert!(bigger < harder_domain);
        assert!(harder_domain <= 1.0);
    }

    #[test]
    fn constraints_force_constraint_based_strategy() {
        let spec = CanonicalSpec {
            domain: Domain::Electronics,
            problem_type: "circuit".to_string(),
            objects: vec![SpecObject {
                id: "a".to_string(),
                object_type: "resistor".to_string(),
                properties: BTreeMap::new(),
            }],
            relationships: vec![],
            constraints: vec![Constraint::new(
                ConstraintKind::Adjacent {
                    a: "a".to_string(),
                    b: "a".to_string(),
                },
                Priority::High,
            )],
            complexity_score: 0.1,
            raw_text: None,
        };
        assert_eq!(choose_strategy(&spec), Strategy::ConstraintBased);
    }

    #[test]
    fn low_score_without_constraints_stays_heuristic() {
        let spec = CanonicalSpec {
            domain: Domain::Geometry,
            problem_type: "figure".to_string(),
            objects: vec![],
            relationships: vec![],
            constraints: vec![],
            complexity_score: 0.1,
            raw_text: None,
        };
        assert_eq!(choose_strategy(&spec), Strategy::Heuristic);
    }
}
