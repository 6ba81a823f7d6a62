use stemdraw_core::{CanonicalSpec, PlanEntity, VisualRelation, VisualRelationKind};

/// Stage 2: turn canonical relationships into visual relations between
/// planned entities. Grammatical scaffolding is not drawn; connection,
/// action and containment are.
pub fn map_relations(spec: &CanonicalSpec, entities: &[PlanEntity]) -> Vec<VisualRelation> {
    let exists = |id: &str| entities.iter().any(|e| e.id == id);
    let mut relations = Vec::new();

    for rel in &spec.relationships {
        if !exists(&rel.subject) || !exists(&rel.target) {
            continue;
        }
        let kind = match rel.relation.as_str() {
            "connected_to" | "connected_in_series" | "connected_in_parallel" | "attached_to"
            | "linked" | "wired" => Some(VisualRelationKind::ConnectsTo),
            "applied_to" | "acts_on" | "exerts" => Some(VisualRelationKind::ActsOn),
            "rests_on" | "supported_by" | "adjacent_to" => Some(VisualRelationKind::AdjacentTo),
            "filled_with" | "contains" | "inside" => Some(VisualRelationKind::Inside),
            _ => None,
        };
        if let Some(kind) = kind {
            relations.push(VisualRelation {
                kind,
                source: rel.subject.clone(),
                target: rel.target.clone(),
                label: Some(rel.relation.clone()),
            });
        }
    }

    // series circuits: connect the inferred source into the chain
    let has_source_relation = relations
        .iter()
        .any(|r| r.source == "power_source" || r.target == "power_source");
    if exists("power_source") && !has_source_relation {
        if let Some(first) = entities
            .iter()
            .find(|e| e.id != "power_source" && !e.inferred)
        {
            relations.push(VisualRelation {
                kind: VisualRelationKind::ConnectsTo,
                source: "power_source".to_string(),
                target: first.id.clone(),
                label: None,
            });
        }
    }

    relations
}
