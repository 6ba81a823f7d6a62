mod constraints;
mod entities;
mod relations;
mod style;

use crate::classifier::choose_strategy;
use stemdraw_core::{CanonicalSpec, DiagramPlan, Strategy};

/// The five-stage diagram planner. Each stage reads only the outputs of
/// the stages before it; any stage may produce an empty output without
/// aborting the plan.
pub struct DiagramPlanner;

impl DiagramPlanner {
    pub fn new() -> Self {
        Self
    }

    pub fn plan(&self, spec: &CanonicalSpec) -> DiagramPlan {
        // stage 1: drawable entities (+ inferred implicit ones)
        let entities = entities::extract_entities(spec);

        // stage 2: graph relations worth visualizing
        let relations = relations::map_relations(spec, &entities);

        // stage 3: layout constraints from relations + domain rules
        let global_constraints = constraints::generate_constraints(spec, &entities, &relations);

        // stage 4: strategy routing (constraints first, score second)
        let strategy = if !global_constraints.is_empty() || !spec.constraints.is_empty() {
            match choose_strategy(spec) {
                Strategy::Heuristic => Strategy::ConstraintBased,
                other => other,
            }
        } else {
            choose_strategy(spec)
        };

        // stage 5: style hints
        let style_hints = style::assign_styles(&entities);

        let plan = DiagramPlan {
            entities,
            relations,
            global_constraints,
            style_hints,
            strategy,
        };
        debug_assert!(plan_ids_consistent(&plan));
        plan
    }
}

impl Default for DiagramPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Every id referenced by relations and constraints must name an entity.
fn plan_ids_consistent(plan: &DiagramPlan) -> bool {
    let ids: Vec<&str> = plan.entities.iter().map(|e| e.id.as_str()).collect();
    plan.relations
        .iter()
        .all(|r| ids.contains(&r.source.as_str()) && ids.contains(&r.target.as_str()))
        && plan
            .global_constraints
            .iter()
            .all(|c| c.object_ids().iter().all(|id| ids.contains(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use stemdraw_core::{AttrValue, Domain, SpecObject, SpecRelationship};

    fn spec_object(id: &str, object_type: &str) -> SpecObject {
        let mut properties = BTreeMap::new();
        properties.insert("label".to_string(), AttrValue::Str(id.to_string()));
        SpecObject {
            id: id.to_string(),
            object_type: object_type.to_string(),
            properties,
        }
    }

    fn circuit_spec() -> CanonicalSpec {
        CanonicalSpec {
            domain: Domain::Electronics,
            problem_type: "circuit".to_string(),
            objects: vec![
                spec_object("battery", "battery"),
                spec_object("resistor", "resistor"),
                spec_object("switch", "switch"),
            ],
            relationships: vec![SpecRelationship {
                subject: "battery".to_string(),
                relation: "connected_in_series".to_string(),
                target: "resistor".to_string(),
                properties: BTreeMap::new(),
            }],
            constraints: vec![],
            complexity_score: 0.4,
            raw_text: Some("a battery in series with a resistor and a switch".to_string()),
        }
    }

    #[test]
    fn plan_references_are_consistent() {
        let plan = DiagramPlanner::new().plan(&circuit_spec());
        assert!(plan_ids_consistent(&plan));
        assert!(!plan.entities.is_empty());
    }

    #[test]
    fn circuit_plan_uses_constraint_based_strategy() {
        let plan = DiagramPlanner::new().plan(&circuit_spec());
        assert!(!plan.global_constraints.is_empty());
        assert_ne!(plan.strategy, Strategy::Heuristic);
    }

    #[test]
    fn empty_spec_produces_empty_plan_without_panic() {
        let spec = CanonicalSpec {
            domain: Domain::Other,
            problem_type: "general".to_string(),
            objects: vec![],
            relationships: vec![],
            constraints: vec![],
            complexity_score: 0.0,
            raw_text: None,
        };
        let plan = DiagramPlanner::new().plan(&spec);
        assert!(plan.entities.is_empty());
        assert!(plan.relations.is_empty());
    }
}
