use stemdraw_core::{
    AttrValue, CanonicalSpec, Constraint, ConstraintKind, DistanceSpec, Domain, PlanEntity,
    PrimitiveKind, VisualRelation,
};

const COMPONENT_GAP: f64 = 160.0;
const PLATE_SEPARATION: f64 = 260.0;
const BOND_LENGTH: f64 = 70.0;

/// Stage 3: layout constraints from the mapped relations plus domain
/// rules. Spec-level constraints pass through first (dropping any whose
/// ids did not survive entity extraction); domain rules add what the
/// discipline implies.
pub fn generate_constraints(
    spec: &CanonicalSpec,
    entities: &[PlanEntity],
    relations: &[VisualRelation],
) -> Vec<Constraint> {
    let exists = |id: &str| entities.iter().any(|e| e.id == id);
    let mut constraints: Vec<Constraint> = spec
        .constraints
        .iter()
        .filter(|c| c.object_ids().iter().all(|id| exists(id)))
        .cloned()
        .collect();

    match spec.domain {
        Domain::Electronics => electronics_constraints(entities, &mut constraints),
        Domain::Mechanics => mechanics_constraints(entities, &mut constraints),
        Domain::Optics => optics_constraints(entities, &mut constraints),
        Domain::Chemistry => chemistry_constraints(entities, relations, &mut constraints),
        _ => {}
    }

    // with nothing else to go on, a single row keeps the scene readable
    if constraints.is_empty() && entities.len() >= 2 {
        constraints.push(Constraint::low(ConstraintKind::StackedHorizontally {
            ids: entities.iter().map(|e| e.id.clone()).collect(),
        }));
    }

    constraints.retain(|c| c.object_ids().iter().all(|id| exists(id)));
    constraints
}

/// Circuits: components sit on one rail (same y), ordered left to right,
/// source first. Ordering uses `LeftOf` (x only) plus one alignment
/// (y only), so no pair is governed twice on the same axis.
fn electronics_constraints(entities: &[PlanEntity], constraints: &mut Vec<Constraint>) {
    let plates: Vec<&PlanEntity> = entities
        .iter()
        .filter(|e| {
            e.properties
                .get("role")
                .and_then(|v| v.as_str())
                .is_some_and(|r| r == "plate")
        })
        .collect();

    if plates.len() == 2 {
        parallel_plate_constraints(entities, &plates, constraints);
        return;
    }

    let mut components: Vec<&PlanEntity> = entities
        .iter()
        .filter(|e| {
            matches!(
                e.primitive,
                PrimitiveKind::Battery
                    | PrimitiveKind::Capacitor
                    | PrimitiveKind::Resistor
                    | PrimitiveKind::Switch
            ) || matches!(&e.primitive, PrimitiveKind::Other(t) if t == "inductor")
        })
        .collect();
    if components.len() < 2 {
        return;
    }
    // source anchors the left end of the rail
    components.sort_by_key(|e| {
        (
            !matches!(e.primitive, PrimitiveKind::Battery),
            e.id.clone(),
        )
    });

    let ids: Vec<String> = components.iter().map(|e| e.id.clone()).collect();
    constraints.push(Constraint::high(ConstraintKind::AlignedHorizontally {
        ids: ids.clone(),
    }));
    for pair in ids.windows(2) {
        constraints.push(Constraint::critical(ConstraintKind::LeftOf {
            a: pair[0].clone(),
            b: pair[1].clone(),
            min_gap: COMPONENT_GAP,
        }));
    }
}

/// Parallel plates with dielectric fillings: plates parallel at a fixed
/// separation, every dielectric between them, region hints ordering the
/// fillings left/right and top/bottom.
fn parallel_plate_constraints(
    entities: &[PlanEntity],
    plates: &[&PlanEntity],
    constraints: &mut Vec<Constraint>,
) {
    let (top, bottom) = (&plates[0].id, &plates[1].id);
    constraints.push(Constraint::critical(ConstraintKind::Parallel {
        a: top.clone(),
        b: bottom.clone(),
    }));
    constraints.push(Constraint::critical(ConstraintKind::Distance {
        a: top.clone(),
        b: bottom.clone(),
        spec: DistanceSpec::Exact(PLATE_SEPARATION),
    }));
    constraints.push(Constraint::high(ConstraintKind::AlignedVertically {
        ids: vec![top.clone(), bottom.clone()],
    }));

    let dielectrics: Vec<&PlanEntity> = entities
        .iter()
        .filter(|e| {
            e.source_object.is_some()
                && e.properties.get("region").is_some()
                && e.primitive == PrimitiveKind::Rect
        })
        .collect();

    for dielectric in &dielectrics {
        constraints.push(Constraint::critical(ConstraintKind::Between {
            inner: dielectric.id.clone(),
            first: top.clone(),
            second: bottom.clone(),
        }));
    }

    let region = |e: &PlanEntity| -> String {
        e.properties
            .get("region")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    };
    for a in &dielectrics {
        for b in &dielectrics {
            if a.id >= b.id {
                continue;
            }
            let (ra, rb) = (region(a), region(b));
            let (left_a, right_a) = (ra.starts_with("left"), ra.starts_with("right"));
            let (left_b, right_b) = (rb.starts_with("left"), rb.starts_with("right"));
            if left_a && right_b {
                constraints.push(Constraint::high(ConstraintKind::LeftOf {
                    a: a.id.clone(),
                    b: b.id.clone(),
                    min_gap: 0.0,
                }));
            } else if right_a && left_b {
                constraints.push(Constraint::high(ConstraintKind::LeftOf {
                    a: b.id.clone(),
                    b: a.id.clone(),
                    min_gap: 0.0,
                }));
            }
            let (top_a, bottom_a) = (ra.ends_with("top"), ra.ends_with("bottom"));
            let (top_b, bottom_b) = (rb.ends_with("top"), rb.ends_with("bottom"));
            if top_a && bottom_b {
                constraints.push(Constraint::high(ConstraintKind::Above {
                    a: a.id.clone(),
                    b: b.id.clone(),
                    min_gap: 0.0,
                }));
                if right_a == right_b && left_a == left_b {
                    constraints.push(Constraint::high(ConstraintKind::AlignedVertically {
                        ids: vec![a.id.clone(), b.id.clone()],
                    }));
                }
            } else if bottom_a && top_b {
                constraints.push(Constraint::high(ConstraintKind::Above {
                    a: b.id.clone(),
                    b: a.id.clone(),
                    min_gap: 0.0,
                }));
            }
        }
    }
}

/// Statics: supported bodies above their support, force arrows adjacent
/// to the body they act on.
fn mechanics_constraints(entities: &[PlanEntity], constraints: &mut Vec<Constraint>) {
    let body = entities.iter().find(|e| e.primitive == PrimitiveKind::Block);
    let support = entities
        .iter()
        .find(|e| e.primitive == PrimitiveKind::Incline);

    if let (Some(body), Some(support)) = (body, support) {
        let already_above = constraints.iter().any(|c| {
            matches!(&c.kind, ConstraintKind::Above { a, b, .. } if a == &body.id && b == &support.id)
        });
        if !already_above {
            constraints.push(Constraint::critical(ConstraintKind::Above {
                a: body.id.clone(),
                b: support.id.clone(),
                min_gap: 0.0,
            }));
            constraints.push(Constraint::high(ConstraintKind::Adjacent {
                a: body.id.clone(),
                b: support.id.clone(),
            }));
        }
    }

    for arrow in entities
        .iter()
        .filter(|e| e.primitive == PrimitiveKind::Arrow)
    {
        if let Some(target) = arrow.properties.get("target").and_then(|v| v.as_str()) {
            if entities.iter().any(|e| e.id == target) {
                constraints.push(Constraint::high(ConstraintKind::Adjacent {
                    a: arrow.id.clone(),
                    b: target.to_string(),
                }));
            }
        }
    }
}

/// Ray diagrams: everything on the optical axis, object left of the
/// lens, image right of it.
fn optics_constraints(entities: &[PlanEntity], constraints: &mut Vec<Constraint>) {
    let lens = entities.iter().find(|e| e.primitive == PrimitiveKind::Lens);
    let Some(lens) = lens else { return };

    let on_axis: Vec<String> = entities
        .iter()
        .filter(|e| e.id != "optical_axis" && e.primitive != PrimitiveKind::Text)
        .map(|e| e.id.clone())
        .collect();
    if on_axis.len() >= 2 {
        constraints.push(Constraint::critical(ConstraintKind::AlignedHorizontally {
            ids: on_axis,
        }));
    }

    for e in entities {
        let label = e.label.to_lowercase();
        if label.contains("object") {
            constraints.push(Constraint::high(ConstraintKind::LeftOf {
                a: e.id.clone(),
                b: lens.id.clone(),
                min_gap: 120.0,
            }));
        } else if label.contains("image") {
            constraints.push(Constraint::high(ConstraintKind::RightOf {
                a: e.id.clone(),
                b: lens.id.clone(),
                min_gap: 120.0,
            }));
        }
    }
}

/// Molecules: bonded atoms at bond length.
fn chemistry_constraints(
    entities: &[PlanEntity],
    relations: &[VisualRelation],
    constraints: &mut Vec<Constraint>,
) {
    for relation in relations {
        let both_atoms = [&relation.source, &relation.target].iter().all(|id| {
            entities
                .iter()
                .any(|e| &&e.id == id && e.primitive == PrimitiveKind::Atom)
        });
        if both_atoms {
            constraints.push(Constraint::critical(ConstraintKind::Distance {
                a: relation.source.clone(),
                b: relation.target.clone(),
                spec: DistanceSpec::Exact(BOND_LENGTH),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn entity(id: &str, primitive: PrimitiveKind) -> PlanEntity {
        PlanEntity {
            id: id.to_string(),
            label: id.to_string(),
            primitive,
            source_object: Some(id.to_string()),
            inferred: false,
            properties: BTreeMap::new(),
        }
    }

    fn entity_with(
        id: &str,
        primitive: PrimitiveKind,
        props: &[(&str, AttrValue)],
    ) -> PlanEntity {
        let mut e = entity(id, primitive);
        for (k, v) in props {
            e.properties.insert(k.to_string(), v.clone());
        }
        e
    }

    fn spec(domain: Domain) -> CanonicalSpec {
        CanonicalSpec {
            domain,
            problem_type: "test".to_string(),
            objects: vec![],
            relationships: vec![],
            constraints: vec![],
            complexity_score: 0.5,
            raw_text: None,
        }
    }

    #[test]
    fn circuit_rail_gets_alignment_and_ordering() {
        let entities = vec![
            entity("battery", PrimitiveKind::Battery),
            entity("resistor", PrimitiveKind::Resistor),
            entity("switch", PrimitiveKind::Switch),
        ];
        let constraints = generate_constraints(&spec(Domain::Electronics), &entities, &[]);

        let alignment = constraints
            .iter()
            .find(|c| matches!(&c.kind, ConstraintKind::AlignedHorizontally { .. }))
            .expect("rail alignment");
        if let ConstraintKind::AlignedHorizontally { ids } = &alignment.kind {
            assert_eq!(ids[0], "battery");
        }
        let left_ofs = constraints
            .iter()
            .filter(|c| matches!(&c.kind, ConstraintKind::LeftOf { .. }))
            .count();
        assert_eq!(left_ofs, 2);
    }

    #[test]
    fn plate_pair_gets_parallel_distance_and_between() {
        let entities = vec![
            entity_with(
                "plate_top",
                PrimitiveKind::Rect,
                &[("role", AttrValue::Str("plate".into()))],
            ),
            entity_with(
                "plate_bottom",
                PrimitiveKind::Rect,
                &[("role", AttrValue::Str("plate".into()))],
            ),
            entity_with(
                "κ1",
                PrimitiveKind::Rect,
                &[("region", AttrValue::Str("left".into()))],
            ),
            entity_with(
                "κ2",
                PrimitiveKind::Rect,
                &[("region", AttrValue::Str("right_top".into()))],
            ),
            entity_with(
                "κ3",
                PrimitiveKind::Rect,
                &[("region", AttrValue::Str("right_bottom".into()))],
            ),
        ];
        let constraints = generate_constraints(&spec(Domain::Electronics), &entities, &[]);

        assert!(constraints
            .iter()
            .any(|c| matches!(&c.kind, ConstraintKind::Parallel { .. })));
        assert!(constraints
            .iter()
            .any(|c| matches!(&c.kind, ConstraintKind::Distance { .. })));
        let betweens = constraints
            .iter()
            .filter(|c| matches!(&c.kind, ConstraintKind::Between { .. }))
            .count();
        assert_eq!(betweens, 3);
        // κ1 left of both right-side regions
        assert!(constraints.iter().any(|c| matches!(
            &c.kind,
            ConstraintKind::LeftOf { a, b, .. } if a == "κ1" && b == "κ2"
        )));
        // κ2 above κ3
        assert!(constraints.iter().any(|c| matches!(
            &c.kind,
            ConstraintKind::Above { a, b, .. } if a == "κ2" && b == "κ3"
        )));
    }

    #[test]
    fn bare_entities_get_fallback_row() {
        let entities = vec![
            entity("a", PrimitiveKind::Rect),
            entity("b", PrimitiveKind::Circle),
        ];
        let constraints = generate_constraints(&spec(Domain::Other), &entities, &[]);
        assert_eq!(constraints.len(), 1);
        assert!(matches!(
            &constraints[0].kind,
            ConstraintKind::StackedHorizontally { .. }
        ));
    }

    #[test]
    fn spec_constraints_with_dead_ids_are_dropped() {
        let mut s = spec(Domain::Other);
        s.constraints.push(Constraint::critical(ConstraintKind::Adjacent {
            a: "ghost".to_string(),
            b: "a".to_string(),
        }));
        let entities = vec![entity("a", PrimitiveKind::Rect)];
        let constraints = generate_constraints(&s, &entities, &[]);
        assert!(constraints.is_empty());
    }
}
