use super::base_scene;
use stemdraw_core::{
    AttrValue, CanonicalSpec, Canvas, DiagramPlan, Dimensions, Domain, Interpreter, Layer,
    PrimitiveKind, Result, Scene, SceneObject, VisualRelationKind,
};

/// Circuit interpreter: the base scene plus one wire object per
/// connection. Wires carry their endpoints as properties; the circuit
/// renderer routes them once positions exist.
pub struct CircuitInterpreter;

impl Interpreter for CircuitInterpreter {
    fn domain(&self) -> Domain {
        Domain::Electronics
    }

    fn interpret(&self, plan: &DiagramPlan, _spec: &CanonicalSpec, canvas: Canvas) -> Result<Scene> {
        let mut scene = base_scene(plan, canvas);

        for relation in &plan.relations {
            if relation.kind != VisualRelationKind::ConnectsTo {
                continue;
            }
            scene.objects.push(wire(&relation.source, &relation.target));
        }

        // a series rail implies wiring between neighbors even when the
        // text only states the first connection
        let rail: Vec<String> = plan
            .entities
            .iter()
            .filter(|e| {
                matches!(
                    e.primitive,
                    PrimitiveKind::Battery
                        | PrimitiveKind::Capacitor
                        | PrimitiveKind::Resistor
                        | PrimitiveKind::Switch
                )
            })
            .map(|e| e.id.clone())
            .collect();
        for pair in rail.windows(2) {
            let id = wire_id(&pair[0], &pair[1]);
            if scene.object(&id).is_none() {
                scene.objects.push(wire(&pair[0], &pair[1]));
            }
        }
        // return wire closes the loop
        if rail.len() >= 2 {
            let id = wire_id(rail.last().unwrap(), &rail[0]);
            if scene.object(&id).is_none() {
                let mut w = wire(rail.last().unwrap(), &rail[0]);
                w.properties
                    .insert("return_path".to_string(), AttrValue::Bool(true));
                scene.objects.push(w);
            }
        }

        Ok(scene)
    }
}

fn wire_id(from: &str, to: &str) -> String {
    format!("wire_{}_{}", from, to)
}

fn wire(from: &str, to: &str) -> SceneObject {
    let mut object = SceneObject::new(
        wire_id(from, to),
        PrimitiveKind::Wire,
        Dimensions::rect(2.0, 2.0),
    );
    object
        .properties
        .insert("from".to_string(), AttrValue::Str(from.to_string()));
    object
        .properties
        .insert("to".to_string(), AttrValue::Str(to.to_string()));
    object.layer = Layer::Lines;
    object
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::DiagramPlanner;
    use std::collections::BTreeMap;
    use stemdraw_core::SpecObject;

    #[test]
    fn series_circuit_wires_form_a_loop() {
        let spec = CanonicalSpec {
            domain: Domain::Electronics,
            problem_type: "circuit".to_string(),
            objects: ["battery", "resistor", "switch"]
                .iter()
                .map(|id| {
                    let mut properties = BTreeMap::new();
                    properties.insert("label".to_string(), AttrValue::Str(id.to_string()));
                    SpecObject {
                        id: id.to_string(),
                        object_type: id.to_string(),
                        properties,
                    }
                })
                .collect(),
            relationships: vec![],
            constraints: vec![],
            complexity_score: 0.4,
            raw_text: Some("a 12V battery, a 100Ω resistor and a switch".to_string()),
        };
        let plan = DiagramPlanner::new().plan(&spec);
        let scene = CircuitInterpreter
            .interpret(&plan, &spec, Canvas::default())
            .unwrap();

        let wires: Vec<&SceneObject> = scene
            .objects
            .iter()
            .filter(|o| o.primitive == PrimitiveKind::Wire)
            .collect();
        // three components: two rail wires plus the return wire
        assert_eq!(wires.len(), 3);
        assert!(wires.iter().any(|w| w
            .properties
            .get("return_path")
            .is_some()));
    }
}
