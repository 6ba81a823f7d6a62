mod chemistry;
mod circuits;
mod geometry;
mod mechanics;
mod optics;
mod thermo;

use std::collections::BTreeMap;
use stemdraw_core::{
    AttrValue, CanonicalSpec, Canvas, DiagramPlan, Dimensions, Domain, Interpreter, Layer,
    PlanEntity, PrimitiveKind, Result, Scene, SceneObject, Style, StyleHint,
};

pub use chemistry::ChemistryInterpreter;
pub use circuits::CircuitInterpreter;
pub use geometry::GeometryInterpreter;
pub use mechanics::MechanicsInterpreter;
pub use optics::OpticsInterpreter;
pub use thermo::ThermoInterpreter;

/// Domain-dispatching facade over the interpreter set. Unknown domains
/// fall back to the generic interpreter.
pub struct InterpreterRegistry {
    interpreters: Vec<Box<dyn Interpreter>>,
    generic: GenericInterpreter,
}

impl InterpreterRegistry {
    pub fn new() -> Self {
        Self {
            interpreters: vec![
                Box::new(CircuitInterpreter),
                Box::new(MechanicsInterpreter),
                Box::new(OpticsInterpreter),
                Box::new(ThermoInterpreter),
                Box::new(ChemistryInterpreter),
                Box::new(GeometryInterpreter),
            ],
            generic: GenericInterpreter,
        }
    }

    pub fn interpret(
        &self,
        plan: &DiagramPlan,
        spec: &CanonicalSpec,
        canvas: Canvas,
    ) -> Result<Scene> {
        let interpreter = self
            .interpreters
            .iter()
            .find(|i| i.domain() == spec.domain)
            .map(|i| i.as_ref())
            .unwrap_or(&self.generic);
        let scene = interpreter.interpret(plan, spec, canvas)?;
        debug_assert!(scene.objects.iter().all(|o| o.position.is_none()));
        Ok(scene)
    }

    pub fn supported_domains(&self) -> Vec<Domain> {
        self.interpreters.iter().map(|i| i.domain()).collect()
    }
}

impl Default for InterpreterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Fallback interpreter: the base scene with no domain additions.
pub struct GenericInterpreter;

impl Interpreter for GenericInterpreter {
    fn domain(&self) -> Domain {
        Domain::Other
    }

    fn interpret(&self, plan: &DiagramPlan, _spec: &CanonicalSpec, canvas: Canvas) -> Result<Scene> {
        Ok(base_scene(plan, canvas))
    }
}

/// Shared scene construction: one unpositioned object per entity, one
/// text label per labeled entity, constraints copied from the plan.
/// Interpreters build on this and never assign positions.
pub(crate) fn base_scene(plan: &DiagramPlan, canvas: Canvas) -> Scene {
    let mut scene = Scene::new(canvas);
    for entity in &plan.entities {
        let mut object = SceneObject::new(
            entity.id.clone(),
            entity.primitive.clone(),
            default_dimensions(entity),
        );
        object.properties = entity.properties.clone();
        apply_hint(&mut object, plan.style_hints.get(&entity.id));
        scene.objects.push(object);

        if !entity.label.is_empty() {
            scene.objects.push(label_object(&entity.id, &entity.label));
        }
    }
    scene.constraints = plan.global_constraints.clone();
    scene
}

pub(crate) fn label_object(target: &str, text: &str) -> SceneObject {
    let mut label = SceneObject::new(
        format!("{}__label", target),
        PrimitiveKind::Text,
        // rough text metrics: 8 px per char at the default font size
        Dimensions::rect(8.0 * text.chars().count().max(1) as f64, 18.0),
    );
    label.properties.insert(
        "text".to_string(),
        AttrValue::Str(text.to_string()),
    );
    label.layer = Layer::Labels;
    label.label_target = Some(target.to_string());
    label.style = Style {
        fill: "#111827".to_string(),
        stroke: "none".to_string(),
        stroke_width: 0.0,
        opacity: 1.0,
        font_size: Some(14.0),
    };
    label
}

fn apply_hint(object: &mut SceneObject, hint: Option<&StyleHint>) {
    let Some(hint) = hint else {
        object.layer = default_layer(&object.primitive);
        return;
    };
    if let Some(fill) = &hint.fill {
        object.style.fill = fill.clone();
    }
    if let Some(stroke) = &hint.stroke {
        object.style.stroke = stroke.clone();
    }
    object.layer = hint.layer.unwrap_or_else(|| default_layer(&object.primitive));
}

fn default_layer(primitive: &PrimitiveKind) -> Layer {
    match primitive {
        PrimitiveKind::Text => Layer::Labels,
        PrimitiveKind::Wire | PrimitiveKind::Line | PrimitiveKind::Arrow | PrimitiveKind::Bond => {
            Layer::Lines
        }
        _ => Layer::Shapes,
    }
}

fn default_dimensions(entity: &PlanEntity) -> Dimensions {
    let is_plate = entity
        .properties
        .get("role")
        .and_then(|v| v.as_str())
        .is_some_and(|r| r == "plate");
    if is_plate {
        return Dimensions::rect(440.0, 10.0);
    }
    if let Some(region) = entity.properties.get("region").and_then(|v| v.as_str()) {
        // a half-height region when the hint carries a vertical component
        return if region.contains('_') {
            Dimensions::rect(200.0, 105.0)
        } else {
            Dimensions::rect(200.0, 220.0)
        };
    }
    match &entity.primitive {
        PrimitiveKind::Battery => Dimensions::rect(64.0, 40.0),
        PrimitiveKind::Resistor => Dimensions::rect(84.0, 24.0),
        PrimitiveKind::Capacitor => Dimensions::rect(36.0, 52.0),
        PrimitiveKind::Switch => Dimensions::rect(64.0, 24.0),
        PrimitiveKind::Wire => Dimensions::rect(2.0, 2.0),
        PrimitiveKind::Block => Dimensions::rect(90.0, 64.0),
        PrimitiveKind::Incline => Dimensions::rect(340.0, 190.0),
        PrimitiveKind::Spring => Dimensions::rect(24.0, 110.0),
        PrimitiveKind::Lens => Dimensions::rect(28.0, 180.0),
        PrimitiveKind::Arrow => Dimensions::rect(14.0, 90.0),
        PrimitiveKind::Atom => Dimensions::circle(26.0),
        PrimitiveKind::Circle => Dimensions::circle(34.0),
        PrimitiveKind::Line => Dimensions::rect(220.0, 2.0),
        PrimitiveKind::Bond => Dimensions::rect(70.0, 3.0),
        PrimitiveKind::Polygon => Dimensions::rect(140.0, 120.0),
        PrimitiveKind::Text => Dimensions::rect(80.0, 18.0),
        PrimitiveKind::Rect | PrimitiveKind::Other(_) => Dimensions::rect(120.0, 84.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::DiagramPlanner;
    use std::collections::BTreeMap;
    use stemdraw_core::{SpecObject, Strategy};

    fn spec(domain: Domain, objects: Vec<(&str, &str)>) -> CanonicalSpec {
        CanonicalSpec {
            domain,
            problem_type: "test".to_string(),
            objects: objects
                .into_iter()
                .map(|(id, t)| {
                    let mut properties = BTreeMap::new();
                    properties.insert("label".to_string(), AttrValue::Str(id.to_string()));
                    SpecObject {
                        id: id.to_string(),
                        object_type: t.to_string(),
                        properties,
                    }
                })
                .collect(),
            relationships: vec![],
            constraints: vec![],
            complexity_score: 0.4,
            raw_text: Some("a 12V battery connected to a 100Ω resistor".to_string()),
        }
    }

    #[test]
    fn interpreters_never_assign_positions() {
        let registry = InterpreterRegistry::new();
        for domain in [
            Domain::Electronics,
            Domain::Mechanics,
            Domain::Optics,
            Domain::Chemistry,
            Domain::Geometry,
            Domain::Other,
        ] {
            let s = spec(domain, vec![("battery", "battery"), ("resistor", "resistor")]);
            let plan = DiagramPlanner::new().plan(&s);
            let scene = registry.interpret(&plan, &s, Canvas::default()).unwrap();
            assert!(
                scene.objects.iter().all(|o| o.position.is_none()),
                "{:?} interpreter leaked positions",
                domain
            );
        }
    }

    #[test]
    fn labeled_entities_get_text_objects() {
        let s = spec(Domain::Other, vec![("block", "block")]);
        let mut plan = DiagramPlanner::new().plan(&s);
        plan.strategy = Strategy::Heuristic;
        let scene = base_scene(&plan, Canvas::default());
        let label = scene
            .objects
            .iter()
            .find(|o| o.primitive == PrimitiveKind::Text)
            .expect("label object");
        assert_eq!(label.label_target.as_deref(), Some("block"));
        assert_eq!(label.layer, Layer::Labels);
    }

    #[test]
    fn scene_constraints_reference_existing_objects() {
        let registry = InterpreterRegistry::new();
        let s = spec(
            Domain::Electronics,
            vec![
                ("battery", "battery"),
                ("resistor", "resistor"),
                ("switch", "switch"),
            ],
        );
        let plan = DiagramPlanner::new().plan(&s);
        let scene = registry.interpret(&plan, &s, Canvas::default()).unwrap();
        assert!(scene.check_references().is_ok());
    }
}
