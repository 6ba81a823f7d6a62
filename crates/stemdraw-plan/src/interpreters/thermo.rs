use super::base_scene;
use stemdraw_core::{
    CanonicalSpec, Canvas, DiagramPlan, Domain, Interpreter, Layer, PrimitiveKind, Result, Scene,
};

/// Thermodynamics interpreter: containers (cylinders, pistons) render as
/// outlined boxes behind their contents.
pub struct ThermoInterpreter;

impl Interpreter for ThermoInterpreter {
    fn domain(&self) -> Domain {
        Domain::Thermodynamics
    }

    fn interpret(&self, plan: &DiagramPlan, spec: &CanonicalSpec, canvas: Canvas) -> Result<Scene> {
        let mut scene = base_scene(plan, canvas);
        for object in &mut scene.objects {
            let is_container = spec
                .object(&object.id)
                .is_some_and(|o| matches!(o.object_type.as_str(), "cylinder" | "piston" | "gas"));
            if is_container && object.primitive == PrimitiveKind::Rect {
                object.layer = Layer::Background;
                object.style.fill = "#f3f4f6".to_string();
            }
        }
        Ok(scene)
    }
}
