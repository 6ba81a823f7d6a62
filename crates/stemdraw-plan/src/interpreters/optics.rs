use super::base_scene;
use stemdraw_core::{
    CanonicalSpec, Canvas, DiagramPlan, Dimensions, Domain, Interpreter, Result, Scene,
};

/// Optics interpreter: ray diagrams. The optical axis spans most of the
/// canvas; lenses stay thin and tall.
pub struct OpticsInterpreter;

impl Interpreter for OpticsInterpreter {
    fn domain(&self) -> Domain {
        Domain::Optics
    }

    fn interpret(&self, plan: &DiagramPlan, _spec: &CanonicalSpec, canvas: Canvas) -> Result<Scene> {
        let mut scene = base_scene(plan, canvas);
        if let Some(axis) = scene.object_mut("optical_axis") {
            axis.dimensions = Dimensions::rect(canvas.width * 0.85, 2.0);
        }
        Ok(scene)
    }
}
