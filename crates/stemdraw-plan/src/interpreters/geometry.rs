use super::base_scene;
use stemdraw_core::{CanonicalSpec, Canvas, DiagramPlan, Domain, Interpreter, Result, Scene};

/// Geometry interpreter: shapes exactly as planned, no domain additions.
pub struct GeometryInterpreter;

impl Interpreter for GeometryInterpreter {
    fn domain(&self) -> Domain {
        Domain::Geometry
    }

    fn interpret(&self, plan: &DiagramPlan, _spec: &CanonicalSpec, canvas: Canvas) -> Result<Scene> {
        Ok(base_scene(plan, canvas))
    }
}
