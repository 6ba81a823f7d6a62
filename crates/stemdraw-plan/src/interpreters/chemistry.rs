use super::base_scene;
use stemdraw_core::{
    AttrValue, CanonicalSpec, Canvas, DiagramPlan, Dimensions, Domain, Interpreter, Layer,
    PrimitiveKind, Result, Scene, SceneObject, VisualRelationKind,
};

/// Chemistry interpreter: atoms as circles, bonds as line objects keyed
/// to their endpoint atoms.
pub struct ChemistryInterpreter;

impl Interpreter for ChemistryInterpreter {
    fn domain(&self) -> Domain {
        Domain::Chemistry
    }

    fn interpret(&self, plan: &DiagramPlan, _spec: &CanonicalSpec, canvas: Canvas) -> Result<Scene> {
        let mut scene = base_scene(plan, canvas);

        for relation in &plan.relations {
            let endpoints_are_atoms = plan
                .entity(&relation.source)
                .zip(plan.entity(&relation.target))
                .is_some_and(|(a, b)| {
                    a.primitive == PrimitiveKind::Atom && b.primitive == PrimitiveKind::Atom
                });
            if relation.kind == VisualRelationKind::ConnectsTo && endpoints_are_atoms {
                let mut bond = SceneObject::new(
                    format!("bond_{}_{}", relation.source, relation.target),
                    PrimitiveKind::Bond,
                    Dimensions::rect(70.0, 3.0),
                );
                bond.properties
                    .insert("from".to_string(), AttrValue::Str(relation.source.clone()));
                bond.properties
                    .insert("to".to_string(), AttrValue::Str(relation.target.clone()));
                bond.layer = Layer::Lines;
                scene.objects.push(bond);
            }
        }

        Ok(scene)
    }
}
