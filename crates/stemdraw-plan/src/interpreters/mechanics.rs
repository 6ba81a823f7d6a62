use super::base_scene;
use stemdraw_core::{
    AttrValue, CanonicalSpec, Canvas, DiagramPlan, Domain, Interpreter, Layer, PrimitiveKind,
    Result, Scene,
};

/// Mechanics interpreter: free-body scenes. Force arrows carry their
/// direction (down / normal / along named angles) as properties the
/// renderer resolves into rotation; the incline polygon carries its
/// angle. Geometry stays with the layout solver.
pub struct MechanicsInterpreter;

impl Interpreter for MechanicsInterpreter {
    fn domain(&self) -> Domain {
        Domain::Mechanics
    }

    fn interpret(&self, plan: &DiagramPlan, _spec: &CanonicalSpec, canvas: Canvas) -> Result<Scene> {
        let mut scene = base_scene(plan, canvas);

        for object in &mut scene.objects {
            match &object.primitive {
                PrimitiveKind::Incline => {
                    // default slope when the text named none
                    object
                        .properties
                        .entry("angle".to_string())
                        .or_insert(AttrValue::Num(30.0));
                }
                PrimitiveKind::Arrow => {
                    object.layer = Layer::Annotations;
                    let direction = object
                        .properties
                        .get("direction")
                        .and_then(|v| v.as_str())
                        .unwrap_or("down")
                        .to_string();
                    let rotation = match direction.as_str() {
                        "down" => 180.0,
                        "up" => 0.0,
                        "left" => 270.0,
                        "right" => 90.0,
                        // perpendicular to the surface, leaning uphill
                        "normal" => {
                            let angle = object
                                .properties
                                .get("surface_angle")
                                .and_then(|v| v.as_num())
                                .unwrap_or(30.0);
                            -angle
                        }
                        _ => 0.0,
                    };
                    object
                        .properties
                        .insert("rotation_hint".to_string(), AttrValue::Num(rotation));
                }
                _ => {}
            }
        }

        Ok(scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::canonicalize;
    use crate::planner::DiagramPlanner;
    use stemdraw_core::{NodeKind, ToolId};
    use stemdraw_graph::{GraphEdge, GraphNode, PropertyGraph};
    use stemdraw_core::RelationKind;

    #[test]
    fn incline_scene_has_arrows_with_rotation_hints() {
        let mut graph = PropertyGraph::new();
        graph.add_node(GraphNode::new(
            "block",
            "block",
            NodeKind::Object,
            ToolId::ScientificNer,
        ));
        graph.add_node(GraphNode::new(
            "incline",
            "incline",
            NodeKind::Object,
            ToolId::ScientificNer,
        ));
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

        let spec = canonicalize(&graph, Domain::Mechanics, "A 5 kg block sits on a 30° incline.");
        let plan = DiagramPlanner::new().plan(&spec);
        let scene = MechanicsInterpreter
            .interpret(&plan, &spec, Canvas::default())
            .unwrap();

        let gravity = scene.object("gravity_force").expect("gravity arrow");
        assert_eq!(
            gravity.properties.get("rotation_hint"),
            Some(&AttrValue::Num(180.0))
        );
        let normal = scene.object("normal_force").expect("normal arrow");
        assert_eq!(
            normal.properties.get("rotation_hint"),
            Some(&AttrValue::Num(-30.0))
        );
        assert!(scene.object("block").unwrap().position.is_none());
    }
}
