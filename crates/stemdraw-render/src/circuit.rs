use crate::shapes;
use crate::svg::{document, emit_object, ordered, solved_center};
use stemdraw_core::{
    AttrValue, Domain, PrimitiveKind, PrimitiveMap, Renderer, Result, Scene, SceneObject,
};

/// Circuit renderer: the generic contract plus orthogonal wire routing.
/// Rail wires run straight between neighboring component edges; the
/// return wire drops below the rail to close the loop visually.
pub struct CircuitRenderer;

impl CircuitRenderer {
    fn wire_path(&self, scene: &Scene, wire: &SceneObject) -> Result<String> {
        let from = wire.properties.get("from").and_then(|v| v.as_str());
        let to = wire.properties.get("to").and_then(|v| v.as_str());
        let (Some(from), Some(to)) = (from, to) else {
            // not endpoint-keyed; render as a plain segment
            let (cx, cy, rotation) = solved_center(wire)?;
            return Ok(shapes::emit(wire, cx, cy, rotation));
        };

        let endpoint = |id: &str| -> Option<((f64, f64), f64)> {
            let object = scene.object(id)?;
            let center = object.position.map(|p| p.center(&object.dimensions))?;
            Some((center, object.dimensions.width() / 2.0))
        };
        let (Some((fc, f_half)), Some((tc, t_half))) = (endpoint(from), endpoint(to)) else {
            return Ok(String::new());
        };

        let stroke = shapes::escape(&wire.style.stroke);
        let is_return = wire
            .properties
            .get("return_path")
            .and_then(|v| match v {
                AttrValue::Bool(b) => Some(*b),
                _ => None,
            })
            .unwrap_or(false);

        if is_return {
            // drop below the rail, run across, climb back up
            let drop_y = fc.1.max(tc.1) + 120.0;
            return Ok(format!(
                "<polyline points='{:.1},{:.1} {:.1},{:.1} {:.1},{:.1} {:.1},{:.1}' \
                 fill='none' stroke='{}' stroke-width='2'/>",
                fc.0, fc.1, fc.0, drop_y, tc.0, drop_y, tc.0, tc.1, stroke
            ));
        }

        if (fc.1 - tc.1).abs() < 2.0 {
            // same rail: edge-to-edge straight segment
            let (start, end) = if fc.0 <= tc.0 {
                (fc.0 + f_half, tc.0 - t_half)
            } else {
                (fc.0 - f_half, tc.0 + t_half)
            };
            Ok(format!(
                "<line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='{}' stroke-width='2'/>",
                start, fc.1, end, tc.1, stroke
            ))
        } else {
            // L-shaped route
            Ok(format!(
                "<polyline points='{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}' \
                 fill='none' stroke='{}' stroke-width='2'/>",
                fc.0, fc.1, tc.0, fc.1, tc.0, tc.1, stroke
            ))
        }
    }
}

impl Renderer for CircuitRenderer {
    fn name(&self) -> &'static str {
        "circuit"
    }

    fn supports(&self, domain: Domain) -> bool {
        domain == Domain::Electronics
    }

    fn render(&self, scene: &Scene, primitives: &PrimitiveMap) -> Result<String> {
        let mut body = String::new();
        for object in ordered(scene) {
            if object.primitive == PrimitiveKind::Wire {
                body.push_str(&self.wire_path(scene, object)?);
            } else {
                body.push_str(&emit_object(scene, object, primitives)?);
            }
        }
        Ok(document(scene.canvas.width, scene.canvas.height, &body))
    }

    fn render_fragment(&self, object: &SceneObject) -> Result<String> {
        Ok(shapes::emit(object, 0.0, 0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use stemdraw_core::{Canvas, Dimensions, Position};

    fn component(id: &str, kind: PrimitiveKind, x: f64) -> SceneObject {
        let mut object = SceneObject::new(id, kind, Dimensions::rect(64.0, 40.0));
        object.position = Some(Position::new(x, 400.0));
        object
    }

    fn wire(from: &str, to: &str, return_path: bool) -> SceneObject {
        let mut object = SceneObject::new(
            format!("wire_{}_{}", from, to),
            PrimitiveKind::Wire,
            Dimensions::rect(2.0, 2.0),
        );
        object
            .properties
            .insert("from".to_string(), AttrValue::Str(from.to_string()));
        object
            .properties
            .insert("to".to_string(), AttrValue::Str(to.to_string()));
        if return_path {
            object
                .properties
                .insert("return_path".to_string(), AttrValue::Bool(true));
        }
        object.position = Some(Position::new(0.0, 0.0));
        object
    }

    #[test]
    fn rail_wires_are_straight_return_is_routed() {
        let mut scene = Scene::new(Canvas::default());
        scene
            .objects
            .push(component("battery", PrimitiveKind::Battery, 200.0));
        scene
            .objects
            .push(component("resistor", PrimitiveKind::Resistor, 500.0));
        scene.objects.push(wire("battery", "resistor", false));
        scene.objects.push(wire("resistor", "battery", true));

        let svg = CircuitRenderer.render(&scene, &HashMap::new()).unwrap();
        assert!(svg.contains("<line x1='232.0' y1='400.0'"));
        assert!(svg.contains("520.0")); // return path drops below the rail
        assert!(svg.contains("<polyline"));
    }
}
