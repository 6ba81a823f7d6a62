use crate::shapes;
use crate::svg::{document, emit_object, ordered, solved_center};
use stemdraw_core::{
    Domain, PrimitiveKind, PrimitiveMap, Renderer, Result, Scene, SceneObject,
};

/// Molecule renderer: bonds shortened to the atom rims, atoms with their
/// element symbol centered inside the circle.
pub struct MoleculeRenderer;

impl MoleculeRenderer {
    fn bond_line(&self, scene: &Scene, bond: &SceneObject) -> Result<String> {
        let from = bond.properties.get("from").and_then(|v| v.as_str());
        let to = bond.properties.get("to").and_then(|v| v.as_str());
        let (Some(from), Some(to)) = (from, to) else {
            let (cx, cy, rotation) = solved_center(bond)?;
            return Ok(shapes::emit(bond, cx, cy, rotation));
        };
        let endpoint = |id: &str| -> Option<((f64, f64), f64)> {
            let object = scene.object(id)?;
            let center = object.position.map(|p| p.center(&object.dimensions))?;
            Some((center, object.dimensions.width() / 2.0))
        };
        let (Some((fc, fr)), Some((tc, tr))) = (endpoint(from), endpoint(to)) else {
            return Ok(String::new());
        };

        let (dx, dy) = (tc.0 - fc.0, tc.1 - fc.1);
        let length = (dx * dx + dy * dy).sqrt().max(1e-6);
        let (ux, uy) = (dx / length, dy / length);
        Ok(format!(
            "<line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='{}' stroke-width='3'/>",
            fc.0 + ux * fr,
            fc.1 + uy * fr,
            tc.0 - ux * tr,
            tc.1 - uy * tr,
            shapes::escape(&bond.style.stroke)
        ))
    }

    fn atom(&self, object: &SceneObject) -> Result<String> {
        let (cx, cy, _) = solved_center(object)?;
        let radius = object.dimensions.width() / 2.0;
        let symbol = object
            .properties
            .get("element")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        let mut svg = format!(
            "<circle cx='{:.1}' cy='{:.1}' r='{:.1}' fill='{}' stroke='{}' stroke-width='2'/>",
            cx,
            cy,
            radius,
            shapes::escape(&object.style.fill),
            shapes::escape(&object.style.stroke)
        );
        if !symbol.is_empty() {
            svg.push_str(&format!(
                "<text x='{:.1}' y='{:.1}' font-size='14' font-family='sans-serif' \
                 text-anchor='middle' dominant-baseline='middle'>{}</text>",
                cx,
                cy,
                shapes::escape(symbol)
            ));
        }
        Ok(svg)
    }
}

impl Renderer for MoleculeRenderer {
    fn name(&self) -> &'static str {
        "molecule"
    }

    fn supports(&self, domain: Domain) -> bool {
        domain == Domain::Chemistry
    }

    fn render(&self, scene: &Scene, primitives: &PrimitiveMap) -> Result<String> {
        let mut body = String::new();
        for object in ordered(scene) {
            match object.primitive {
                PrimitiveKind::Bond => body.push_str(&self.bond_line(scene, object)?),
                PrimitiveKind::Atom => body.push_str(&self.atom(object)?),
                _ => body.push_str(&emit_object(scene, object, primitives)?),
            }
        }
        Ok(document(scene.canvas.width, scene.canvas.height, &body))
    }

    fn render_fragment(&self, object: &SceneObject) -> Result<String> {
        if object.primitive == PrimitiveKind::Atom {
            let mut clone = object.clone();
            clone.position = Some(stemdraw_core::Position::new(0.0, 0.0));
            return self.atom(&clone);
        }
        Ok(shapes::emit(object, 0.0, 0.0, 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use stemdraw_core::{AttrValue, Canvas, Dimensions, Position};

    #[test]
    fn bonds_stop_at_atom_rims() {
        let mut scene = Scene::new(Canvas::default());
        for (id, x) in [("h1", 300.0), ("o", 400.0)] {
            let mut atom = SceneObject::new(id, PrimitiveKind::Atom, Dimensions::circle(25.0));
            atom.position = Some(Position::new(x, 400.0));
            atom.properties.insert(
                "element".to_string(),
                AttrValue::Str(id.to_uppercase().chars().take(1).collect()),
            );
            scene.objects.push(atom);
        }
        let mut bond =
            SceneObject::new("bond_h1_o", PrimitiveKind::Bond, Dimensions::rect(70.0, 3.0));
        bond.properties
            .insert("from".to_string(), AttrValue::Str("h1".to_string()));
        bond.properties
            .insert("to".to_string(), AttrValue::Str("o".to_string()));
        bond.position = Some(Position::new(350.0, 400.0));
        scene.objects.push(bond);

        let svg = MoleculeRenderer.render(&scene, &HashMap::new()).unwrap();
        // bond runs from x=325 (h1 rim) to x=375 (o rim)
        assert!(svg.contains("x1='325.0'"));
        assert!(svg.contains("x2='375.0'"));
        assert!(svg.contains(">H</text>"));
    }
}
