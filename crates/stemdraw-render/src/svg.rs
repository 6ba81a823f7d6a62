use crate::shapes;
use stemdraw_core::{
    DiagramError, Domain, PrimitiveMap, Renderer, Result, Scene, SceneObject,
};

/// Build the standalone SVG 1.1 document around a body. User coordinate
/// units, no external references.
pub fn document(width: f64, height: f64, body: &str) -> String {
    format!(
        "<svg xmlns='http://www.w3.org/2000/svg' version='1.1' width='{w:.0}' height='{h:.0}' \
         viewBox='0 0 {w:.0} {h:.0}'>{body}</svg>",
        w = width,
        h = height,
        body = body
    )
}

/// Objects in render order: back layer to front, id-sorted within a
/// layer so identical scenes yield byte-identical documents.
pub fn ordered<'a>(scene: &'a Scene) -> Vec<&'a SceneObject> {
    let mut objects: Vec<&SceneObject> = scene.objects.iter().collect();
    objects.sort_by(|a, b| (a.layer, &a.id).cmp(&(b.layer, &b.id)));
    objects
}

pub(crate) fn solved_center(object: &SceneObject) -> Result<(f64, f64, f64)> {
    let position = object.position.ok_or_else(|| {
        DiagramError::RenderFailure(format!("object '{}' has no position", object.id))
    })?;
    let center = position.center(&object.dimensions);
    Ok((center.0, center.1, position.rotation))
}

/// Straight connector between the centers of two endpoint objects.
pub(crate) fn connector_line(scene: &Scene, object: &SceneObject) -> Option<String> {
    let from = object.properties.get("from").and_then(|v| v.as_str())?;
    let to = object.properties.get("to").and_then(|v| v.as_str())?;
    let fc = scene.object(from).and_then(|o| {
        o.position.map(|p| p.center(&o.dimensions))
    })?;
    let tc = scene.object(to).and_then(|o| {
        o.position.map(|p| p.center(&o.dimensions))
    })?;
    Some(format!(
        "<line x1='{:.1}' y1='{:.1}' x2='{:.1}' y2='{:.1}' stroke='{}' stroke-width='2'/>",
        fc.0,
        fc.1,
        tc.0,
        tc.1,
        shapes::escape(&object.style.stroke)
    ))
}

/// Emit one object, preferring a stored primitive fragment when the map
/// carries one for the object's category.
pub(crate) fn emit_object(
    scene: &Scene,
    object: &SceneObject,
    primitives: &PrimitiveMap,
) -> Result<String> {
    if let Some(line) = connector_line(scene, object) {
        return Ok(line);
    }
    let (cx, cy, rotation) = solved_center(object)?;
    if let Some(entry) = primitives.get(&object.primitive.category()) {
        return Ok(format!(
            "<g transform='translate({:.1} {:.1}) rotate({:.1})'>{}</g>",
            cx, cy, rotation, entry.svg_fragment
        ));
    }
    Ok(shapes::emit(object, cx, cy, rotation))
}

/// The default renderer: every domain, procedural primitives.
pub struct GenericRenderer;

impl Renderer for GenericRenderer {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn supports(&self, _domain: Domain) -> bool {
        true
    }

    fn render(&self, scene: &Scene, primitives: &PrimitiveMap) -> Result<String> {
        let mut body = String::new();
        for object in ordered(scene) {
            body.push_str(&emit_object(scene, object, primitives)?);
        }
        Ok(document(scene.canvas.width, scene.canvas.height, &body))
    }

    fn render_fragment(&self, object: &SceneObject) -> Result<String> {
        Ok(shapes::emit(object, 0.0, 0.0, 0.0))
    }
}
