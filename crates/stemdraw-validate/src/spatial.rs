use std::collections::BTreeSet;
use stemdraw_core::{
    constraint::pair_key, AutoFixHint, IssueKind, Layer, PrimitiveKind, Scene, SceneObject,
    ValidationIssue,
};

const OVERLAP_AREA_FLOOR: f64 = 16.0;

/// Spatial validation: unintended overlaps, out-of-bounds objects and
/// layer-order violations. Overlap between a pair is intended only when
/// a declared containment or adjacency covers it.
pub fn check(scene: &Scene) -> (Vec<ValidationIssue>, Vec<ValidationIssue>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let relaxed: BTreeSet<(String, String)> = scene
        .constraints
        .iter()
        .filter(|c| c.relaxes_overlap())
        .flat_map(|c| {
            let ids = c.object_ids();
            let mut pairs = Vec::new();
            for i in 0..ids.len() {
                for j in (i + 1)..ids.len() {
                    pairs.push(pair_key(ids[i], ids[j]));
                }
            }
            pairs
        })
        .collect();

    let shapes: Vec<(&SceneObject, (f64, f64))> = scene
        .objects
        .iter()
        .filter(|o| o.primitive != PrimitiveKind::Text && !o.properties.contains_key("from"))
        .filter_map(|o| o.position.map(|p| (o, p.center(&o.dimensions))))
        .collect();

    for i in 0..shapes.len() {
        for j in (i + 1)..shapes.len() {
            let ((a, ca), (b, cb)) = (&shapes[i], &shapes[j]);
            if relaxed.contains(&pair_key(&a.id, &b.id)) {
                continue;
            }
            // a background fill under a shape is intended stacking
            if a.layer != b.layer {
                continue;
            }
            let area = bbox(*ca, a).intersection_area(&bbox(*cb, b));
            if area > OVERLAP_AREA_FLOOR {
                errors.push(ValidationIssue::new(
                    IssueKind::Overlap,
                    format!("{} and {} overlap ({:.0} px²)", a.id, b.id, area),
                    vec![a.id.clone(), b.id.clone()],
                ));
            }
        }
    }

    for (object, center) in &shapes {
        let bb = bbox(*center, object);
        if !(bb.0 >= 0.0
            && bb.1 >= 0.0
            && bb.2 <= scene.canvas.width
            && bb.3 <= scene.canvas.height)
        {
            errors.push(
                ValidationIssue::new(
                    IssueKind::OutOfBounds,
                    format!("{} extends outside the canvas", object.id),
                    vec![object.id.clone()],
                )
                .with_fix(AutoFixHint::RecenterInCanvas {
                    id: object.id.clone(),
                }),
            );
        }
    }

    for object in &scene.objects {
        let expected = expected_min_layer(object);
        if object.layer < expected {
            warnings.push(
                ValidationIssue::new(
                    IssueKind::ZOrder,
                    format!(
                        "{} sits below its expected layer ({:?} < {:?})",
                        object.id, object.layer, expected
                    ),
                    vec![object.id.clone()],
                )
                .with_fix(AutoFixHint::SwapZOrder {
                    above: object.id.clone(),
                    below: String::new(),
                }),
            );
        }
    }

    (errors, warnings)
}

fn bbox(center: (f64, f64), object: &SceneObject) -> BoxCoords {
    let (w, h) = (object.dimensions.width(), object.dimensions.height());
    BoxCoords(
        center.0 - w / 2.0,
        center.1 - h / 2.0,
        center.0 + w / 2.0,
        center.1 + h / 2.0,
    )
}

#[derive(Clone, Copy)]
struct BoxCoords(f64, f64, f64, f64);

impl BoxCoords {
    fn intersection_area(&self, other: &BoxCoords) -> f64 {
        let w = (self.2.min(other.2) - self.0.max(other.0)).max(0.0);
        let h = (self.3.min(other.3) - self.1.max(other.1)).max(0.0);
        w * h
    }
}

/// The lowest layer each kind of object belongs on. Region fills live on
/// the background; everything else must not sink below its band.
fn expected_min_layer(object: &SceneObject) -> Layer {
    if object.properties.contains_key("region") {
        return Layer::Background;
    }
    match object.primitive {
        PrimitiveKind::Text => Layer::Labels,
        PrimitiveKind::Wire | PrimitiveKind::Line | PrimitiveKind::Arrow | PrimitiveKind::Bond => {
            Layer::Lines
        }
        _ => Layer::Shapes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{
        Canvas, Constraint, ConstraintKind, Dimensions, Position,
    };

    fn positioned(id: &str, x: f64, y: f64, w: f64, h: f64) -> SceneObject {
        let mut object = SceneObject::new(id, PrimitiveKind::Rect, Dimensions::rect(w, h));
        object.position = Some(Position::new(x, y));
        object
    }

    #[test]
    fn overlapping_shapes_are_reported() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(positioned("a", 300.0, 300.0, 100.0, 100.0));
        scene.objects.push(positioned("b", 330.0, 300.0, 100.0, 100.0));
        let (errors, _) = check(&scene);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, IssueKind::Overlap);
    }

    #[test]
    fn adjacency_relaxes_the_overlap_rule() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(positioned("a", 300.0, 300.0, 100.0, 100.0));
        scene.objects.push(positioned("b", 330.0, 300.0, 100.0, 100.0));
        scene.constraints.push(Constraint::high(ConstraintKind::Adjacent {
            a: "a".to_string(),
            b: "b".to_string(),
        }));
        let (errors, _) = check(&scene);
        assert!(errors.is_empty());
    }

    #[test]
    fn out_of_bounds_gets_a_recenter_hint() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(positioned("edge", 1190.0, 400.0, 100.0, 40.0));
        let (errors, _) = check(&scene);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, IssueKind::OutOfBounds);
        assert!(matches!(
            errors[0].fix_hint,
            Some(AutoFixHint::RecenterInCanvas { .. })
        ));
    }

    #[test]
    fn sunken_label_is_a_z_order_warning() {
        let mut scene = Scene::new(Canvas::default());
        let mut label = SceneObject::new("t", PrimitiveKind::Text, Dimensions::rect(40.0, 18.0));
        label.position = Some(Position::new(100.0, 100.0));
        label.layer = Layer::Background;
        scene.objects.push(label);
        let (_, warnings) = check(&scene);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, IssueKind::ZOrder);
    }

    #[test]
    fn single_object_scene_is_clean() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(positioned("only", 600.0, 400.0, 100.0, 60.0));
        let (errors, warnings) = check(&scene);
        assert!(errors.is_empty());
        assert!(warnings.is_empty());
    }
}
