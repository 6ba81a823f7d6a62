use crate::geometry::{solvable, Centers};
use stemdraw_core::{ConstraintKind, Scene};

/// Tier 2: closed-form solutions for constraint shapes that admit them.
/// Returns `None` when no pattern matches or a numeric step fails, and
/// the cascade falls through to the heuristic tier.
pub fn solve(scene: &Scene) -> Option<Centers> {
    equal_spacing_row(scene)
        .or_else(|| concentric(scene))
        .or_else(|| plate_sandwich(scene))
}

/// One aligned row ordered by a LeftOf chain: N objects spaced equally
/// across the canvas on the midline.
fn equal_spacing_row(scene: &Scene) -> Option<Centers> {
    let mut chain: Vec<(&str, &str, f64)> = Vec::new();
    let mut row_ids: Option<&[String]> = None;

    for constraint in &scene.constraints {
        match &constraint.kind {
            ConstraintKind::LeftOf { a, b, min_gap } => chain.push((a, b, *min_gap)),
            ConstraintKind::AlignedHorizontally { ids } => row_ids = Some(ids),
            // any other constraint breaks the closed form
            _ => return None,
        }
    }
    let row_ids = row_ids?;
    if chain.len() + 1 != row_ids.len() || row_ids.len() < 2 {
        return None;
    }
    // the chain must order exactly the row ids
    for (i, (a, b, _)) in chain.iter().enumerate() {
        if row_ids.get(i)? != a || row_ids.get(i + 1)? != b {
            return None;
        }
    }
    // every solvable object must be part of the row
    if solvable(scene).count() != row_ids.len() {
        return None;
    }

    let widths: Vec<f64> = row_ids
        .iter()
        .map(|id| scene.object(id).map(|o| o.dimensions.width()))
        .collect::<Option<Vec<f64>>>()?;
    let gap = chain
        .iter()
        .map(|(_, _, g)| *g)
        .fold(0.0f64, f64::max)
        .max(40.0);
    let total: f64 = widths.iter().sum::<f64>() + gap * (row_ids.len() - 1) as f64;
    if total > scene.canvas.width {
        return None;
    }

    let mut centers = Centers::new();
    let y = scene.canvas.height / 2.0;
    let mut x = (scene.canvas.width - total) / 2.0;
    for (id, width) in row_ids.iter().zip(&widths) {
        centers.insert(id.clone(), (x + width / 2.0, y));
        x += width + gap;
    }
    Some(centers)
}

/// A single containment pair and nothing else: center both.
fn concentric(scene: &Scene) -> Option<Centers> {
    let [constraint] = scene.constraints.as_slice() else {
        return None;
    };
    let ConstraintKind::Containment { inner, outers } = &constraint.kind else {
        return None;
    };
    let [outer] = outers.as_slice() else { return None };
    if solvable(scene).count() != 2 {
        return None;
    }
    let inner_obj = scene.object(inner)?;
    let outer_obj = scene.object(outer)?;
    if inner_obj.dimensions.width() >= outer_obj.dimensions.width()
        || inner_obj.dimensions.height() >= outer_obj.dimensions.height()
    {
        return None;
    }

    let center = (scene.canvas.width / 2.0, scene.canvas.height / 2.0);
    let mut centers = Centers::new();
    centers.insert(inner.clone(), center);
    centers.insert(outer.clone(), center);
    Some(centers)
}

/// Parallel plates at an exact separation with regioned fillings between
/// them: the multi-dielectric capacitor shape, solved directly.
fn plate_sandwich(scene: &Scene) -> Option<Centers> {
    let mut plates: Option<(&str, &str, f64)> = None;
    for constraint in &scene.constraints {
        if let ConstraintKind::Distance { a, b, spec } = &constraint.kind {
            let both_plates = [a, b].iter().all(|id| {
                scene.object(id).is_some_and(|o| {
                    o.properties
                        .get("role")
                        .and_then(|v| v.as_str())
                        .is_some_and(|r| r == "plate")
                })
            });
            if both_plates {
                plates = Some((a, b, spec.target()?));
            }
        }
    }
    let (top_id, bottom_id, separation) = plates?;

    let (cx, cy) = (scene.canvas.width / 2.0, scene.canvas.height / 2.0);
    let mut centers = Centers::new();
    centers.insert(top_id.to_string(), (cx, cy - separation / 2.0));
    centers.insert(bottom_id.to_string(), (cx, cy + separation / 2.0));

    let plate_width = scene.object(top_id)?.dimensions.width();
    let left_edge = cx - plate_width / 2.0;

    for object in solvable(scene) {
        if object.id == top_id || object.id == bottom_id {
            continue;
        }
        let Some(region) = object.properties.get("region").and_then(|v| v.as_str()) else {
            // no region hint: not this pattern's shape
            return None;
        };
        let w = object.dimensions.width();
        let h = object.dimensions.height();
        let x = if region.starts_with("left") {
            left_edge + w / 2.0
        } else {
            left_edge + plate_width - w / 2.0
        };
        let y = if region.ends_with("top") {
            cy - separation / 2.0 + h / 2.0 + 10.0
        } else if region.ends_with("bottom") {
            cy + separation / 2.0 - h / 2.0 - 10.0
        } else {
            cy
        };
        centers.insert(object.id.clone(), (x, y));
    }
    Some(centers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{
        AttrValue, Canvas, Constraint, Dimensions, DistanceSpec, PrimitiveKind, SceneObject,
    };

    #[test]
    fn row_pattern_solves_in_closed_form() {
        let mut scene = Scene::new(Canvas::default());
        for id in ["a", "b", "c"] {
            scene
                .objects
                .push(SceneObject::new(id, PrimitiveKind::Rect, Dimensions::rect(80.0, 40.0)));
        }
        scene
            .constraints
            .push(Constraint::high(ConstraintKind::AlignedHorizontally {
                ids: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            }));
        for pair in [("a", "b"), ("b", "c")] {
            scene.constraints.push(Constraint::critical(ConstraintKind::LeftOf {
                a: pair.0.to_string(),
                b: pair.1.to_string(),
                min_gap: 100.0,
            }));
        }

        let centers = solve(&scene).expect("row pattern");
        assert_eq!(centers["a"].1, centers["b"].1);
        assert!((centers["b"].0 - centers["a"].0 - 180.0).abs() < 1e-6);
        assert!((centers["c"].0 - centers["b"].0 - 180.0).abs() < 1e-6);
    }

    #[test]
    fn unrecognized_shapes_fall_through() {
        let mut scene = Scene::new(Canvas::default());
        scene
            .objects
            .push(SceneObject::new("a", PrimitiveKind::Rect, Dimensions::rect(80.0, 40.0)));
        scene
            .objects
            .push(SceneObject::new("b", PrimitiveKind::Rect, Dimensions::rect(80.0, 40.0)));
        scene.constraints.push(Constraint::high(ConstraintKind::Adjacent {
            a: "a".to_string(),
            b: "b".to_string(),
        }));
        assert!(solve(&scene).is_none());
    }

    #[test]
    fn plate_sandwich_places_regions() {
        let mut scene = Scene::new(Canvas::default());
        for id in ["plate_top", "plate_bottom"] {
            let mut plate =
                SceneObject::new(id, PrimitiveKind::Rect, Dimensions::rect(440.0, 10.0));
            plate
                .properties
                .insert("role".to_string(), AttrValue::Str("plate".to_string()));
            scene.objects.push(plate);
        }
        for (id, region, h) in [
            ("κ1", "left", 220.0),
            ("κ2", "right_top", 105.0),
            ("κ3", "right_bottom", 105.0),
        ] {
            let mut rect = SceneObject::new(id, PrimitiveKind::Rect, Dimensions::rect(200.0, h));
            rect.properties
                .insert("region".to_string(), AttrValue::Str(region.to_string()));
            scene.objects.push(rect);
        }
        scene.constraints.push(Constraint::critical(ConstraintKind::Distance {
            a: "plate_top".to_string(),
            b: "plate_bottom".to_string(),
            spec: DistanceSpec::Exact(260.0),
        }));

        let centers = solve(&scene).expect("plate sandwich");
        // κ1 on the left, κ2/κ3 on the right, κ2 above κ3
        assert!(centers["κ1"].0 < centers["κ2"].0);
        assert!((centers["κ2"].0 - centers["κ3"].0).abs() < 1e-6);
        assert!(centers["κ2"].1 < centers["κ3"].1);
        // all between the plates
        assert!(centers["κ1"].1 > centers["plate_top"].1);
        assert!(centers["κ1"].1 < centers["plate_bottom"].1);
    }
}
