use crate::geometry::{solvable, Centers};
use stemdraw_core::{ConstraintKind, Scene};

/// Domain-aware initial placement. Seeds only guide the solvers (the SMT
/// objective minimizes travel from them, the heuristic nudges from them);
/// they are deterministic for identical scenes.
pub fn initial_positions(scene: &Scene) -> Centers {
    let mut centers = Centers::new();
    let (cx, cy) = (scene.canvas.width / 2.0, scene.canvas.height / 2.0);

    // plate pairs anchor around the canvas center, separated by their
    // distance constraint
    let plate_ids: Vec<&str> = solvable(scene)
        .filter(|o| {
            o.properties
                .get("role")
                .and_then(|v| v.as_str())
                .is_some_and(|r| r == "plate")
        })
        .map(|o| o.id.as_str())
        .collect();
    if plate_ids.len() == 2 {
        let separation = scene
            .constraints
            .iter()
            .find_map(|c| match &c.kind {
                ConstraintKind::Distance { a, b, spec }
                    if plate_ids.contains(&a.as_str()) && plate_ids.contains(&b.as_str()) =>
                {
                    spec.target()
                }
                _ => None,
            })
            .unwrap_or(260.0);
        centers.insert(plate_ids[0].to_string(), (cx, cy - separation / 2.0));
        centers.insert(plate_ids[1].to_string(), (cx, cy + separation / 2.0));
    }

    // everything else: a centered grid, row-major in object order
    let rest: Vec<&str> = solvable(scene)
        .filter(|o| !centers.contains_key(&o.id))
        .map(|o| o.id.as_str())
        .collect();
    if !rest.is_empty() {
        let columns = (rest.len() as f64).sqrt().ceil() as usize;
        let rows = rest.len().div_ceil(columns);
        let cell_w = scene.canvas.width / (columns as f64 + 1.0);
        let cell_h = scene.canvas.height / (rows as f64 + 1.0);
        for (i, id) in rest.iter().enumerate() {
            let col = i % columns;
            let row = i / columns;
            centers.insert(
                id.to_string(),
                (
                    cell_w * (col as f64 + 1.0),
                    cell_h * (row as f64 + 1.0),
                ),
            );
        }
    }

    centers
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{
        AttrValue, Canvas, Constraint, Dimensions, DistanceSpec, PrimitiveKind, SceneObject,
    };

    #[test]
    fn plate_pair_seeds_at_constraint_separation() {
        let mut scene = Scene::new(Canvas::default());
        for id in ["plate_top", "plate_bottom"] {
            let mut plate =
                SceneObject::new(id, PrimitiveKind::Rect, Dimensions::rect(440.0, 10.0));
            plate
                .properties
                .insert("role".to_string(), AttrValue::Str("plate".to_string()));
            scene.objects.push(plate);
        }
        scene.constraints.push(Constraint::critical(ConstraintKind::Distance {
            a: "plate_top".to_string(),
            b: "plate_bottom".to_string(),
            spec: DistanceSpec::Exact(300.0),
        }));

        let centers = initial_positions(&scene);
        let top = centers["plate_top"];
        let bottom = centers["plate_bottom"];
        assert_eq!(top.0, bottom.0);
        assert!((bottom.1 - top.1 - 300.0).abs() < 1e-9);
    }

    #[test]
    fn grid_seed_is_deterministic_and_complete() {
        let mut scene = Scene::new(Canvas::default());
        for id in ["a", "b", "c", "d", "e"] {
            scene
                .objects
                .push(SceneObject::new(id, PrimitiveKind::Rect, Dimensions::rect(50.0, 50.0)));
        }
        let first = initial_positions(&scene);
        let second = initial_positions(&scene);
        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }
}
