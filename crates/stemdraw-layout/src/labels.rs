use crate::geometry::BBox;
use stemdraw_core::{Position, PrimitiveKind, Scene};

const LABEL_GAP: f64 = 8.0;

/// Candidate directions in preference order; the order also breaks score
/// ties deterministically. Physics diagrams prefer above and right.
const DIRECTIONS: [(f64, f64, f64); 8] = [
    (0.0, -1.0, 2.0),  // above
    (1.0, 0.0, 1.0),   // right
    (0.0, 1.0, 0.0),   // below
    (-1.0, 0.0, 0.0),  // left
    (1.0, -1.0, 0.5),  // top-right
    (1.0, 1.0, 0.0),   // bottom-right
    (-1.0, -1.0, 0.5), // top-left
    (-1.0, 1.0, 0.0),  // bottom-left
];

/// Post-layout label placement: a scored candidate search around each
/// label's target. Greedy in deterministic label order; every placed
/// label becomes an obstacle for the next. Returns how many labels were
/// placed.
pub fn place_labels(scene: &mut Scene) -> usize {
    let obstacle_boxes: Vec<BBox> = scene
        .objects
        .iter()
        .filter(|o| o.primitive != PrimitiveKind::Text)
        .filter_map(|o| {
            o.position
                .map(|p| BBox::around(p.center(&o.dimensions), o))
        })
        .collect();

    let mut label_ids: Vec<String> = scene
        .objects
        .iter()
        .filter(|o| o.primitive == PrimitiveKind::Text && o.label_target.is_some())
        .map(|o| o.id.clone())
        .collect();
    label_ids.sort();

    let mut placed_boxes: Vec<BBox> = Vec::new();
    let mut placed = 0usize;

    for label_id in label_ids {
        let Some(label) = scene.object(&label_id) else { continue };
        let target_id = label.label_target.clone().unwrap_or_default();
        let Some(target) = scene.object(&target_id) else { continue };
        let Some(target_pos) = target.position else { continue };

        let target_center = target_pos.center(&target.dimensions);
        let (tw, th) = (target.dimensions.width(), target.dimensions.height());
        let (lw, lh) = (label.dimensions.width(), label.dimensions.height());

        let mut best: Option<((f64, f64), f64)> = None;
        for (dx, dy, bonus) in DIRECTIONS {
            let candidate = (
                target_center.0 + dx * (tw / 2.0 + lw / 2.0 + LABEL_GAP),
                target_center.1 + dy * (th / 2.0 + lh / 2.0 + LABEL_GAP),
            );
            let candidate_box = BBox::around(candidate, label);

            let mut score = bonus;
            if !obstacle_boxes.iter().any(|b| b.overlaps(&candidate_box)) {
                score += 10.0;
            }
            if !placed_boxes.iter().any(|b| b.overlaps(&candidate_box)) {
                score += 10.0;
            }
            if candidate_box.inside(scene.canvas.width, scene.canvas.height) {
                score += 5.0;
            }

            // strictly better wins; ties keep the earlier (preferred)
            // direction
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }

        if let Some((position, _)) = best {
            let label = scene.object_mut(&label_id).expect("label exists");
            label.position = Some(Position::new(position.0, position.1));
            placed_boxes.push(BBox::around(
                position,
                scene.object(&label_id).expect("label exists"),
            ));
            placed += 1;
        }
    }

    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{Canvas, Dimensions, SceneObject};

    fn scene_with_block_and_label() -> Scene {
        let mut scene = Scene::new(Canvas::default());
        let mut block =
            SceneObject::new("block", PrimitiveKind::Rect, Dimensions::rect(100.0, 60.0));
        block.position = Some(Position::new(600.0, 400.0));
        scene.objects.push(block);

        let mut label =
            SceneObject::new("block__label", PrimitiveKind::Text, Dimensions::rect(48.0, 18.0));
        label.label_target = Some("block".to_string());
        scene.objects.push(label);
        scene
    }

    #[test]
    fn label_lands_above_clear_target() {
        let mut scene = scene_with_block_and_label();
        let placed = place_labels(&mut scene);
        assert_eq!(placed, 1);
        let label = scene.object("block__label").unwrap();
        let position = label.position.expect("placed");
        assert!(position.y < 400.0, "expected above, got y={}", position.y);
    }

    #[test]
    fn second_label_avoids_the_first() {
        let mut scene = scene_with_block_and_label();
        let mut second =
            SceneObject::new("block__label2", PrimitiveKind::Text, Dimensions::rect(48.0, 18.0));
        second.label_target = Some("block".to_string());
        scene.objects.push(second);

        place_labels(&mut scene);
        let a = scene.object("block__label").unwrap();
        let b = scene.object("block__label2").unwrap();
        let box_a = BBox::around(a.position.unwrap().center(&a.dimensions), a);
        let box_b = BBox::around(b.position.unwrap().center(&b.dimensions), b);
        assert!(!box_a.overlaps(&box_b));
    }

    #[test]
    fn crowded_target_pushes_label_sideways() {
        let mut scene = scene_with_block_and_label();
        // a slab sitting directly above the block blocks the preferred spot
        let mut slab = SceneObject::new("slab", PrimitiveKind::Rect, Dimensions::rect(300.0, 80.0));
        slab.position = Some(Position::new(600.0, 320.0));
        scene.objects.push(slab);

        place_labels(&mut scene);
        let label = scene.object("block__label").unwrap();
        let position = label.position.unwrap();
        let label_box = BBox::around(position.center(&label.dimensions), label);
        let slab = scene.object("slab").unwrap();
        let slab_box = BBox::around(slab.position.unwrap().center(&slab.dimensions), slab);
        assert!(!label_box.overlaps(&slab_box));
    }
}
