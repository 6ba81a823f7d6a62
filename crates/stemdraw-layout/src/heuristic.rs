use crate::geometry::{solvable, BBox, Centers};
use std::collections::BTreeSet;
use stemdraw_core::{
    constraint::{alignment_deferred, distance_pairs, pair_key},
    Constraint, ConstraintKind, Scene, SceneObject,
};

const TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone)]
pub struct HeuristicOutcome {
    pub centers: Centers,
    pub iterations: usize,
}

/// Tier 3: two-phase iterative nudge. Phase one is the domain-aware seed
/// (done by the caller); phase two repeatedly applies one constraint at a
/// time in priority order. Every application moves at most one object
/// along at most the axis the constraint governs. Converges when the
/// largest movement in a full pass drops below tolerance.
///
/// Two hard rules from the constraint vocabulary are enforced here:
/// alignment defers to distance on a shared pair, and the pairwise
/// push-apart pass runs only when the scene has no explicit constraints.
pub fn solve(scene: &Scene, seeds: &Centers, max_iterations: usize) -> HeuristicOutcome {
    let mut centers = seeds.clone();
    let governed = distance_pairs(&scene.constraints);
    let stacked_triplets = stacked_id_sets(&scene.constraints);

    let mut ordered: Vec<&Constraint> = scene.constraints.iter().collect();
    ordered.sort_by_key(|c| std::cmp::Reverse(c.priority));

    let mut iterations = 0;
    for _ in 0..max_iterations {
        iterations += 1;
        let mut max_delta: f64 = 0.0;

        for &constraint in &ordered {
            let delta =
                apply_constraint(scene, &mut centers, constraint, &governed, &stacked_triplets);
            max_delta = max_delta.max(delta);
        }

        if scene.constraints.is_empty() {
            max_delta = max_delta.max(push_apart(scene, &mut centers));
        }

        if max_delta < TOLERANCE {
            break;
        }
    }

    HeuristicOutcome {
        centers,
        iterations,
    }
}

fn stacked_id_sets(constraints: &[Constraint]) -> Vec<BTreeSet<String>> {
    constraints
        .iter()
        .filter_map(|c| match &c.kind {
            ConstraintKind::StackedVertically { ids }
            | ConstraintKind::StackedHorizontally { ids } => {
                Some(ids.iter().cloned().collect())
            }
            _ => None,
        })
        .collect()
}

fn object<'a>(scene: &'a Scene, id: &str) -> Option<&'a SceneObject> {
    scene.objects.iter().find(|o| o.id == id)
}

fn apply_constraint(
    scene: &Scene,
    centers: &mut Centers,
    constraint: &Constraint,
    governed: &BTreeSet<(String, String)>,
    stacked_triplets: &[BTreeSet<String>],
) -> f64 {
    match &constraint.kind {
        ConstraintKind::AlignedHorizontally { ids } => {
            if alignment_deferred(constraint, governed) {
                return align_skipping_governed(centers, ids, governed, true);
            }
            align(centers, ids, true)
        }
        ConstraintKind::AlignedVertically { ids } => {
            if alignment_deferred(constraint, governed) {
                return align_skipping_governed(centers, ids, governed, false);
            }
            align(centers, ids, false)
        }
        // parallelism is a rotation property; centers are untouched
        ConstraintKind::Parallel { .. } => 0.0,
        ConstraintKind::Distance { a, b, spec } => {
            let (Some(&ca), Some(&cb)) = (centers.get(a), centers.get(b)) else {
                return 0.0;
            };
            let Some(target) = spec.target() else { return 0.0 };
            let (dx, dy) = (cb.0 - ca.0, cb.1 - ca.1);
            let current = (dx * dx + dy * dy).sqrt();
            if spec.satisfied_by(current, TOLERANCE) {
                return 0.0;
            }
            // move b along the dominant axis only; the cross-axis offset
            // stays what it is
            if dy.abs() >= dx.abs() {
                let rest = (target * target - dx * dx).max(0.0).sqrt();
                let sign = if dy >= 0.0 { 1.0 } else { -1.0 };
                let new_y = ca.1 + sign * rest;
                let delta = (new_y - cb.1).abs();
                centers.insert(b.clone(), (cb.0, new_y));
                delta
            } else {
                let rest = (target * target - dy * dy).max(0.0).sqrt();
                let sign = if dx >= 0.0 { 1.0 } else { -1.0 };
                let new_x = ca.0 + sign * rest;
                let delta = (new_x - cb.0).abs();
                centers.insert(b.clone(), (new_x, cb.1));
                delta
            }
        }
        ConstraintKind::Between {
            inner,
            first,
            second,
        } => {
            // a stack over the same triplet already fixes the ordering
            let triplet: BTreeSet<String> =
                [inner.clone(), first.clone(), second.clone()].into_iter().collect();
            if stacked_triplets.iter().any(|s| triplet.is_subset(s)) {
                return 0.0;
            }
            let (Some(&ci), Some(&cf), Some(&cs)) =
                (centers.get(inner), centers.get(first), centers.get(second))
            else {
                return 0.0;
            };
            let (dx, dy) = (cs.0 - cf.0, cs.1 - cf.1);
            if dy.abs() >= dx.abs() {
                let lo = cf.1.min(cs.1);
                let hi = cf.1.max(cs.1);
                let clamped = ci.1.clamp(lo, hi);
                // already strictly between: leave it where it is
                let new_y = if (lo..=hi).contains(&ci.1) {
                    ci.1
                } else {
                    clamped
                };
                let delta = (new_y - ci.1).abs();
                centers.insert(inner.clone(), (ci.0, new_y));
                delta
            } else {
                let lo = cf.0.min(cs.0);
                let hi = cf.0.max(cs.0);
                let new_x = if (lo..=hi).contains(&ci.0) {
                    ci.0
                } else {
                    ci.0.clamp(lo, hi)
                };
                let delta = (new_x - ci.0).abs();
                centers.insert(inner.clone(), (new_x, ci.1));
                delta
            }
        }
        ConstraintKind::Adjacent { a, b } => {
            let (Some(oa), Some(ob)) = (object(scene, a), object(scene, b)) else {
                return 0.0;
            };
            let (Some(&ca), Some(&cb)) = (centers.get(a), centers.get(b)) else {
                return 0.0;
            };
            let (dx, dy) = (cb.0 - ca.0, cb.1 - ca.1);
            // touch along the dominant axis only
            if dx.abs() >= dy.abs() {
                let target_x = if dx >= 0.0 {
                    cb.0 - ob.dimensions.width() / 2.0 - oa.dimensions.width() / 2.0
                } else {
                    cb.0 + ob.dimensions.width() / 2.0 + oa.dimensions.width() / 2.0
                };
                let delta = (target_x - ca.0).abs();
                centers.insert(a.clone(), (target_x, ca.1));
                delta
            } else {
                let target_y = if dy >= 0.0 {
                    cb.1 - ob.dimensions.height() / 2.0 - oa.dimensions.height() / 2.0
                } else {
                    cb.1 + ob.dimensions.height() / 2.0 + oa.dimensions.height() / 2.0
                };
                let delta = (target_y - ca.1).abs();
                centers.insert(a.clone(), (ca.0, target_y));
                delta
            }
        }
        ConstraintKind::Above { a, b, min_gap } => {
            ordering_nudge(scene, centers, a, b, *min_gap, Axis2::Y, true)
        }
        ConstraintKind::Below { a, b, min_gap } => {
            ordering_nudge(scene, centers, a, b, *min_gap, Axis2::Y, false)
        }
        ConstraintKind::LeftOf { a, b, min_gap } => {
            ordering_nudge(scene, centers, a, b, *min_gap, Axis2::X, true)
        }
        ConstraintKind::RightOf { a, b, min_gap } => {
            ordering_nudge(scene, centers, a, b, *min_gap, Axis2::X, false)
        }
        ConstraintKind::StackedVertically { ids } => stack(scene, centers, ids, Axis2::Y),
        ConstraintKind::StackedHorizontally { ids } => stack(scene, centers, ids, Axis2::X),
        ConstraintKind::Containment { inner, outers } => {
            contain(scene, centers, inner, outers)
        }
    }
}

fn align(centers: &mut Centers, ids: &[String], horizontal: bool) -> f64 {
    let mut max_delta: f64 = 0.0;
    let Some(&anchor) = ids.first().and_then(|id| centers.get(id)) else {
        return 0.0;
    };
    for id in &ids[1..] {
        let Some(&c) = centers.get(id) else { continue };
        if horizontal {
            max_delta = max_delta.max((c.1 - anchor.1).abs());
            centers.insert(id.clone(), (c.0, anchor.1));
        } else {
            max_delta = max_delta.max((c.0 - anchor.0).abs());
            centers.insert(id.clone(), (anchor.0, c.1));
        }
    }
    max_delta
}

/// Alignment where at least one consecutive pair is distance-governed:
/// only the ungoverned pairs are pinned; the governed pairs keep the
/// separation their distance constraint owns.
fn align_skipping_governed(
    centers: &mut Centers,
    ids: &[String],
    governed: &BTreeSet<(String, String)>,
    horizontal: bool,
) -> f64 {
    let mut max_delta: f64 = 0.0;
    for window in ids.windows(2) {
        let (a, b) = (&window[0], &window[1]);
        if governed.contains(&pair_key(a, b)) {
            tracing::debug!(a = %a, b = %b, "alignment deferred to distance constraint");
            continue;
        }
        let (Some(&ca), Some(&cb)) = (centers.get(a), centers.get(b)) else {
            continue;
        };
        if horizontal {
            max_delta = max_delta.max((cb.1 - ca.1).abs());
            centers.insert(b.clone(), (cb.0, ca.1));
        } else {
            max_delta = max_delta.max((cb.0 - ca.0).abs());
            centers.insert(b.clone(), (ca.0, cb.1));
        }
    }
    max_delta
}

#[derive(Clone, Copy, PartialEq)]
enum Axis2 {
    X,
    Y,
}

/// `a` strictly before (`before=true`) or after `b` on the axis, with at
/// least `min_gap` between facing edges. Moves `a` only.
fn ordering_nudge(
    scene: &Scene,
    centers: &mut Centers,
    a: &str,
    b: &str,
    min_gap: f64,
    axis: Axis2,
    before: bool,
) -> f64 {
    let (Some(oa), Some(ob)) = (object(scene, a), object(scene, b)) else {
        return 0.0;
    };
    let (Some(&ca), Some(&cb)) = (centers.get(a), centers.get(b)) else {
        return 0.0;
    };
    let (half_a, half_b, pos_a, pos_b) = match axis {
        Axis2::X => (
            oa.dimensions.width() / 2.0,
            ob.dimensions.width() / 2.0,
            ca.0,
            cb.0,
        ),
        Axis2::Y => (
            oa.dimensions.height() / 2.0,
            ob.dimensions.height() / 2.0,
            ca.1,
            cb.1,
        ),
    };
    let limit = if before {
        pos_b - half_b - min_gap - half_a
    } else {
        pos_b + half_b + min_gap + half_a
    };
    let violated = if before {
        pos_a > limit + TOLERANCE
    } else {
        pos_a < limit - TOLERANCE
    };
    if !violated {
        return 0.0;
    }
    let delta = (limit - pos_a).abs();
    match axis {
        Axis2::X => centers.insert(a.to_string(), (limit, ca.1)),
        Axis2::Y => centers.insert(a.to_string(), (ca.0, limit)),
    };
    delta
}

/// Ordered stacking, first object anchors, no gap. One violating pair is
/// fixed per pass; the rest follow on later iterations.
fn stack(scene: &Scene, centers: &mut Centers, ids: &[String], axis: Axis2) -> f64 {
    for window in ids.windows(2) {
        let (prev, next) = (&window[0], &window[1]);
        let (Some(op), Some(on)) = (object(scene, prev), object(scene, next)) else {
            continue;
        };
        let (Some(&cp), Some(&cn)) = (centers.get(prev), centers.get(next)) else {
            continue;
        };
        match axis {
            Axis2::Y => {
                let desired = cp.1 + op.dimensions.height() / 2.0 + on.dimensions.height() / 2.0;
                if (cn.1 - desired).abs() > TOLERANCE {
                    let delta = (cn.1 - desired).abs();
                    centers.insert(next.clone(), (cn.0, desired));
                    return delta;
                }
            }
            Axis2::X => {
                let desired = cp.0 + op.dimensions.width() / 2.0 + on.dimensions.width() / 2.0;
                if (cn.0 - desired).abs() > TOLERANCE {
                    let delta = (cn.0 - desired).abs();
                    centers.insert(next.clone(), (desired, cn.1));
                    return delta;
                }
            }
        }
    }
    0.0
}

fn contain(scene: &Scene, centers: &mut Centers, inner: &str, outers: &[String]) -> f64 {
    let Some(oi) = object(scene, inner) else { return 0.0 };
    let Some(&ci) = centers.get(inner) else { return 0.0 };

    // union of the outer boxes
    let mut union: Option<BBox> = None;
    for outer in outers {
        let (Some(oo), Some(&co)) = (object(scene, outer), centers.get(outer)) else {
            continue;
        };
        let bbox = BBox::around(co, oo);
        union = Some(match union {
            None => bbox,
            Some(u) => BBox {
                min_x: u.min_x.min(bbox.min_x),
                min_y: u.min_y.min(bbox.min_y),
                max_x: u.max_x.max(bbox.max_x),
                max_y: u.max_y.max(bbox.max_y),
            },
        });
    }
    let Some(union) = union else { return 0.0 };

    let inner_box = BBox::around(ci, oi);
    let push_x = if inner_box.min_x < union.min_x {
        union.min_x - inner_box.min_x
    } else if inner_box.max_x > union.max_x {
        union.max_x - inner_box.max_x
    } else {
        0.0
    };
    let push_y = if inner_box.min_y < union.min_y {
        union.min_y - inner_box.min_y
    } else if inner_box.max_y > union.max_y {
        union.max_y - inner_box.max_y
    } else {
        0.0
    };

    // dominant violation axis only
    if push_x.abs() >= push_y.abs() && push_x.abs() > TOLERANCE {
        centers.insert(inner.to_string(), (ci.0 + push_x, ci.1));
        push_x.abs()
    } else if push_y.abs() > TOLERANCE {
        centers.insert(inner.to_string(), (ci.0, ci.1 + push_y));
        push_y.abs()
    } else {
        0.0
    }
}

/// Pairwise overlap resolution for unconstrained scenes only. Never runs
/// when explicit constraints exist: a push-apart pass would destroy the
/// separations and alignments they encode.
fn push_apart(scene: &Scene, centers: &mut Centers) -> f64 {
    let objects: Vec<&SceneObject> = solvable(scene).collect();
    let mut max_delta: f64 = 0.0;
    for i in 0..objects.len() {
        for j in (i + 1)..objects.len() {
            let (a, b) = (objects[i], objects[j]);
            let (Some(&ca), Some(&cb)) = (centers.get(&a.id), centers.get(&b.id)) else {
                continue;
            };
            let box_a = BBox::around(ca, a);
            let box_b = BBox::around(cb, b);
            if !box_a.overlaps(&box_b) {
                continue;
            }
            let overlap_x = (box_a.max_x.min(box_b.max_x)) - (box_a.min_x.max(box_b.min_x));
            let overlap_y = (box_a.max_y.min(box_b.max_y)) - (box_a.min_y.max(box_b.min_y));
            // clear along the cheaper axis, moving the later object
            if overlap_x <= overlap_y {
                let sign = if cb.0 >= ca.0 { 1.0 } else { -1.0 };
                centers.insert(b.id.clone(), (cb.0 + sign * (overlap_x + 2.0), cb.1));
                max_delta = max_delta.max(overlap_x + 2.0);
            } else {
                let sign = if cb.1 >= ca.1 { 1.0 } else { -1.0 };
                centers.insert(b.id.clone(), (cb.0, cb.1 + sign * (overlap_y + 2.0)));
                max_delta = max_delta.max(overlap_y + 2.0);
            }
        }
    }
    max_delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::initial_positions;
    use stemdraw_core::{Canvas, Dimensions, DistanceSpec, PrimitiveKind};

    fn rect(id: &str, w: f64, h: f64) -> SceneObject {
        SceneObject::new(id, PrimitiveKind::Rect, Dimensions::rect(w, h))
    }

    fn solve_scene(scene: &Scene) -> Centers {
        let seeds = initial_positions(scene);
        solve(scene, &seeds, 50).centers
    }

    #[test]
    fn distance_beats_alignment_on_shared_pair() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(rect("a", 40.0, 40.0));
        scene.objects.push(rect("b", 40.0, 40.0));
        scene.constraints.push(Constraint::critical(ConstraintKind::Distance {
            a: "a".to_string(),
            b: "b".to_string(),
            spec: DistanceSpec::Exact(100.0),
        }));
        scene
            .constraints
            .push(Constraint::high(ConstraintKind::AlignedHorizontally {
                ids: vec!["a".to_string(), "b".to_string()],
            }));

        let centers = solve_scene(&scene);
        let d = crate::geometry::euclidean(centers["a"], centers["b"]);
        assert!((d - 100.0).abs() < 1.0, "distance not honored: {}", d);
    }

    #[test]
    fn above_and_adjacent_stack_block_on_support() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(rect("block", 90.0, 64.0));
        scene.objects.push(rect("incline", 340.0, 190.0));
        scene.constraints.push(Constraint::critical(ConstraintKind::Above {
            a: "block".to_string(),
            b: "incline".to_string(),
            min_gap: 0.0,
        }));
        scene.constraints.push(Constraint::high(ConstraintKind::Adjacent {
            a: "block".to_string(),
            b: "incline".to_string(),
        }));

        let centers = solve_scene(&scene);
        let block_bottom = centers["block"].1 + 32.0;
        let incline_top = centers["incline"].1 - 95.0;
        assert!(
            (block_bottom - incline_top).abs() < 2.0,
            "block does not rest on incline: bottom={} top={}",
            block_bottom,
            incline_top
        );
    }

    #[test]
    fn left_of_chain_orders_components() {
        let mut scene = Scene::new(Canvas::default());
        for id in ["battery", "resistor", "switch"] {
            scene.objects.push(rect(id, 64.0, 40.0));
        }
        scene
            .constraints
            .push(Constraint::high(ConstraintKind::AlignedHorizontally {
                ids: vec![
                    "battery".to_string(),
                    "resistor".to_string(),
                    "switch".to_string(),
                ],
            }));
        for pair in [("battery", "resistor"), ("resistor", "switch")] {
            scene.constraints.push(Constraint::critical(ConstraintKind::LeftOf {
                a: pair.0.to_string(),
                b: pair.1.to_string(),
                min_gap: 120.0,
            }));
        }

        let centers = solve_scene(&scene);
        assert!(centers["battery"].0 < centers["resistor"].0);
        assert!(centers["resistor"].0 < centers["switch"].0);
        assert!((centers["battery"].1 - centers["resistor"].1).abs() < 1.0);
        assert!((centers["resistor"].1 - centers["switch"].1).abs() < 1.0);
    }

    #[test]
    fn push_apart_only_without_constraints() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(rect("a", 100.0, 100.0));
        scene.objects.push(rect("b", 100.0, 100.0));
        // same seed cell would overlap; no constraints → push apart runs
        let mut seeds = Centers::new();
        seeds.insert("a".to_string(), (400.0, 400.0));
        seeds.insert("b".to_string(), (420.0, 400.0));
        let outcome = solve(&scene, &seeds, 50);
        let box_a = BBox::around(outcome.centers["a"], &scene.objects[0]);
        let box_b = BBox::around(outcome.centers["b"], &scene.objects[1]);
        assert!(!box_a.overlaps(&box_b));
    }

    #[test]
    fn between_pulls_inner_inside_the_span() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(rect("top", 400.0, 10.0));
        scene.objects.push(rect("bottom", 400.0, 10.0));
        scene.objects.push(rect("inner", 100.0, 80.0));
        scene.constraints.push(Constraint::critical(ConstraintKind::Between {
            inner: "inner".to_string(),
            first: "top".to_string(),
            second: "bottom".to_string(),
        }));
        let mut seeds = Centers::new();
        seeds.insert("top".to_string(), (600.0, 200.0));
        seeds.insert("bottom".to_string(), (600.0, 600.0));
        seeds.insert("inner".to_string(), (600.0, 50.0));

        let outcome = solve(&scene, &seeds, 50);
        let y = outcome.centers["inner"].1;
        assert!((200.0..=600.0).contains(&y), "inner outside span: {}", y);
    }
}
