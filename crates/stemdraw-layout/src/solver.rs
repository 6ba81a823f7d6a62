use crate::geometry::{is_connector, solvable, BBox, Centers};
use crate::{heuristic, seed, symbolic};
use std::collections::BTreeSet;
use stemdraw_core::{
    constraint::{distance_pairs, pair_key},
    Constraint, ConstraintKind, DiagramError, LayoutOutcome, LayoutTierId, Position, Priority,
    Result, Scene,
};

const EPSILON: f64 = 1.0;

/// The three-tier layout cascade. Tiers run in order (SMT, symbolic,
/// heuristic) until one produces positions satisfying every critical
/// constraint; the chosen tier and reason are recorded in the outcome.
pub struct LayoutSolver {
    enable_smt: bool,
    enable_symbolic: bool,
    smt_timeout_ms: u64,
    max_iterations: usize,
}

impl LayoutSolver {
    pub fn new(enable_smt: bool, enable_symbolic: bool, smt_timeout_ms: u64) -> Self {
        Self {
            enable_smt,
            enable_symbolic,
            smt_timeout_ms,
            max_iterations: 50,
        }
    }

    /// Which tiers this build can run (for the health endpoint).
    pub fn available_tiers() -> Vec<(LayoutTierId, bool)> {
        vec![
            (LayoutTierId::Smt, cfg!(feature = "smt")),
            (LayoutTierId::Symbolic, true),
            (LayoutTierId::Heuristic, true),
        ]
    }

    pub fn solve(&self, scene: &mut Scene) -> Result<LayoutOutcome> {
        scene
            .check_references()
            .map_err(DiagramError::Internal)?;

        if solvable(scene).next().is_none() {
            return Err(DiagramError::LayoutUnsat(
                "scene has no positionable objects".to_string(),
            ));
        }

        let seeds = seed::initial_positions(scene);

        if self.enable_smt && !cfg!(feature = "smt") {
            tracing::debug!("SMT tier requested but not compiled in; skipping");
        }

        #[cfg(feature = "smt")]
        if self.enable_smt {
            if let Some(outcome) = crate::smt::solve(scene, &seeds, self.smt_timeout_ms) {
                self.apply(scene, &outcome.centers);
                let violations = critical_violations(scene);
                if violations.is_empty() {
                    return Ok(LayoutOutcome {
                        tier: LayoutTierId::Smt,
                        reason: format!(
                            "SMT model found ({} constraint(s) dropped)",
                            outcome.dropped
                        ),
                        dropped_constraints: outcome.dropped,
                        iterations: 0,
                    });
                }
                tracing::warn!(?violations, "SMT solution failed critical check, falling through");
            }
        }

        if self.enable_symbolic {
            if let Some(centers) = symbolic::solve(scene) {
                self.apply(scene, &centers);
                let violations = critical_violations(scene);
                if violations.is_empty() {
                    return Ok(LayoutOutcome {
                        tier: LayoutTierId::Symbolic,
                        reason: "closed-form pattern matched".to_string(),
                        dropped_constraints: 0,
                        iterations: 0,
                    });
                }
                tracing::warn!(
                    ?violations,
                    "symbolic solution failed critical check, falling through"
                );
            }
        }

        let outcome = heuristic::solve(scene, &seeds, self.max_iterations);
        self.apply(scene, &outcome.centers);
        let violations = critical_violations(scene);
        if !violations.is_empty() {
            return Err(DiagramError::LayoutUnsat(format!(
                "heuristic tier left critical violations: {}",
                violations.join("; ")
            )));
        }
        Ok(LayoutOutcome {
            tier: LayoutTierId::Heuristic,
            reason: format!("converged after {} iteration(s)", outcome.iterations),
            dropped_constraints: 0,
            iterations: outcome.iterations,
        })
    }

    /// Write solved centers into the scene, derive connector midpoints
    /// and default label offsets, and resolve rotations (hints and
    /// parallelism).
    fn apply(&self, scene: &mut Scene, centers: &Centers) {
        for object in &mut scene.objects {
            if let Some(&(x, y)) = centers.get(&object.id) {
                let rotation = object
                    .properties
                    .get("rotation_hint")
                    .and_then(|v| v.as_num())
                    .unwrap_or(0.0);
                let mut position = Position::new(x, y);
                position.rotation = rotation;
                object.position = Some(position);
            }
        }

        // parallel pairs share the first object's rotation
        let parallels: Vec<(String, String)> = scene
            .constraints
            .iter()
            .filter_map(|c| match &c.kind {
                ConstraintKind::Parallel { a, b } => Some((a.clone(), b.clone())),
                _ => None,
            })
            .collect();
        for (a, b) in parallels {
            let rotation = scene
                .object(&a)
                .and_then(|o| o.position)
                .map(|p| p.rotation);
            if let (Some(rotation), Some(object)) = (rotation, scene.object_mut(&b)) {
                if let Some(position) = &mut object.position {
                    position.rotation = rotation;
                }
            }
        }

        // connectors (wires, bonds) sit at the midpoint of their endpoints
        let connector_ids: Vec<String> = scene
            .objects
            .iter()
            .filter(|o| is_connector(o))
            .map(|o| o.id.clone())
            .collect();
        for id in connector_ids {
            let endpoints = {
                let object = scene.object(&id).expect("connector exists");
                let from = object.properties.get("from").and_then(|v| v.as_str());
                let to = object.properties.get("to").and_then(|v| v.as_str());
                from.zip(to).and_then(|(f, t)| {
                    let fc = scene
                        .object(f)
                        .and_then(|o| o.position.map(|p| p.center(&o.dimensions)));
                    let tc = scene
                        .object(t)
                        .and_then(|o| o.position.map(|p| p.center(&o.dimensions)));
                    fc.zip(tc)
                })
            };
            if let Some((fc, tc)) = endpoints {
                let object = scene.object_mut(&id).expect("connector exists");
                object.position = Some(Position::new((fc.0 + tc.0) / 2.0, (fc.1 + tc.1) / 2.0));
            }
        }

        // default label offset (above the target); the label placer
        // refines these when it runs
        let label_ids: Vec<String> = scene
            .objects
            .iter()
            .filter(|o| o.label_target.is_some() && o.position.is_none())
            .map(|o| o.id.clone())
            .collect();
        for id in label_ids {
            let placement = {
                let label = scene.object(&id).expect("label exists");
                let target = label.label_target.as_deref().unwrap_or_default();
                scene.object(target).and_then(|t| {
                    t.position.map(|p| {
                        let c = p.center(&t.dimensions);
                        (
                            c.0,
                            c.1 - t.dimensions.height() / 2.0
                                - label.dimensions.height() / 2.0
                                - 8.0,
                        )
                    })
                })
            };
            if let Some((x, y)) = placement {
                let label = scene.object_mut(&id).expect("label exists");
                label.position = Some(Position::new(x, y));
            }
        }
    }
}

/// Critical constraints evaluated against the solved scene, within ε of
/// one pixel or one percent of the governed magnitude.
pub fn critical_violations(scene: &Scene) -> Vec<String> {
    violations_at(scene, Priority::Critical)
}

pub fn violations_at(scene: &Scene, min_priority: Priority) -> Vec<String> {
    let governed = distance_pairs(&scene.constraints);
    let stacked: Vec<BTreeSet<String>> = scene
        .constraints
        .iter()
        .filter_map(|c| match &c.kind {
            ConstraintKind::StackedVertically { ids }
            | ConstraintKind::StackedHorizontally { ids } => {
                Some(ids.iter().cloned().collect())
            }
            _ => None,
        })
        .collect();

    scene
        .constraints
        .iter()
        .filter(|c| c.priority >= min_priority)
        .filter_map(|c| describe_violation(scene, c, &governed, &stacked))
        .collect()
}

fn center_of(scene: &Scene, id: &str) -> Option<(f64, f64)> {
    let object = scene.object(id)?;
    object.position.map(|p| p.center(&object.dimensions))
}

fn describe_violation(
    scene: &Scene,
    constraint: &Constraint,
    governed: &BTreeSet<(String, String)>,
    stacked: &[BTreeSet<String>],
) -> Option<String> {
    match &constraint.kind {
        ConstraintKind::AlignedHorizontally { ids } => {
            for pair in ids.windows(2) {
                if governed.contains(&pair_key(&pair[0], &pair[1])) {
                    continue;
                }
                let (a, b) = (center_of(scene, &pair[0])?, center_of(scene, &pair[1])?);
                if (a.1 - b.1).abs() > EPSILON {
                    return Some(format!("{} and {} not horizontally aligned", pair[0], pair[1]));
                }
            }
            None
        }
        ConstraintKind::AlignedVertically { ids } => {
            for pair in ids.windows(2) {
                if governed.contains(&pair_key(&pair[0], &pair[1])) {
                    continue;
                }
                let (a, b) = (center_of(scene, &pair[0])?, center_of(scene, &pair[1])?);
                if (a.0 - b.0).abs() > EPSILON {
                    return Some(format!("{} and {} not vertically aligned", pair[0], pair[1]));
                }
            }
            None
        }
        ConstraintKind::Parallel { a, b } => {
            let ra = scene.object(a)?.position?.rotation;
            let rb = scene.object(b)?.position?.rotation;
            ((ra - rb).abs() > EPSILON).then(|| format!("{} and {} not parallel", a, b))
        }
        ConstraintKind::Distance { a, b, spec } => {
            let (ca, cb) = (center_of(scene, a)?, center_of(scene, b)?);
            let d = crate::geometry::euclidean(ca, cb);
            let tolerance = spec.target().map_or(EPSILON, |t| EPSILON.max(t * 0.01));
            (!spec.satisfied_by(d, tolerance))
                .then(|| format!("{} and {} at distance {:.1}", a, b, d))
        }
        ConstraintKind::Between {
            inner,
            first,
            second,
        } => {
            let triplet: BTreeSet<String> =
                [inner.clone(), first.clone(), second.clone()].into_iter().collect();
            if stacked.iter().any(|s| triplet.is_subset(s)) {
                return None;
            }
            let (ci, cf, cs) = (
                center_of(scene, inner)?,
                center_of(scene, first)?,
                center_of(scene, second)?,
            );
            let in_y_span =
                ci.1 >= cf.1.min(cs.1) - EPSILON && ci.1 <= cf.1.max(cs.1) + EPSILON;
            let in_x_span =
                ci.0 >= cf.0.min(cs.0) - EPSILON && ci.0 <= cf.0.max(cs.0) + EPSILON;
            (!(in_y_span || in_x_span))
                .then(|| format!("{} not between {} and {}", inner, first, second))
        }
        ConstraintKind::Adjacent { a, b } => {
            let (oa, ob) = (scene.object(a)?, scene.object(b)?);
            let (ca, cb) = (center_of(scene, a)?, center_of(scene, b)?);
            let box_a = BBox::around(ca, oa);
            let box_b = BBox::around(cb, ob);
            let gap_x = (box_a.min_x.max(box_b.min_x) - box_a.max_x.min(box_b.max_x)).max(0.0);
            let gap_y = (box_a.min_y.max(box_b.min_y) - box_a.max_y.min(box_b.max_y)).max(0.0);
            (gap_x > EPSILON && gap_y > EPSILON)
                .then(|| format!("{} and {} not adjacent", a, b))
        }
        ConstraintKind::Above { a, b, min_gap } => {
            ordering_violation(scene, a, b, *min_gap, true, true)
        }
        ConstraintKind::Below { a, b, min_gap } => {
            ordering_violation(scene, a, b, *min_gap, true, false)
        }
        ConstraintKind::LeftOf { a, b, min_gap } => {
            ordering_violation(scene, a, b, *min_gap, false, true)
        }
        ConstraintKind::RightOf { a, b, min_gap } => {
            ordering_violation(scene, a, b, *min_gap, false, false)
        }
        ConstraintKind::StackedVertically { ids } => {
            for pair in ids.windows(2) {
                let (oa, ob) = (scene.object(&pair[0])?, scene.object(&pair[1])?);
                let (ca, cb) = (center_of(scene, &pair[0])?, center_of(scene, &pair[1])?);
                let desired =
                    ca.1 + oa.dimensions.height() / 2.0 + ob.dimensions.height() / 2.0;
                if (cb.1 - desired).abs() > EPSILON {
                    return Some(format!("{} not stacked under {}", pair[1], pair[0]));
                }
            }
            None
        }
        ConstraintKind::StackedHorizontally { ids } => {
            for pair in ids.windows(2) {
                let (oa, ob) = (scene.object(&pair[0])?, scene.object(&pair[1])?);
                let (ca, cb) = (center_of(scene, &pair[0])?, center_of(scene, &pair[1])?);
                let desired = ca.0 + oa.dimensions.width() / 2.0 + ob.dimensions.width() / 2.0;
                if (cb.0 - desired).abs() > EPSILON {
                    return Some(format!("{} not stacked after {}", pair[1], pair[0]));
                }
            }
            None
        }
        ConstraintKind::Containment { inner, outers } => {
            let oi = scene.object(inner)?;
            let ci = center_of(scene, inner)?;
            let inner_box = BBox::around(ci, oi);
            let mut union: Option<BBox> = None;
            for outer in outers {
                let oo = scene.object(outer)?;
                let co = center_of(scene, outer)?;
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
            let union = union?;
            let inside = inner_box.min_x >= union.min_x - EPSILON
                && inner_box.max_x <= union.max_x + EPSILON
                && inner_box.min_y >= union.min_y - EPSILON
                && inner_box.max_y <= union.max_y + EPSILON;
            (!inside).then(|| format!("{} escapes its container", inner))
        }
    }
}

fn ordering_violation(
    scene: &Scene,
    a: &str,
    b: &str,
    min_gap: f64,
    vertical: bool,
    before: bool,
) -> Option<String> {
    let (oa, ob) = (scene.object(a)?, scene.object(b)?);
    let (ca, cb) = (center_of(scene, a)?, center_of(scene, b)?);
    let (half_a, half_b, pa, pb) = if vertical {
        (
            oa.dimensions.height() / 2.0,
            ob.dimensions.height() / 2.0,
            ca.1,
            cb.1,
        )
    } else {
        (
            oa.dimensions.width() / 2.0,
            ob.dimensions.width() / 2.0,
            ca.0,
            cb.0,
        )
    };
    let ok = if before {
        pa + half_a + min_gap <= pb - half_b + EPSILON
    } else {
        pa - half_a - min_gap >= pb + half_b - EPSILON
    };
    (!ok).then(|| {
        format!(
            "{} not {} {}",
            a,
            match (vertical, before) {
                (true, true) => "above",
                (true, false) => "below",
                (false, true) => "left of",
                (false, false) => "right of",
            },
            b
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{
        AttrValue, Canvas, Dimensions, DistanceSpec, PrimitiveKind, SceneObject,
    };

    fn rect(id: &str, w: f64, h: f64) -> SceneObject {
        SceneObject::new(id, PrimitiveKind::Rect, Dimensions::rect(w, h))
    }

    fn solver() -> LayoutSolver {
        LayoutSolver::new(false, true, 5_000)
    }

    #[test]
    fn single_object_layout_trivially_succeeds() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(rect("only", 100.0, 60.0));
        let outcome = solver().solve(&mut scene).unwrap();
        assert!(scene.object("only").unwrap().position.is_some());
        assert_eq!(outcome.tier, LayoutTierId::Heuristic);
    }

    #[test]
    fn all_positions_non_null_after_solve() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(rect("a", 80.0, 40.0));
        scene.objects.push(rect("b", 80.0, 40.0));
        let mut label = SceneObject::new(
            "a__label",
            PrimitiveKind::Text,
            Dimensions::rect(40.0, 18.0),
        );
        label.label_target = Some("a".to_string());
        scene.objects.push(label);
        let mut wire = SceneObject::new("wire_a_b", PrimitiveKind::Wire, Dimensions::rect(2.0, 2.0));
        wire.properties
            .insert("from".to_string(), AttrValue::Str("a".to_string()));
        wire.properties
            .insert("to".to_string(), AttrValue::Str("b".to_string()));
        scene.objects.push(wire);

        solver().solve(&mut scene).unwrap();
        assert!(scene.objects.iter().all(|o| o.position.is_some()));
    }

    #[test]
    fn empty_scene_is_unsat() {
        let mut scene = Scene::new(Canvas::default());
        let result = solver().solve(&mut scene);
        assert!(matches!(result, Err(DiagramError::LayoutUnsat(_))));
    }

    #[test]
    fn distance_and_alignment_pair_resolves_distance_first() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(rect("a", 40.0, 40.0));
        scene.objects.push(rect("b", 40.0, 40.0));
        scene
            .constraints
            .push(Constraint::critical(ConstraintKind::Distance {
                a: "a".to_string(),
                b: "b".to_string(),
                spec: DistanceSpec::Exact(100.0),
            }));
        scene
            .constraints
            .push(Constraint::critical(ConstraintKind::AlignedHorizontally {
                ids: vec!["a".to_string(), "b".to_string()],
            }));

        solver().solve(&mut scene).unwrap();
        let a = scene.object("a").unwrap().position.unwrap();
        let b = scene.object("b").unwrap().position.unwrap();
        let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
        assert!((d - 100.0).abs() < 2.0);
    }

    #[test]
    fn parallel_objects_share_rotation() {
        let mut scene = Scene::new(Canvas::default());
        let mut top = rect("top", 400.0, 10.0);
        top.properties
            .insert("rotation_hint".to_string(), AttrValue::Num(15.0));
        scene.objects.push(top);
        scene.objects.push(rect("bottom", 400.0, 10.0));
        scene
            .constraints
            .push(Constraint::critical(ConstraintKind::Parallel {
                a: "top".to_string(),
                b: "bottom".to_string(),
            }));
        scene
            .constraints
            .push(Constraint::critical(ConstraintKind::Distance {
                a: "top".to_string(),
                b: "bottom".to_string(),
                spec: DistanceSpec::Exact(260.0),
            }));

        solver().solve(&mut scene).unwrap();
        let top = scene.object("top").unwrap().position.unwrap();
        let bottom = scene.object("bottom").unwrap().position.unwrap();
        assert_eq!(top.rotation, bottom.rotation);
    }
}
