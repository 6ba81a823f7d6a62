use stemdraw_core::{AutoFixHint, Layer, Position, PrimitiveKind, Scene, ValidationReport};
use stemdraw_layout::{place_labels, LayoutSolver};
use stemdraw_validate::ValidatorSet;

#[derive(Debug, Clone)]
pub struct RefineOutcome {
    pub iterations: u32,
    pub report: ValidationReport,
}

/// Bounded auto-fix ↔ re-validate loop. Each iteration applies the safe,
/// local fixes the validators suggested (re-center, layer bump, label
/// re-placement), re-solves layout only when a fix moved a
/// constraint-referenced object, then re-validates. Stops at the target
/// score or when no fixable issue remains.
pub fn refine(
    scene: &mut Scene,
    validators: &ValidatorSet,
    solver: &LayoutSolver,
    max_iterations: u32,
    target_score: f64,
) -> RefineOutcome {
    let mut total_fixes = 0u32;
    let mut iterations = 0u32;
    let mut report = validators.check_spatial(scene);

    while iterations < max_iterations {
        if report.score >= target_score {
            break;
        }

        iterations += 1;
        let mut fixes_this_round = 0u32;
        let mut layout_affected = false;

        let hints: Vec<AutoFixHint> = report
            .errors
            .iter()
            .chain(report.warnings.iter())
            .filter_map(|issue| issue.fix_hint.clone())
            .collect();

        for hint in hints {
            match hint {
                AutoFixHint::RecenterInCanvas { id } => {
                    if recenter(scene, &id) {
                        fixes_this_round += 1;
                        layout_affected |= scene
                            .constraints
                            .iter()
                            .any(|c| c.object_ids().contains(&id.as_str()));
                    }
                }
                AutoFixHint::SwapZOrder { above, .. } => {
                    if raise_layer(scene, &above) {
                        fixes_this_round += 1;
                    }
                }
                AutoFixHint::RelabelDirection { .. } => {
                    place_labels(scene);
                    fixes_this_round += 1;
                }
            }
        }

        if fixes_this_round == 0 {
            break;
        }
        total_fixes += fixes_this_round;

        if layout_affected {
            if let Err(e) = solver.solve(scene) {
                tracing::warn!("re-solve during refinement failed: {}", e);
            }
            place_labels(scene);
        }

        report = validators.check_spatial(scene);
    }

    report.auto_fixes_applied = total_fixes;
    RefineOutcome { iterations, report }
}

/// Clamp an out-of-bounds object's center back inside the canvas.
fn recenter(scene: &mut Scene, id: &str) -> bool {
    let (width, height) = (scene.canvas.width, scene.canvas.height);
    let Some(object) = scene.object_mut(id) else { return false };
    let Some(position) = object.position else { return false };
    let (half_w, half_h) = (
        object.dimensions.width() / 2.0,
        object.dimensions.height() / 2.0,
    );
    let center = position.center(&object.dimensions);
    let clamped = (
        center.0.clamp(half_w, (width - half_w).max(half_w)),
        center.1.clamp(half_h, (height - half_h).max(half_h)),
    );
    if clamped == center {
        return false;
    }
    let mut fixed = Position::new(clamped.0, clamped.1);
    fixed.rotation = position.rotation;
    object.position = Some(fixed);
    true
}

/// Raise an object to the lowest layer its kind belongs on.
fn raise_layer(scene: &mut Scene, id: &str) -> bool {
    let Some(object) = scene.object_mut(id) else { return false };
    let expected = match object.primitive {
        PrimitiveKind::Text => Layer::Labels,
        PrimitiveKind::Wire | PrimitiveKind::Line | PrimitiveKind::Arrow | PrimitiveKind::Bond => {
            Layer::Lines
        }
        _ => Layer::Shapes,
    };
    if object.layer < expected && !object.properties.contains_key("region") {
        object.layer = expected;
        true
    } else {
        false
    }
}
