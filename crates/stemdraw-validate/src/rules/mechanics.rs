use super::RELATIVE_TOLERANCE;
use stemdraw_core::{
    CanonicalSpec, Domain, DomainRule, IssueKind, PrimitiveKind, Scene, SceneObject,
    ValidationIssue,
};

/// Static-body force balance: the vector sum of the declared forces must
/// be within five percent of zero. A force is declared when its arrow
/// carries an explicit magnitude; scenes whose arrows are directional
/// annotations only are not judged.
pub struct ForceEquilibriumRule;

fn force_vector(arrow: &SceneObject) -> Option<(f64, f64)> {
    let magnitude = arrow.properties.get("magnitude").and_then(|v| v.as_num())?;
    let rotation = arrow
        .properties
        .get("rotation_hint")
        .and_then(|v| v.as_num())
        .or(arrow.position.map(|p| p.rotation))
        .unwrap_or(0.0);
    // rotation 0 points up (screen -y), measured clockwise
    let radians = rotation.to_radians();
    Some((magnitude * radians.sin(), -magnitude * radians.cos()))
}

impl DomainRule for ForceEquilibriumRule {
    fn name(&self) -> &'static str {
        "force_equilibrium"
    }

    fn applies(&self, domain: Domain) -> bool {
        domain == Domain::Mechanics
    }

    fn check(&self, scene: &Scene, _spec: &CanonicalSpec) -> Vec<ValidationIssue> {
        let forces: Vec<(&SceneObject, (f64, f64))> = scene
            .objects
            .iter()
            .filter(|o| o.primitive == PrimitiveKind::Arrow)
            .filter_map(|o| force_vector(o).map(|v| (o, v)))
            .collect();
        if forces.len() < 2 {
            return Vec::new();
        }

        let (sum_x, sum_y) = forces
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (_, (fx, fy))| (sx + fx, sy + fy));
        let residual = (sum_x * sum_x + sum_y * sum_y).sqrt();
        let total: f64 = forces
            .iter()
            .map(|(_, (fx, fy))| (fx * fx + fy * fy).sqrt())
            .sum();

        if total > 0.0 && residual / total > RELATIVE_TOLERANCE {
            vec![ValidationIssue::new(
                IssueKind::ForceImbalance,
                format!(
                    "declared forces do not balance (residual {:.1}% of total)",
                    residual / total * 100.0
                ),
                forces.iter().map(|(o, _)| o.id.clone()).collect(),
            )]
        } else {
            Vec::new()
        }
    }
}
