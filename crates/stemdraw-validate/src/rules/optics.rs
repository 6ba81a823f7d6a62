use super::RELATIVE_TOLERANCE;
use stemdraw_core::{
    CanonicalSpec, Domain, DomainRule, IssueKind, PrimitiveKind, Scene, ValidationIssue,
};

/// Thin-lens equation: 1/f = 1/d_o + 1/d_i within five percent, judged
/// when a lens object declares all three values.
pub struct LensEquationRule;

impl DomainRule for LensEquationRule {
    fn name(&self) -> &'static str {
        "lens_equation"
    }

    fn applies(&self, domain: Domain) -> bool {
        domain == Domain::Optics
    }

    fn check(&self, scene: &Scene, _spec: &CanonicalSpec) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for lens in scene
            .objects
            .iter()
            .filter(|o| o.primitive == PrimitiveKind::Lens)
        {
            let f = lens.properties.get("focal_length").and_then(|v| v.as_num());
            let d_o = lens
                .properties
                .get("object_distance")
                .and_then(|v| v.as_num());
            let d_i = lens
                .properties
                .get("image_distance")
                .and_then(|v| v.as_num());
            let (Some(f), Some(d_o), Some(d_i)) = (f, d_o, d_i) else {
                continue;
            };
            if f == 0.0 || d_o == 0.0 || d_i == 0.0 {
                continue;
            }
            let lhs = 1.0 / f;
            let rhs = 1.0 / d_o + 1.0 / d_i;
            if ((lhs - rhs) / lhs).abs() > RELATIVE_TOLERANCE {
                issues.push(ValidationIssue::new(
                    IssueKind::LensEquation,
                    format!(
                        "lens '{}' violates 1/f = 1/d_o + 1/d_i (1/{} vs 1/{} + 1/{})",
                        lens.id, f, d_o, d_i
                    ),
                    vec![lens.id.clone()],
                ));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{AttrValue, Canvas, Dimensions, SceneObject};

    fn lens(f: f64, d_o: f64, d_i: f64) -> SceneObject {
        let mut lens = SceneObject::new("lens", PrimitiveKind::Lens, Dimensions::rect(28.0, 180.0));
        lens.properties
            .insert("focal_length".to_string(), AttrValue::Num(f));
        lens.properties
            .insert("object_distance".to_string(), AttrValue::Num(d_o));
        lens.properties
            .insert("image_distance".to_string(), AttrValue::Num(d_i));
        lens
    }

    fn spec() -> CanonicalSpec {
        CanonicalSpec {
            domain: Domain::Optics,
            problem_type: "ray_diagram".to_string(),
            objects: vec![],
            relationships: vec![],
            constraints: vec![],
            complexity_score: 0.3,
            raw_text: None,
        }
    }

    #[test]
    fn satisfied_lens_equation_passes() {
        let mut scene = Scene::new(Canvas::default());
        // 1/10 = 1/15 + 1/30
        scene.objects.push(lens(10.0, 15.0, 30.0));
        assert!(LensEquationRule.check(&scene, &spec()).is_empty());
    }

    #[test]
    fn violated_lens_equation_is_flagged() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(lens(10.0, 15.0, 60.0));
        let issues = LensEquationRule.check(&scene, &spec());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::LensEquation);
    }
}
