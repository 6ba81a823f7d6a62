use super::RELATIVE_TOLERANCE;
use std::collections::BTreeMap;
use stemdraw_core::{
    CanonicalSpec, Domain, DomainRule, IssueKind, Scene, ValidationIssue,
};

/// Energy conservation across declared stages: KE + PE must stay
/// constant within five percent. Stages come from `stage`, `ke` and
/// `pe` properties on scene objects; with fewer than two stages there
/// is nothing to compare.
pub struct EnergyConservationRule;

impl DomainRule for EnergyConservationRule {
    fn name(&self) -> &'static str {
        "energy_conservation"
    }

    fn applies(&self, domain: Domain) -> bool {
        matches!(domain, Domain::Mechanics | Domain::Thermodynamics)
    }

    fn check(&self, scene: &Scene, _spec: &CanonicalSpec) -> Vec<ValidationIssue> {
        let mut totals: BTreeMap<String, (f64, Vec<String>)> = BTreeMap::new();
        for object in &scene.objects {
            let stage = object.properties.get("stage").and_then(|v| v.as_str());
            let ke = object.properties.get("ke").and_then(|v| v.as_num());
            let pe = object.properties.get("pe").and_then(|v| v.as_num());
            if let (Some(stage), Some(ke), Some(pe)) = (stage, ke, pe) {
                let entry = totals.entry(stage.to_string()).or_insert((0.0, Vec::new()));
                entry.0 += ke + pe;
                entry.1.push(object.id.clone());
            }
        }
        if totals.len() < 2 {
            return Vec::new();
        }

        let reference = totals.values().next().map(|(t, _)| *t).unwrap_or(0.0);
        if reference == 0.0 {
            return Vec::new();
        }
        let mut issues = Vec::new();
        for (stage, (total, ids)) in &totals {
            if ((total - reference) / reference).abs() > RELATIVE_TOLERANCE {
                issues.push(ValidationIssue::new(
                    IssueKind::EnergyDrift,
                    format!(
                        "stage '{}' total energy {:.2} deviates from {:.2}",
                        stage, total, reference
                    ),
                    ids.clone(),
                ));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{AttrValue, Canvas, Dimensions, PrimitiveKind, SceneObject};

    fn stage_object(id: &str, stage: &str, ke: f64, pe: f64) -> SceneObject {
        let mut object = SceneObject::new(id, PrimitiveKind::Block, Dimensions::rect(40.0, 40.0));
        object
            .properties
            .insert("stage".to_string(), AttrValue::Str(stage.to_string()));
        object.properties.insert("ke".to_string(), AttrValue::Num(ke));
        object.properties.insert("pe".to_string(), AttrValue::Num(pe));
        object
    }

    fn spec() -> CanonicalSpec {
        CanonicalSpec {
            domain: Domain::Mechanics,
            problem_type: "energy".to_string(),
            objects: vec![],
            relationships: vec![],
            constraints: vec![],
            complexity_score: 0.3,
            raw_text: None,
        }
    }

    #[test]
    fn conserved_energy_passes() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(stage_object("start", "initial", 0.0, 100.0));
        scene.objects.push(stage_object("end", "final", 98.0, 0.0));
        assert!(EnergyConservationRule.check(&scene, &spec()).is_empty());
    }

    #[test]
    fn leaking_energy_is_flagged() {
        let mut scene = Scene::new(Canvas::default());
        scene.objects.push(stage_object("start", "initial", 0.0, 100.0));
        scene.objects.push(stage_object("end", "final", 60.0, 0.0));
        let issues = EnergyConservationRule.check(&scene, &spec());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::EnergyDrift);
    }
}
