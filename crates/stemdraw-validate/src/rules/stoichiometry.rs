use std::collections::BTreeMap;
use stemdraw_core::{
    CanonicalSpec, Domain, DomainRule, IssueKind, Scene, ValidationIssue,
};
use stemdraw_nlp::adapters::ChemistryParser;

/// Atom balance for declared reactions: every element must appear with
/// the same total count on both sides, coefficients included. Reactions
/// come from the canonical spec's event objects (`lhs` / `rhs`
/// properties).
pub struct StoichiometryRule;

fn side_counts(side: &str) -> Option<BTreeMap<String, u32>> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for term in side.split('+') {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        let elements = ChemistryParser::parse_formula(term)?;
        for (element, count) in elements {
            *counts.entry(element).or_insert(0) += count;
        }
    }
    Some(counts)
}

impl DomainRule for StoichiometryRule {
    fn name(&self) -> &'static str {
        "stoichiometry"
    }

    fn applies(&self, domain: Domain) -> bool {
        domain == Domain::Chemistry
    }

    fn check(&self, _scene: &Scene, spec: &CanonicalSpec) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for object in &spec.objects {
            if object.object_type != "event" {
                continue;
            }
            let lhs = object.properties.get("lhs").and_then(|v| v.as_str());
            let rhs = object.properties.get("rhs").and_then(|v| v.as_str());
            let (Some(lhs), Some(rhs)) = (lhs, rhs) else { continue };
            let (Some(left), Some(right)) = (side_counts(lhs), side_counts(rhs)) else {
                // unparseable side: not judged
                continue;
            };

            let mut elements: Vec<&String> = left.keys().chain(right.keys()).collect();
            elements.sort();
            elements.dedup();
            for element in elements {
                let l = left.get(element).copied().unwrap_or(0);
                let r = right.get(element).copied().unwrap_or(0);
                if l != r {
                    issues.push(ValidationIssue::new(
                        IssueKind::Stoichiometry,
                        format!(
                            "element {} unbalanced in '{}': {} vs {}",
                            element, object.id, l, r
                        ),
                        vec![object.id.clone()],
                    ));
                }
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stemdraw_core::{AttrValue, Canvas, SpecObject};

    fn reaction_spec(lhs: &str, rhs: &str) -> CanonicalSpec {
        let mut properties = BTreeMap::new();
        properties.insert("lhs".to_string(), AttrValue::Str(lhs.to_string()));
        properties.insert("rhs".to_string(), AttrValue::Str(rhs.to_string()));
        CanonicalSpec {
            domain: Domain::Chemistry,
            problem_type: "reaction".to_string(),
            objects: vec![SpecObject {
                id: "reaction_1".to_string(),
                object_type: "event".to_string(),
                properties,
            }],
            relationships: vec![],
            constraints: vec![],
            complexity_score: 0.3,
            raw_text: None,
        }
    }

    #[test]
    fn balanced_combustion_passes() {
        let spec = reaction_spec("2H2 + O2", "2H2O");
        let scene = Scene::new(Canvas::default());
        assert!(StoichiometryRule.check(&scene, &spec).is_empty());
    }

    #[test]
    fn unbalanced_reaction_names_the_element() {
        let spec = reaction_spec("H2 + O2", "H2O");
        let scene = Scene::new(Canvas::default());
        let issues = StoichiometryRule.check(&scene, &spec);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("element O"));
    }
}
