pub mod rules;
pub mod spatial;

use stemdraw_core::{CanonicalSpec, DomainRule, Scene, ValidationReport};

pub use rules::{
    CircuitLoopRule, EnergyConservationRule, ForceEquilibriumRule, LensEquationRule,
    StoichiometryRule,
};

/// The standard rule set, spatial checks included. Validators return
/// reports; they never error and never mutate the scene.
pub struct ValidatorSet {
    rules: Vec<Box<dyn DomainRule>>,
}

impl ValidatorSet {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(CircuitLoopRule),
                Box::new(ForceEquilibriumRule),
                Box::new(EnergyConservationRule),
                Box::new(LensEquationRule),
                Box::new(StoichiometryRule),
            ],
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Domain-rule pass only (pipeline phase 4, before layout).
    pub fn check_domain_rules(&self, scene: &Scene, spec: &CanonicalSpec) -> ValidationReport {
        let mut report = ValidationReport::clean();
        for rule in &self.rules {
            if !rule.applies(spec.domain) {
                continue;
            }
            for issue in rule.check(scene, spec) {
                report.errors.push(issue);
            }
        }
        report.rescore();
        report
    }

    /// Spatial pass (pipeline phase 5.6, after layout).
    pub fn check_spatial(&self, scene: &Scene) -> ValidationReport {
        let mut report = ValidationReport::clean();
        let (errors, warnings) = spatial::check(scene);
        report.errors = errors;
        report.warnings = warnings;
        report.rescore();
        report
    }
}

impl Default for ValidatorSet {
    fn default() -> Self {
        Self::new()
    }
}
