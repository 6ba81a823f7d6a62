mod circuits;
mod energy;
mod mechanics;
mod optics;
mod stoichiometry;

pub use circuits::CircuitLoopRule;
pub use energy::EnergyConservationRule;
pub use mechanics::ForceEquilibriumRule;
pub use optics::LensEquationRule;
pub use stoichiometry::StoichiometryRule;

/// Shared tolerance for the physics rules: five percent.
pub(crate) const RELATIVE_TOLERANCE: f64 = 0.05;
