use stemdraw_core::Domain;

/// Physical-indicator dictionary. A node whose label contains one of these
/// terms names something drawable and survives canonicalization; the
/// domain tag feeds classification.
pub const PHYSICAL_INDICATORS: &[(&str, Domain)] = &[
    // electronics
    ("resistor", Domain::Electronics),
    ("capacitor", Domain::Electronics),
    ("capacitance", Domain::Electronics),
    ("inductor", Domain::Electronics),
    ("battery", Domain::Electronics),
    ("voltage", Domain::Electronics),
    ("potential difference", Domain::Electronics),
    ("current", Domain::Electronics),
    ("switch", Domain::Electronics),
    ("circuit", Domain::Electronics),
    ("wire", Domain::Electronics),
    ("plate", Domain::Electronics),
    ("dielectric", Domain::Electronics),
    ("charge", Domain::Electronics),
    ("source", Domain::Electronics),
    // mechanics
    ("block", Domain::Mechanics),
    ("mass", Domain::Mechanics),
    ("spring", Domain::Mechanics),
    ("incline", Domain::Mechanics),
    ("inclined plane", Domain::Mechanics),
    ("ramp", Domain::Mechanics),
    ("force", Domain::Mechanics),
    ("friction", Domain::Mechanics),
    ("pulley", Domain::Mechanics),
    ("rope", Domain::Mechanics),
    ("pendulum", Domain::Mechanics),
    ("velocity", Domain::Mechanics),
    ("acceleration", Domain::Mechanics),
    ("gravity", Domain::Mechanics),
    // optics
    ("lens", Domain::Optics),
    ("mirror", Domain::Optics),
    ("focal", Domain::Optics),
    ("ray", Domain::Optics),
    ("image", Domain::Optics),
    ("prism", Domain::Optics),
    ("light", Domain::Optics),
    // thermodynamics
    ("gas", Domain::Thermodynamics),
    ("piston", Domain::Thermodynamics),
    ("heat", Domain::Thermodynamics),
    ("temperature", Domain::Thermodynamics),
    ("pressure", Domain::Thermodynamics),
    ("cylinder", Domain::Thermodynamics),
    // chemistry
    ("molecule", Domain::Chemistry),
    ("atom", Domain::Chemistry),
    ("bond", Domain::Chemistry),
    ("reaction", Domain::Chemistry),
    ("solution", Domain::Chemistry),
    ("acid", Domain::Chemistry),
    ("electron", Domain::Chemistry),
    ("ion", Domain::Chemistry),
    // geometry
    ("triangle", Domain::Geometry),
    ("square", Domain::Geometry),
    ("rectangle", Domain::Geometry),
    ("polygon", Domain::Geometry),
    ("angle", Domain::Geometry),
    ("radius", Domain::Geometry),
    ("point", Domain::Geometry),
    ("line segment", Domain::Geometry),
    // biology
    ("cell", Domain::Biology),
    ("membrane", Domain::Biology),
    ("nucleus", Domain::Biology),
    ("protein", Domain::Biology),
    ("enzyme", Domain::Biology),
];

/// Measurement units the scientific NER recognizes.
pub const UNITS: &[&str] = &[
    "V", "kV", "mV", "A", "mA", "Ω", "ohm", "kΩ", "MΩ", "F", "µF", "uF", "nF", "pF", "kg", "g",
    "mg", "m", "cm", "mm", "µm", "nm", "km", "s", "ms", "N", "J", "kJ", "W", "kW", "Hz", "kHz",
    "K", "°C", "°F", "mol", "T", "Pa", "kPa", "atm", "°", "cm²", "m²", "mm²", "cm³", "m³", "L",
    "mL",
];

/// Fragments that never become canonical objects on their own: standalone
/// spatial descriptors and connective scraps left behind by the triple
/// extractor.
pub const DISCARD_FRAGMENTS: &[&str] = &[
    "left half",
    "right half",
    "top half",
    "bottom half",
    "left",
    "right",
    "top",
    "bottom",
    "upper",
    "lower",
    "middle",
    "filled with",
    "connected to",
    "and",
    "or",
    "with",
    "then",
    "same",
    "other",
    "each",
    "both",
];

pub fn indicator_domain(label: &str) -> Option<Domain> {
    let lower = label.to_lowercase();
    PHYSICAL_INDICATORS
        .iter()
        .filter(|(term, _)| lower.contains(term))
        .max_by_key(|(term, _)| term.len())
        .map(|(_, domain)| *domain)
}

pub fn is_indicator(label: &str) -> bool {
    indicator_domain(label).is_some()
}

pub fn is_unit(token: &str) -> bool {
    UNITS.contains(&token)
}

pub fn is_discard_fragment(label: &str) -> bool {
    let lower = label.to_lowercase();
    DISCARD_FRAGMENTS.contains(&lower.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_indicator_wins() {
        assert_eq!(indicator_domain("inclined plane"), Some(Domain::Mechanics));
        assert_eq!(indicator_domain("a parallel plate"), Some(Domain::Electronics));
    }

    #[test]
    fn discard_fragments_match_whole_label() {
        assert!(is_discard_fragment("filled with"));
        assert!(is_discard_fragment("Left Half"));
        assert!(!is_discard_fragment("left plate"));
    }
}
