use std::collections::BTreeMap;
use stemdraw_core::{AttrValue, CanonicalSpec, Domain, PlanEntity, PrimitiveKind, SpecObject};

/// Stage 1: select the drawable objects, derive a primitive hint and a
/// display label for each, and add the implicit entities a complete
/// diagram of the domain needs (power source, force vectors, plate
/// pairs). Inferred entities are flagged.
pub fn extract_entities(spec: &CanonicalSpec) -> Vec<PlanEntity> {
    let text = spec.raw_text.as_deref().unwrap_or("");
    let mut entities: Vec<PlanEntity> = Vec::new();

    for object in &spec.objects {
        if !is_drawable(object) {
            continue;
        }
        let primitive = primitive_hint(&object.object_type);
        let label = display_label(object, text);
        let mut properties = object.properties.clone();
        if let Some(region) = region_hint(&object_surface(object), text) {
            properties.insert("region".to_string(), AttrValue::Str(region));
        }
        entities.push(PlanEntity {
            id: object.id.clone(),
            label,
            primitive,
            source_object: Some(object.id.clone()),
            inferred: false,
            properties,
        });
    }

    drop_generics_shadowed_by_symbols(&mut entities);
    drop_subsumed_terms(&mut entities);

    match spec.domain {
        Domain::Electronics => infer_electronics(spec, text, &mut entities),
        Domain::Mechanics => infer_mechanics(text, &mut entities),
        Domain::Optics => infer_optics(&mut entities),
        _ => {}
    }

    entities.sort_by(|a, b| (a.inferred, &a.id).cmp(&(b.inferred, &b.id)));
    entities
}

fn is_drawable(object: &SpecObject) -> bool {
    !matches!(
        object.object_type.as_str(),
        "quantity" | "event" | "circuit" | "gravity" | "heat" | "temperature" | "pressure"
            | "voltage" | "current" | "charge" | "mass" | "force" | "friction" | "light"
            | "capacitance" | "focal" | "velocity" | "acceleration" | "radius" | "angle"
    )
}

fn primitive_hint(object_type: &str) -> PrimitiveKind {
    match object_type {
        "battery" | "source" | "potential_difference" => PrimitiveKind::Battery,
        "resistor" => PrimitiveKind::Resistor,
        "capacitor" => PrimitiveKind::Capacitor,
        "switch" => PrimitiveKind::Switch,
        "wire" => PrimitiveKind::Wire,
        "inductor" => PrimitiveKind::Other("inductor".to_string()),
        "dielectric" | "plate" => PrimitiveKind::Rect,
        "block" | "body" => PrimitiveKind::Block,
        "incline" | "inclined_plane" | "ramp" => PrimitiveKind::Incline,
        "spring" => PrimitiveKind::Spring,
        "lens" => PrimitiveKind::Lens,
        "mirror" | "ray" | "line_segment" => PrimitiveKind::Line,
        "molecule" | "atom" | "ion" | "electron" => PrimitiveKind::Atom,
        "bond" => PrimitiveKind::Bond,
        "cell" | "nucleus" | "point" => PrimitiveKind::Circle,
        "triangle" | "polygon" | "prism" => PrimitiveKind::Polygon,
        "square" | "rectangle" | "piston" | "cylinder" | "material" => PrimitiveKind::Rect,
        "pulley" => PrimitiveKind::Circle,
        "rope" => PrimitiveKind::Line,
        _ => PrimitiveKind::Rect,
    }
}

fn object_surface(object: &SpecObject) -> String {
    object
        .properties
        .get("label")
        .and_then(|v| v.as_str())
        .unwrap_or(&object.id)
        .to_string()
}

/// Human-facing label. Symbol entities show `SYM: value` (components) or
/// `SYM = value` (coefficients); plain components pick up the nearest
/// quantity of their natural unit from the text.
fn display_label(object: &SpecObject, text: &str) -> String {
    let surface = object_surface(object);
    let expression = object.properties.get("expression").and_then(|v| v.as_str());

    if let Some(expr) = expression {
        return match object.object_type.as_str() {
            "dielectric" => format!("{} = {}", surface, format_expression(expr)),
            _ => format!("{}: {}", surface, format_expression(expr)),
        };
    }

    let unit_pattern: Option<&[&str]> = match object.object_type.as_str() {
        "resistor" => Some(&["Ω", "kΩ", "MΩ", "ohm"]),
        "battery" | "source" | "potential_difference" => Some(&["V", "kV", "mV"]),
        "capacitor" => Some(&["µF", "uF", "nF", "pF", "F"]),
        "block" | "body" => Some(&["kg", "g"]),
        _ => None,
    };
    if let Some(units) = unit_pattern {
        if let Some(q) = find_quantity(text, units) {
            return q;
        }
    }
    surface
}

/// `2.00 µF` → `2.0µF`; `21.0` → `21.0`; keeps anything unparseable.
fn format_expression(expr: &str) -> String {
    let mut parts = expr.split_whitespace();
    let value = parts.next().unwrap_or("");
    let unit = parts.next().unwrap_or("");
    match value.parse::<f64>() {
        Ok(v) => format!("{}{}", format_value(v), unit),
        Err(_) => expr.to_string(),
    }
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() >= 10.0 {
        format!("{:.0}", v)
    } else {
        format!("{:.1}", v)
    }
}

/// First `<number> <unit>` occurrence in the text for any of the units.
fn find_quantity(text: &str, units: &[&str]) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let number: String = chars[start..i].iter().collect();
            let mut j = i;
            while j < chars.len() && chars[j] == ' ' {
                j += 1;
            }
            for unit in units {
                let unit_chars: Vec<char> = unit.chars().collect();
                if chars[j..].starts_with(&unit_chars[..]) {
                    let value: f64 = number.parse().unwrap_or(0.0);
                    return Some(format!("{}{}", format_value(value), unit));
                }
            }
        } else {
            i += 1;
        }
    }
    None
}

/// `left half κ1`, `right top κ2` → region hints read from the words
/// just before the symbol's occurrence in the text.
fn region_hint(surface: &str, text: &str) -> Option<String> {
    let position = text.find(surface)?;
    let window_start = position.saturating_sub(24);
    // back off to a char boundary
    let mut start = window_start;
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    let window = text[start..position].to_lowercase();

    let horizontal = if window.contains("left") {
        Some("left")
    } else if window.contains("right") {
        Some("right")
    } else {
        None
    };
    let vertical = if window.contains("top") || window.contains("upper") {
        Some("top")
    } else if window.contains("bottom") || window.contains("lower") {
        Some("bottom")
    } else {
        None
    };

    match (horizontal, vertical) {
        (Some(h), Some(v)) => Some(format!("{}_{}", h, v)),
        (Some(h), None) => Some(h.to_string()),
        (None, Some(v)) => Some(v.to_string()),
        (None, None) => None,
    }
}

/// A generic component mention ("capacitor") adds nothing once specific
/// symbol-derived instances (C1, C2) of the same type exist.
fn drop_generics_shadowed_by_symbols(entities: &mut Vec<PlanEntity>) {
    let specific_types: Vec<String> = entities
        .iter()
        .filter(|e| e.properties.contains_key("expression") || e.properties.contains_key("symbol"))
        .filter_map(|e| {
            e.source_object
                .as_ref()
                .map(|_| type_key(e).to_string())
        })
        .collect();
    entities.retain(|e| {
        let generic = !e.properties.contains_key("expression")
            && !e.properties.contains_key("symbol")
            && e.id == type_key(e);
        !(generic && specific_types.contains(&type_key(e).to_string()))
    });
}

/// Phrase-level dedup in two passes. A phrase naming several components
/// at once ("resistor and a switch") is a conflation and goes away when
/// its components exist on their own; after that, a bare dictionary
/// mention goes away when a more specific single-component phrase
/// contains it ("block" next to "5 kg block").
fn drop_subsumed_terms(entities: &mut Vec<PlanEntity>) {
    let term_slugs = crate::vocab_term_slugs();
    let contained_terms = |id: &str| -> Vec<&str> {
        term_slugs
            .iter()
            .filter(|term| id.contains(term.as_str()))
            .map(String::as_str)
            .collect()
    };

    let ids: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
    entities.retain(|e| {
        let terms = contained_terms(&e.id);
        let conflation = terms.len() >= 2
            && terms
                .iter()
                .all(|term| ids.iter().any(|other| other == term));
        !conflation
    });

    let ids: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
    entities.retain(|e| {
        if !term_slugs.contains(&e.id) {
            return true;
        }
        !ids.iter().any(|other| {
            other != &e.id
                && other.contains(e.id.as_str())
                && contained_terms(other).len() == 1
        })
    });
}

fn type_key(entity: &PlanEntity) -> &str {
    match &entity.primitive {
        PrimitiveKind::Capacitor => "capacitor",
        PrimitiveKind::Resistor => "resistor",
        PrimitiveKind::Battery => "battery",
        _ => "",
    }
}

fn infer_electronics(spec: &CanonicalSpec, text: &str, entities: &mut Vec<PlanEntity>) {
    // plate separation problems need an explicit plate pair
    let plate_count = entities
        .iter()
        .filter(|e| e.source_object.as_deref().is_some_and(|id| id.contains("plate")))
        .count();
    let has_dielectric = entities
        .iter()
        .any(|e| spec.object(e.id.as_str()).is_some_and(|o| o.object_type == "dielectric"));
    if plate_count == 1 && (has_dielectric || text.to_lowercase().contains("separation")) {
        entities.retain(|e| !e.id.contains("plate"));
        // regioned fillings carry the geometry; a bare "dielectric"
        // mention next to them is the same material named twice
        if entities.iter().any(|e| e.properties.contains_key("region")) {
            entities.retain(|e| {
                e.properties.contains_key("region")
                    || !crate::vocab_term_slugs().contains(&e.id)
                    || e.primitive != PrimitiveKind::Rect
            });
        }
        for (id, label) in [("plate_top", "top plate"), ("plate_bottom", "bottom plate")] {
            entities.push(PlanEntity {
                id: id.to_string(),
                label: label.to_string(),
                primitive: PrimitiveKind::Rect,
                source_object: None,
                inferred: true,
                properties: plate_properties(),
            });
        }
    }

    // a circuit with a voltage but no source gets one
    let has_source = entities.iter().any(|e| e.primitive == PrimitiveKind::Battery);
    let has_components = entities.iter().any(|e| {
        matches!(
            e.primitive,
            PrimitiveKind::Capacitor | PrimitiveKind::Resistor | PrimitiveKind::Switch
        )
    });
    if !has_source && has_components {
        if let Some(voltage) = find_quantity(text, &["V", "kV", "mV"]) {
            entities.push(PlanEntity {
                id: "power_source".to_string(),
                label: voltage,
                primitive: PrimitiveKind::Battery,
                source_object: None,
                inferred: true,
                properties: BTreeMap::new(),
            });
        }
    }
}

fn plate_properties() -> BTreeMap<String, AttrValue> {
    let mut properties = BTreeMap::new();
    properties.insert("role".to_string(), AttrValue::Str("plate".to_string()));
    properties
}

fn infer_mechanics(text: &str, entities: &mut Vec<PlanEntity>) {
    let body = entities
        .iter()
        .find(|e| e.primitive == PrimitiveKind::Block)
        .map(|e| e.id.clone());
    let support = entities
        .iter()
        .find(|e| e.primitive == PrimitiveKind::Incline)
        .map(|e| e.id.clone());
    let Some(body) = body else { return };

    // incline angle from the text ("30° incline")
    let angle = find_quantity(text, &["°"])
        .and_then(|q| q.trim_end_matches('°').parse::<f64>().ok())
        .unwrap_or(30.0);
    if let Some(support_id) = &support {
        if let Some(incline) = entities.iter_mut().find(|e| &e.id == support_id) {
            incline
                .properties
                .insert("angle".to_string(), AttrValue::Num(angle));
        }
    }

    let force = |id: &str, label: &str, direction: &str| {
        let mut properties = BTreeMap::new();
        properties.insert(
            "direction".to_string(),
            AttrValue::Str(direction.to_string()),
        );
        properties.insert("target".to_string(), AttrValue::Str(body.clone()));
        if direction == "normal" {
            properties.insert("surface_angle".to_string(), AttrValue::Num(angle));
        }
        PlanEntity {
            id: id.to_string(),
            label: label.to_string(),
            primitive: PrimitiveKind::Arrow,
            source_object: None,
            inferred: true,
            properties,
        }
    };

    if !entities.iter().any(|e| e.id == "gravity_force") {
        entities.push(force("gravity_force", "mg", "down"));
    }
    if support.is_some() && !entities.iter().any(|e| e.id == "normal_force") {
        entities.push(force("normal_force", "N", "normal"));
    }
}

fn infer_optics(entities: &mut Vec<PlanEntity>) {
    let has_lens = entities.iter().any(|e| e.primitive == PrimitiveKind::Lens);
    if has_lens && !entities.iter().any(|e| e.id == "optical_axis") {
        let mut properties = BTreeMap::new();
        properties.insert("role".to_string(), AttrValue::Str("axis".to_string()));
        entities.push(PlanEntity {
            id: "optical_axis".to_string(),
            label: String::new(),
            primitive: PrimitiveKind::Line,
            source_object: None,
            inferred: true,
            properties,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: &str, object_type: &str, props: &[(&str, AttrValue)]) -> SpecObject {
        let mut properties = BTreeMap::new();
        properties.insert("label".to_string(), AttrValue::Str(id.to_string()));
        for (k, v) in props {
            properties.insert(k.to_string(), v.clone());
        }
        SpecObject {
            id: id.to_string(),
            object_type: object_type.to_string(),
            properties,
        }
    }

    fn spec(domain: Domain, objects: Vec<SpecObject>, text: &str) -> CanonicalSpec {
        CanonicalSpec {
            domain,
            problem_type: "test".to_string(),
            objects,
            relationships: vec![],
            constraints: vec![],
            complexity_score: 0.5,
            raw_text: Some(text.to_string()),
        }
    }

    #[test]
    fn capacitor_symbols_get_value_labels() {
        let s = spec(
            Domain::Electronics,
            vec![object(
                "C1",
                "capacitor",
                &[
                    ("expression", AttrValue::Str("2.00 µF".into())),
                    ("symbol", AttrValue::Bool(true)),
                ],
            )],
            "capacitances C1 = 2.00 µF",
        );
        let entities = extract_entities(&s);
        assert_eq!(entities[0].label, "C1: 2.0µF");
    }

    #[test]
    fn voltage_without_source_infers_battery() {
        let s = spec(
            Domain::Electronics,
            vec![object("C1", "capacitor", &[("symbol", AttrValue::Bool(true))])],
            "A potential difference of 300 V is applied to the capacitors.",
        );
        let entities = extract_entities(&s);
        let source = entities
            .iter()
            .find(|e| e.primitive == PrimitiveKind::Battery)
            .expect("inferred source");
        assert!(source.inferred);
        assert_eq!(source.label, "300V");
    }

    #[test]
    fn mechanics_infers_force_arrows() {
        let s = spec(
            Domain::Mechanics,
            vec![
                object("block", "block", &[]),
                object("incline", "incline", &[]),
            ],
            "A 5 kg block sits on a 30° incline.",
        );
        let entities = extract_entities(&s);
        assert!(entities.iter().any(|e| e.id == "gravity_force" && e.inferred));
        assert!(entities.iter().any(|e| e.id == "normal_force"));
        let incline = entities.iter().find(|e| e.id == "incline").unwrap();
        assert_eq!(
            incline.properties.get("angle"),
            Some(&AttrValue::Num(30.0))
        );
    }

    #[test]
    fn single_plate_with_dielectrics_becomes_plate_pair() {
        let s = spec(
            Domain::Electronics,
            vec![
                object("plate", "plate", &[]),
                object(
                    "κ1",
                    "dielectric",
                    &[
                        ("expression", AttrValue::Str("21.0".into())),
                        ("symbol", AttrValue::Bool(true)),
                    ],
                ),
            ],
            "Plate area A = 10.5 cm², plate separation 2d = 7.12 mm, left half κ1 = 21.0",
        );
        let entities = extract_entities(&s);
        assert!(entities.iter().any(|e| e.id == "plate_top"));
        assert!(entities.iter().any(|e| e.id == "plate_bottom"));
        assert!(!entities.iter().any(|e| e.id == "plate"));
        let kappa = entities.iter().find(|e| e.id == "κ1").unwrap();
        assert_eq!(kappa.label, "κ1 = 21.0");
        assert_eq!(
            kappa.properties.get("region"),
            Some(&AttrValue::Str("left".into()))
        );
    }

    #[test]
    fn block_label_picks_up_mass() {
        let s = spec(
            Domain::Mechanics,
            vec![object("block", "block", &[])],
            "A 5 kg block sits on a 30° incline.",
        );
        let entities = extract_entities(&s);
        let block = entities.iter().find(|e| e.id == "block").unwrap();
        assert_eq!(block.label, "5.0kg");
    }
}
