use std::collections::BTreeMap;
use stemdraw_core::{Layer, PlanEntity, PrimitiveKind, StyleHint};

/// Stage 5: per-entity style hints. Fills and strokes follow the
/// primitive; layers put region fills behind shapes and annotations in
/// front of them.
pub fn assign_styles(entities: &[PlanEntity]) -> BTreeMap<String, StyleHint> {
    let mut hints = BTreeMap::new();
    for entity in entities {
        hints.insert(entity.id.clone(), hint_for(entity));
    }
    hints
}

fn hint_for(entity: &PlanEntity) -> StyleHint {
    let region_fill = entity.properties.contains_key("region");
    match &entity.primitive {
        PrimitiveKind::Rect if region_fill => StyleHint {
            fill: Some("#bfdbfe".to_string()),
            stroke: Some("#1d4ed8".to_string()),
            layer: Some(Layer::Background),
        },
        PrimitiveKind::Rect | PrimitiveKind::Block | PrimitiveKind::Polygon => StyleHint {
            fill: Some("#e5e7eb".to_string()),
            stroke: Some("#1f2937".to_string()),
            layer: Some(Layer::Shapes),
        },
        PrimitiveKind::Incline => StyleHint {
            fill: Some("#d1d5db".to_string()),
            stroke: Some("#374151".to_string()),
            layer: Some(Layer::Shapes),
        },
        PrimitiveKind::Circle | PrimitiveKind::Atom => StyleHint {
            fill: Some("#fde68a".to_string()),
            stroke: Some("#92400e".to_string()),
            layer: Some(Layer::Shapes),
        },
        PrimitiveKind::Lens => StyleHint {
            fill: Some("#cffafe".to_string()),
            stroke: Some("#0e7490".to_string()),
            layer: Some(Layer::Shapes),
        },
        PrimitiveKind::Arrow | PrimitiveKind::Line | PrimitiveKind::Wire
        | PrimitiveKind::Bond => StyleHint {
            fill: None,
            stroke: Some("#dc2626".to_string()),
            layer: Some(Layer::Lines),
        },
        PrimitiveKind::Battery
        | PrimitiveKind::Resistor
        | PrimitiveKind::Capacitor
        | PrimitiveKind::Switch
        | PrimitiveKind::Spring => StyleHint {
            fill: None,
            stroke: Some("#1f2937".to_string()),
            layer: Some(Layer::Shapes),
        },
        PrimitiveKind::Text => StyleHint {
            fill: Some("#111827".to_string()),
            stroke: None,
            layer: Some(Layer::Labels),
        },
        PrimitiveKind::Other(_) => StyleHint {
            fill: None,
            stroke: Some("#1f2937".to_string()),
            layer: Some(Layer::Shapes),
        },
    }
}
