use crate::store::primitive_id;
use chrono::Utc;
use std::collections::BTreeMap;
use stemdraw_core::{
    Dimensions, Domain, PrimitiveEntry, PrimitiveKind, Renderer, Result, SceneObject,
};

/// The starter set: one stock fragment per common component so a fresh
/// library can substitute fragments before any request has been served.
pub fn default_primitives(renderer: &dyn Renderer) -> Result<Vec<PrimitiveEntry>> {
    let stock: Vec<(Domain, PrimitiveKind, Dimensions)> = vec![
        (Domain::Electronics, PrimitiveKind::Battery, Dimensions::rect(64.0, 40.0)),
        (Domain::Electronics, PrimitiveKind::Resistor, Dimensions::rect(84.0, 24.0)),
        (Domain::Electronics, PrimitiveKind::Capacitor, Dimensions::rect(36.0, 52.0)),
        (Domain::Electronics, PrimitiveKind::Switch, Dimensions::rect(64.0, 24.0)),
        (Domain::Mechanics, PrimitiveKind::Block, Dimensions::rect(90.0, 64.0)),
        (Domain::Mechanics, PrimitiveKind::Incline, Dimensions::rect(340.0, 190.0)),
        (Domain::Mechanics, PrimitiveKind::Spring, Dimensions::rect(24.0, 110.0)),
        (Domain::Optics, PrimitiveKind::Lens, Dimensions::rect(28.0, 180.0)),
        (Domain::Chemistry, PrimitiveKind::Atom, Dimensions::circle(26.0)),
    ];

    let mut entries = Vec::with_capacity(stock.len());
    for (domain, primitive, dimensions) in stock {
        let category = primitive.category();
        let object = SceneObject::new(format!("default_{}", category), primitive, dimensions);
        let fragment = renderer.render_fragment(&object)?;
        let key_properties =
            format!("{:.0}x{:.0}", dimensions.width(), dimensions.height());
        entries.push(PrimitiveEntry {
            primitive_id: primitive_id(domain, &category, &key_properties),
            name: format!("{} {}", domain, category),
            domain,
            category: category.clone(),
            svg_fragment: fragment,
            tags: vec!["default".to_string(), category],
            embedding: None,
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
        });
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;
    use stemdraw_core::PrimitiveStore;
    use stemdraw_render::GenericRenderer;

    #[tokio::test]
    async fn bootstrap_populates_an_empty_store_once() {
        let store: Arc<dyn PrimitiveStore> = Arc::new(MemoryStore::new(None));
        let defaults = default_primitives(&GenericRenderer).unwrap();
        let expected = defaults.len();

        let added = store.bootstrap(defaults.clone()).await.unwrap();
        assert_eq!(added, expected);
        // bootstrapping again is a no-op
        let again = store.bootstrap(defaults).await.unwrap();
        assert_eq!(again, 0);
    }
}
