use crate::store::primitive_id;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use stemdraw_core::{
    Domain, PrimitiveEntry, PrimitiveKind, PrimitiveStore, Renderer, Scene, TextEmbedder,
};

/// Post-render ingest loop: store every rendered shape that is not
/// already present. The real rendered fragment is persisted, keyed by a
/// deterministic hash of domain, category and dimensions. Failures are
/// logged and skipped; ingest never fails a request.
pub async fn ingest_scene(
    store: &Arc<dyn PrimitiveStore>,
    renderer: &dyn Renderer,
    embedder: Option<&Arc<dyn TextEmbedder>>,
    scene: &Scene,
    domain: Domain,
) -> usize {
    let mut ingested = 0;

    for object in &scene.objects {
        if object.position.is_none()
            || object.primitive == PrimitiveKind::Text
            || object.properties.contains_key("from")
        {
            continue;
        }
        let category = object.primitive.category();
        let key_properties = format!(
            "{:.0}x{:.0}",
            object.dimensions.width(),
            object.dimensions.height()
        );
        let id = primitive_id(domain, &category, &key_properties);

        match store.get_by_id(&id).await {
            Ok(Some(_)) => continue,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(primitive = %id, "primitive lookup failed: {}", e);
                continue;
            }
        }

        let fragment = match renderer.render_fragment(object) {
            Ok(fragment) => fragment,
            Err(e) => {
                tracing::warn!(object = %object.id, "fragment render failed: {}", e);
                continue;
            }
        };

        let name = format!("{} {}", domain, category);
        let embedding = match embedder {
            Some(embedder) if embedder.available().await => embedder.embed(&name).await.ok(),
            _ => None,
        };

        let entry = PrimitiveEntry {
            primitive_id: id,
            name,
            domain,
            category: category.clone(),
            svg_fragment: fragment,
            tags: vec![category],
            embedding,
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
        };

        match store.add_primitive(entry).await {
            Ok(true) => ingested += 1,
            Ok(false) => {}
            Err(e) => tracing::warn!("primitive ingest failed: {}", e),
        }
    }

    ingested
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use stemdraw_core::{Canvas, Dimensions, Position, SceneObject};
    use stemdraw_render::GenericRenderer;

    fn scene() -> Scene {
        let mut scene = Scene::new(Canvas::default());
        let mut battery =
            SceneObject::new("battery", PrimitiveKind::Battery, Dimensions::rect(64.0, 40.0));
        battery.position = Some(Position::new(300.0, 300.0));
        scene.objects.push(battery);

        let mut label =
            SceneObject::new("battery__label", PrimitiveKind::Text, Dimensions::rect(30.0, 18.0));
        label.position = Some(Position::new(300.0, 260.0));
        label.label_target = Some("battery".to_string());
        scene.objects.push(label);
        scene
    }

    #[tokio::test]
    async fn ingest_stores_real_fragments_and_skips_labels() {
        let store: Arc<dyn PrimitiveStore> = Arc::new(MemoryStore::new(None));
        let count = ingest_scene(
            &store,
            &GenericRenderer,
            None,
            &scene(),
            Domain::Electronics,
        )
        .await;
        assert_eq!(count, 1);

        let id = primitive_id(Domain::Electronics, "battery", "64x40");
        let entry = store.get_by_id(&id).await.unwrap().expect("stored");
        assert!(entry.svg_fragment.contains("<line"));
    }

    #[tokio::test]
    async fn ingest_twice_leaves_size_unchanged() {
        let store: Arc<dyn PrimitiveStore> = Arc::new(MemoryStore::new(None));
        let s = scene();
        ingest_scene(&store, &GenericRenderer, None, &s, Domain::Electronics).await;
        let size = store.len().await;
        let second = ingest_scene(&store, &GenericRenderer, None, &s, Domain::Electronics).await;
        assert_eq!(second, 0);
        assert_eq!(store.len().await, size);
    }
}
