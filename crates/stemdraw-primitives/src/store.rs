use async_trait::async_trait;
use ndarray::ArrayView1;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stemdraw_core::{
    DiagramError, Domain, PrimitiveEntry, PrimitiveLibraryConfig, PrimitiveMap, PrimitiveStore,
    Result, TextEmbedder,
};

/// Deterministic primitive id: hash of domain, category and the salient
/// properties. Re-ingesting the same shape always lands on the same id.
pub fn primitive_id(domain: Domain, category: &str, key_properties: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(domain.to_string().as_bytes());
    hasher.update(b"/");
    hasher.update(category.as_bytes());
    hasher.update(b"/");
    hasher.update(key_properties.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Stored entries keyed by category, for the renderer's fragment map.
pub fn to_primitive_map(entries: Vec<PrimitiveEntry>) -> PrimitiveMap {
    let mut map = PrimitiveMap::new();
    for entry in entries {
        map.entry(entry.category.clone()).or_insert(entry);
    }
    map
}

/// Open the backend named in the config.
pub fn open_store(
    config: &PrimitiveLibraryConfig,
    embedder: Option<Arc<dyn TextEmbedder>>,
) -> Result<Arc<dyn PrimitiveStore>> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryStore::new(embedder))),
        "file" => {
            let path = config.path.clone().ok_or_else(|| {
                DiagramError::Configuration("file backend requires a path".to_string())
            })?;
            Ok(Arc::new(FileStore::open(path, embedder)?))
        }
        other => Err(DiagramError::Configuration(format!(
            "unknown primitive library backend '{}'",
            other
        ))),
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return -1.0;
    }
    let va = ArrayView1::from(a);
    let vb = ArrayView1::from(b);
    let dot = va.dot(&vb);
    let norm = va.dot(&va).sqrt() * vb.dot(&vb).sqrt();
    if norm == 0.0 {
        -1.0
    } else {
        dot / norm
    }
}

/// Shared search logic: cosine ranking when the query embedding and the
/// entry embeddings exist, exact category/name matching otherwise.
async fn search_entries(
    entries: Vec<PrimitiveEntry>,
    embedder: Option<&Arc<dyn TextEmbedder>>,
    query: &str,
    k: usize,
    domain: Option<Domain>,
) -> Vec<PrimitiveEntry> {
    let candidates: Vec<PrimitiveEntry> = entries
        .into_iter()
        .filter(|e| domain.map_or(true, |d| e.domain == d))
        .collect();

    let query_embedding = match embedder {
        Some(embedder) if embedder.available().await => embedder.embed(query).await.ok(),
        _ => None,
    };

    match query_embedding {
        Some(query_embedding) => {
            let mut scored: Vec<(f32, PrimitiveEntry)> = candidates
                .into_iter()
                .filter_map(|entry| {
                    let score = entry
                        .embedding
                        .as_ref()
                        .map(|e| cosine(e, &query_embedding))?;
                    Some((score, entry))
                })
                .collect();
            scored.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.1.primitive_id.cmp(&b.1.primitive_id))
            });
            scored.into_iter().take(k).map(|(_, e)| e).collect()
        }
        None => {
            // degraded mode: exact category or name substring match
            let lower = query.to_lowercase();
            candidates
                .into_iter()
                .filter(|e| {
                    e.category.to_lowercase() == lower
                        || e.name.to_lowercase().contains(&lower)
                })
                .take(k)
                .collect()
        }
    }
}

/// In-memory backend. Writes serialize through the lock; reads are
/// concurrent.
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, PrimitiveEntry>>,
    embedder: Option<Arc<dyn TextEmbedder>>,
}

impl MemoryStore {
    pub fn new(embedder: Option<Arc<dyn TextEmbedder>>) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            embedder,
        }
    }
}

#[async_trait]
impl PrimitiveStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn len(&self) -> usize {
        self.entries.read().len()
    }

    async fn add_primitive(&self, entry: PrimitiveEntry) -> Result<bool> {
        let mut entries = self.entries.write();
        if entries.contains_key(&entry.primitive_id) {
            return Ok(false);
        }
        entries.insert(entry.primitive_id.clone(), entry);
        Ok(true)
    }

    async fn get_by_id(&self, primitive_id: &str) -> Result<Option<PrimitiveEntry>> {
        Ok(self.entries.read().get(primitive_id).cloned())
    }

    async fn semantic_search(
        &self,
        query: &str,
        k: usize,
        domain: Option<Domain>,
    ) -> Result<Vec<PrimitiveEntry>> {
        let entries: Vec<PrimitiveEntry> = self.entries.read().values().cloned().collect();
        Ok(search_entries(entries, self.embedder.as_ref(), query, k, domain).await)
    }

    async fn bootstrap(&self, defaults: Vec<PrimitiveEntry>) -> Result<usize> {
        let mut added = 0;
        for entry in defaults {
            if self.add_primitive(entry).await? {
                added += 1;
            }
        }
        Ok(added)
    }
}

/// JSON-file backend. The whole library is rewritten through a temp file
/// and an atomic rename on every commit, so a crash can never leave a
/// partial row behind.
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, PrimitiveEntry>>,
    embedder: Option<Arc<dyn TextEmbedder>>,
}

impl FileStore {
    pub fn open(path: PathBuf, embedder: Option<Arc<dyn TextEmbedder>>) -> Result<Self> {
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path,
            entries: RwLock::new(entries),
            embedder,
        })
    }

    fn persist(&self, entries: &BTreeMap<String, PrimitiveEntry>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = temp_path(&self.path);
        std::fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl PrimitiveStore for FileStore {
    fn backend(&self) -> &'static str {
        "file"
    }

    async fn len(&self) -> usize {
        self.entries.read().len()
    }

    async fn add_primitive(&self, entry: PrimitiveEntry) -> Result<bool> {
        let mut entries = self.entries.write();
        if entries.contains_key(&entry.primitive_id) {
            return Ok(false);
        }
        entries.insert(entry.primitive_id.clone(), entry);
        self.persist(&entries)?;
        Ok(true)
    }

    async fn get_by_id(&self, primitive_id: &str) -> Result<Option<PrimitiveEntry>> {
        Ok(self.entries.read().get(primitive_id).cloned())
    }

    async fn semantic_search(
        &self,
        query: &str,
        k: usize,
        domain: Option<Domain>,
    ) -> Result<Vec<PrimitiveEntry>> {
        let entries: Vec<PrimitiveEntry> = self.entries.read().values().cloned().collect();
        Ok(search_entries(entries, self.embedder.as_ref(), query, k, domain).await)
    }

    async fn bootstrap(&self, defaults: Vec<PrimitiveEntry>) -> Result<usize> {
        let mut added = 0;
        for entry in defaults {
            if self.add_primitive(entry).await? {
                added += 1;
            }
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id_seed: &str, domain: Domain, category: &str) -> PrimitiveEntry {
        PrimitiveEntry {
            primitive_id: primitive_id(domain, category, id_seed),
            name: format!("{} {}", domain, category),
            domain,
            category: category.to_string(),
            svg_fragment: "<rect width='10' height='10'/>".to_string(),
            tags: vec![category.to_string()],
            embedding: Some(vec![0.5, 0.5, 0.0]),
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn double_ingest_is_idempotent() {
        let store = MemoryStore::new(None);
        let e = entry("a", Domain::Electronics, "battery");
        assert!(store.add_primitive(e.clone()).await.unwrap());
        assert!(!store.add_primitive(e).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn exact_match_fallback_without_embedder() {
        let store = MemoryStore::new(None);
        store
            .add_primitive(entry("a", Domain::Electronics, "battery"))
            .await
            .unwrap();
        store
            .add_primitive(entry("b", Domain::Mechanics, "block"))
            .await
            .unwrap();

        let hits = store.semantic_search("battery", 5, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, "battery");

        let scoped = store
            .semantic_search("battery", 5, Some(Domain::Mechanics))
            .await
            .unwrap();
        assert!(scoped.is_empty());
    }

    #[tokio::test]
    async fn file_store_round_trips_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("primitives.json");

        let store = FileStore::open(path.clone(), None).unwrap();
        store
            .add_primitive(entry("a", Domain::Electronics, "battery"))
            .await
            .unwrap();
        drop(store);

        let reopened = FileStore::open(path, None).unwrap();
        assert_eq!(reopened.len().await, 1);
        let hits = reopened.semantic_search("battery", 1, None).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn ids_are_stable_and_distinct() {
        let a = primitive_id(Domain::Electronics, "battery", "64x40");
        let b = primitive_id(Domain::Electronics, "battery", "64x40");
        let c = primitive_id(Domain::Electronics, "battery", "80x40");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
