pub mod bootstrap;
pub mod ingest;
pub mod store;

pub use bootstrap::default_primitives;
pub use ingest::ingest_scene;
pub use store::{open_store, primitive_id, to_primitive_map, FileStore, MemoryStore};
