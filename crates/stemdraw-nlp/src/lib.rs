pub mod adapters;
pub mod embed;
pub mod merge;
pub mod registry;
pub mod text;
pub mod vocab;

pub use embed::{HashEmbedder, OllamaEmbedder};
pub use merge::merge_results;
pub use registry::ExtractorRegistry;
