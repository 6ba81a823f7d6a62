use std::sync::Arc;
use stemdraw_core::{GeneratorConfig, Result};
use stemdraw_pipeline::DiagramPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<DiagramPipeline>,
}

impl AppState {
    pub async fn new(config: GeneratorConfig) -> Result<Self> {
        Ok(Self {
            pipeline: Arc::new(DiagramPipeline::new(config).await?),
        })
    }
}
