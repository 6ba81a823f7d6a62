use std::path::PathBuf;
use stemdraw_api::{create_router, AppState};
use stemdraw_core::GeneratorConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // environment side-effects happen once, at process start
    std::env::set_var("TOKENIZERS_PARALLELISM", "false");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("STEMDRAW_CONFIG") {
        Ok(path) => GeneratorConfig::load_toml(&PathBuf::from(path))?,
        Err(_) => GeneratorConfig::default(),
    };

    let bind = std::env::var("STEMDRAW_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let state = AppState::new(config).await?;
    let router = create_router(state);

    tracing::info!(%bind, "stemdraw server listening");
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
