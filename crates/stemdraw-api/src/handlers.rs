use crate::{ApiError, ApiResult, AppState};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use stemdraw_core::{ConfigPatch, RequestTrace};
use stemdraw_pipeline::GenerateMetadata;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct GenerateRequest {
    pub problem_text: String,
    #[serde(default)]
    pub config: Option<ConfigPatch>,
}

#[derive(Serialize)]
pub struct GenerateResponse {
    pub svg: String,
    pub metadata: GenerateMetadata,
}

pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let config = match &request.config {
        Some(patch) => state
            .pipeline
            .config()
            .patched(patch)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => state.pipeline.config().clone(),
    };

    let result = state
        .pipeline
        .generate_with(&request.problem_text, &config)
        .await;

    match (result.svg, result.error) {
        (Some(svg), None) => Ok(Json(GenerateResponse {
            svg,
            metadata: result.metadata,
        })),
        // partial budget-exceeded output still returns the salvaged SVG
        (Some(svg), Some(_)) => Ok(Json(GenerateResponse {
            svg,
            metadata: result.metadata,
        })),
        (None, Some(error)) => Err(ApiError::Pipeline {
            kind: error.kind,
            message: error.message,
            request_id: result.request_id,
        }),
        (None, None) => Err(ApiError::Pipeline {
            kind: "INTERNAL".to_string(),
            message: "pipeline produced neither output nor error".to_string(),
            request_id: result.request_id,
        }),
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub available_features: serde_json::Value,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: option_env!("CARGO_PKG_VERSION").unwrap_or("0.0.0").to_string(),
        available_features: state.pipeline.features().await,
    })
}

pub async fn trace(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<RequestTrace>> {
    let id = Uuid::parse_str(&request_id)
        .map_err(|_| ApiError::BadRequest(format!("invalid request id: {}", request_id)))?;
    state
        .pipeline
        .trace(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no trace for request {}", id)))
}
