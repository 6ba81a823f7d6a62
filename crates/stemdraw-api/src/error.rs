use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use stemdraw_core::RequestId;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Pipeline {
        kind: String,
        message: String,
        request_id: RequestId,
    },
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Map pipeline error kinds onto HTTP statuses.
fn status_for(kind: &str) -> StatusCode {
    match kind {
        "INPUT_INVALID" | "CONFIG_INVALID" => StatusCode::BAD_REQUEST,
        "VALIDATION_ERROR" => StatusCode::UNPROCESSABLE_ENTITY,
        "BUDGET_EXCEEDED" => StatusCode::GATEWAY_TIMEOUT,
        "PLAN_EMPTY" => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": { "kind": "INPUT_INVALID", "message": message } })),
            )
                .into_response(),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": { "kind": "NOT_FOUND", "message": message } })),
            )
                .into_response(),
            ApiError::Pipeline {
                kind,
                message,
                request_id,
            } => (
                status_for(&kind),
                Json(json!({
                    "error": { "kind": kind, "message": message },
                    "request_id": request_id,
                })),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_sensible_statuses() {
        assert_eq!(status_for("INPUT_INVALID"), StatusCode::BAD_REQUEST);
        assert_eq!(status_for("VALIDATION_ERROR"), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status_for("LAYOUT_UNSAT"), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for("BUDGET_EXCEEDED"), StatusCode::GATEWAY_TIMEOUT);
    }
}
