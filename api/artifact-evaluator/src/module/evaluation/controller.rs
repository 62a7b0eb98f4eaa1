use super::crud;
use super::error::AppError;
use super::schema::{EvaluateRequest, EvaluateResponse, HealthResponse};
use crate::app::AppState;
use crate::service::metrics_service;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::{error, info};

pub async fn evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> impl IntoResponse {
    let artifact_path = req.artifact_path.clone();
    match crud::evaluate(&state, req).await {
        Ok(resp) => {
            info!(artifact_path = %artifact_path, quality_score = resp.quality_score, "artifact evaluated");
            (axum::http::StatusCode::OK, Json(resp))
        }
        Err(AppError {
            status,
            code,
            message,
        }) => {
            error!(error_code = code, reason = %message, artifact_path = %artifact_path, "evaluation rejected");
            (
                status,
                Json(EvaluateResponse {
                    quality_score: 0.0,
                    details: json!({}),
                    error_code: Some(code.to_string()),
                    reason: message,
                }),
            )
        }
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        axum::http::StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            model_configured: state.config.model_base_url.is_some(),
            blob_store_configured: state.config.blob_store_base_url.is_some(),
            metrics: metrics_service::snapshot(),
            reason: "healthy".to_string(),
        }),
    )
}
