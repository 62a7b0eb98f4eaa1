use super::crud;
use super::error::AppError;
use super::schema::{AcceptResponse, GenerateRequest, HealthResponse};
use crate::app::AppState;
use crate::service::metrics_service;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::{error, info};

pub async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerateRequest>,
) -> impl IntoResponse {
    match crud::accept_generation(&state, req) {
        Ok(resp) => {
            info!(artifact_id = %resp.artifact_id, "generation accepted");
            (axum::http::StatusCode::ACCEPTED, Json(resp))
        }
        Err(AppError {
            status,
            code,
            message,
        }) => {
            error!(error_code = code, reason = %message, "generation rejected");
            (
                status,
                Json(AcceptResponse {
                    accepted: false,
                    artifact_id: String::new(),
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
