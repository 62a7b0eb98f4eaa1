use super::crud;
use super::error::AppError;
use super::schema::{HealthResponse, StartRequest, StartResponse};
use crate::app::AppState;
use crate::service::metrics_service;
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use tracing::{error, info};

pub async fn start_run(
    State(state): State<AppState>,
    Json(req): Json<StartRequest>,
) -> impl IntoResponse {
    match crud::start_run(&state, req).await {
        Ok(resp) => {
            info!(project_id = %resp.project_id, "run forwarded to orchestrator");
            (axum::http::StatusCode::OK, Json(resp))
        }
        Err(AppError {
            status,
            code,
            message,
        }) => {
            metrics_service::inc_runs_rejected();
            error!(error_code = code, reason = %message, "start request rejected");
            (
                status,
                Json(StartResponse {
                    accepted: false,
                    project_id: String::new(),
                    status_endpoint: String::new(),
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
            orchestrator_base_url: state.config.orchestrator_base_url.clone(),
            metrics: metrics_service::snapshot(),
            reason: "healthy".to_string(),
        }),
    )
}
