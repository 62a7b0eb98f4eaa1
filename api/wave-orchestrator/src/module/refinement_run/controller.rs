use super::crud;
use super::error::AppError;
use super::schema::{
    AckResponse, ApproveRunRequest, HealthResponse, ReportAnalysisRequest,
    ReportGenerationRequest, RunStatusResponse, StartRunRequest, StartRunResponse,
};
use crate::app::AppState;
use crate::service::metrics_service;
use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use tracing::{error, info};

pub async fn start_run(
    State(state): State<AppState>,
    Json(req): Json<StartRunRequest>,
) -> impl IntoResponse {
    match crud::start_run(&state, req).await {
        Ok(resp) => {
            info!(project_id = %resp.project_id, idempotent = resp.idempotent, "start accepted");
            (axum::http::StatusCode::OK, Json(resp))
        }
        Err(err) => error_start(err),
    }
}

pub async fn get_run(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> impl IntoResponse {
    match crud::get_run(&state, &project_id).await {
        Ok(resp) => {
            let status = if resp.found {
                axum::http::StatusCode::OK
            } else {
                axum::http::StatusCode::NOT_FOUND
            };
            (status, Json(resp))
        }
        Err(AppError {
            status,
            code,
            message,
        }) => {
            error!(error_code = code, reason = %message, project_id = %project_id, "run lookup failed");
            (
                status,
                Json(RunStatusResponse {
                    found: false,
                    run: None,
                    error_code: Some(code.to_string()),
                    reason: message,
                }),
            )
        }
    }
}

pub async fn report_generation(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<ReportGenerationRequest>,
) -> impl IntoResponse {
    match crud::report_generation(&state, &project_id, req).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)),
        Err(err) => error_ack(&project_id, "generation report rejected", err),
    }
}

pub async fn report_analysis(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<ReportAnalysisRequest>,
) -> impl IntoResponse {
    match crud::report_analysis(&state, &project_id, req).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)),
        Err(err) => error_ack(&project_id, "analysis report rejected", err),
    }
}

pub async fn approve_run(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(req): Json<ApproveRunRequest>,
) -> impl IntoResponse {
    match crud::approve_run(&state, &project_id, req).await {
        Ok(resp) => (axum::http::StatusCode::OK, Json(resp)),
        Err(err) => error_ack(&project_id, "approval rejected", err),
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let metrics = metrics_service::snapshot();
    let redis_available = state.infra.is_some();
    (
        axum::http::StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            redis_available,
            metrics,
            reason: if redis_available {
                "healthy".to_string()
            } else {
                "healthy; runs are not durable without redis".to_string()
            },
        }),
    )
}

fn error_start(err: AppError) -> (axum::http::StatusCode, Json<StartRunResponse>) {
    error!(error_code = err.code, reason = %err.message, "start rejected");
    (
        err.status,
        Json(StartRunResponse {
            accepted: false,
            idempotent: false,
            project_id: String::new(),
            status: None,
            error_code: Some(err.code.to_string()),
            reason: err.message,
        }),
    )
}

fn error_ack(
    project_id: &str,
    context: &'static str,
    err: AppError,
) -> (axum::http::StatusCode, Json<AckResponse>) {
    error!(error_code = err.code, reason = %err.message, project_id = %project_id, "{}", context);
    (
        err.status,
        Json(AckResponse {
            accepted: false,
            idempotent: false,
            project_id: project_id.to_string(),
            error_code: Some(err.code.to_string()),
            reason: err.message,
        }),
    )
}
