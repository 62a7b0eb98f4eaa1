use super::controller;
use crate::app::AppState;
use axum::Router;
use axum::routing::{get, post};

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/runs", post(controller::start_run))
        .route("/v1/runs/health", get(controller::health))
        .route("/v1/runs/:project_id", get(controller::get_run))
        .route(
            "/v1/runs/:project_id/report/generation",
            post(controller::report_generation),
        )
        .route(
            "/v1/runs/:project_id/report/analysis",
            post(controller::report_analysis),
        )
        .route("/v1/runs/:project_id/approve", post(controller::approve_run))
        .with_state(state)
}
