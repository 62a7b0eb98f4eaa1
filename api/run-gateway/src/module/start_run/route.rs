use super::controller;
use crate::app::AppState;
use axum::Router;
use axum::routing::{get, post};

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/runs/start", post(controller::start_run))
        .route("/v1/runs/health", get(controller::health))
        .with_state(state)
}
