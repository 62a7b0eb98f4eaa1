use super::controller;
use crate::app::AppState;
use axum::Router;
use axum::routing::{get, post};

pub fn register_routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/analyses", post(controller::analyze))
        .route("/v1/analyses/health", get(controller::health))
        .with_state(state)
}
