use crate::config::environment::AppConfig;
use crate::infra::InfraClients;
use crate::module::refinement_run::crud::RunStore;
use crate::module::refinement_run::route::register_routes;
use axum::Router;
use axum::http::Method;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<RunStore>,
    pub infra: Option<InfraClients>,
}

impl AppState {
    pub fn new(config: AppConfig, infra: Option<InfraClients>) -> Self {
        Self {
            config,
            store: Arc::new(RunStore::default()),
            infra,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    register_routes(state).layer(cors)
}
