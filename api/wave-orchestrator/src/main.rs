use tokio::net::TcpListener;
use tracing::{error, info, warn};
use wave_orchestrator::app::{AppState, build_router};
use wave_orchestrator::config::environment::AppConfig;
use wave_orchestrator::infra::init_infra;
use wave_orchestrator::module::refinement_run::crud;

#[tokio::main]
async fn main() {
    init_logging();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "config error");
            std::process::exit(1);
        }
    };

    let bind_addr = format!("{}:{}", config.api_host, config.api_port);
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, bind_addr = %bind_addr, "server bind error");
            std::process::exit(1);
        }
    };

    info!(
        env = %config.rust_env,
        host = %config.api_host,
        port = config.api_port,
        generator_base_url = %config.generator_base_url,
        analyzer_base_url = %config.analyzer_base_url,
        "wave-orchestrator started"
    );

    let infra = match init_infra(&config).await {
        Ok(i) => i,
        Err(e) => {
            warn!(error = %e, "infra init failed; runs will not be durable");
            None
        }
    };
    let state = AppState::new(config, infra);

    if state.infra.is_some() {
        let rehydrate_state = state.clone();
        tokio::spawn(async move {
            match crud::rehydrate_runs(&rehydrate_state).await {
                Ok(count) => info!(runs = count, "rehydrated runs from durable store"),
                Err(e) => error!(error = %e, "run rehydration failed"),
            }
        });
    }

    let app = build_router(state);
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server runtime error");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
