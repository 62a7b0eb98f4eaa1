use axum::Router;
use axum::body::{Body, to_bytes};
use axum::routing::post;
use http::Request;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tower::util::ServiceExt;
use wave_orchestrator::app::{AppState, build_router};
use wave_orchestrator::config::environment::AppConfig;
use wave_orchestrator::module::refinement_run::schema::{
    AckResponse, ReportAnalysisRequest, ReportGenerationRequest, RunStatus, RunStatusResponse,
    RunView, StartRunRequest, StartRunResponse, TerminationConditions,
};

pub fn test_config(generator_base_url: &str, analyzer_base_url: &str) -> AppConfig {
    AppConfig {
        rust_env: "test".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        redis_url: None,
        public_base_url: "http://127.0.0.1:0".to_string(),
        generator_base_url: generator_base_url.to_string(),
        analyzer_base_url: analyzer_base_url.to_string(),
        blob_store_base_url: None,
        generator_count_per_wave: 2,
        generation_timeout_ms: 60_000,
        analysis_timeout_ms: 60_000,
        dispatch_timeout_ms: 1_000,
        max_retries: 2,
        unit_token_price_usd: 0.000002,
        default_tokens_per_artifact: 2000,
        viability_threshold: 80.0,
    }
}

pub fn build_app(config: AppConfig) -> Router {
    build_router(AppState::new(config, None))
}

/// A stand-in worker peer that accepts every dispatch with 202 and never
/// calls back; tests drive the report endpoints themselves.
pub async fn spawn_accepting_peer() -> String {
    let app = Router::new()
        .route(
            "/v1/generations",
            post(|| async { axum::http::StatusCode::ACCEPTED }),
        )
        .route(
            "/v1/analyses",
            post(|| async { axum::http::StatusCode::ACCEPTED }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind peer");
    let addr = listener.local_addr().expect("peer addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

pub fn start_request(project_id: &str, conditions: TerminationConditions) -> StartRunRequest {
    StartRunRequest {
        project_id: project_id.to_string(),
        spec_content: "Build a single-page product landing site.".to_string(),
        scorecard_content: json!([
            {"test_type": "linter", "weight": 0.4, "config": {}},
            {"test_type": "llm_evaluation", "weight": 0.6, "config": {}}
        ])
        .to_string(),
        termination_conditions: Some(conditions),
    }
}

pub async fn post_start(
    app: Router,
    req: &StartRunRequest,
) -> (http::StatusCode, StartRunResponse) {
    post_json(app, "/v1/runs", req).await
}

pub async fn post_generation_report(
    app: Router,
    project_id: &str,
    req: &ReportGenerationRequest,
) -> (http::StatusCode, AckResponse) {
    post_json(
        app,
        &format!("/v1/runs/{project_id}/report/generation"),
        req,
    )
    .await
}

pub async fn post_analysis_report(
    app: Router,
    project_id: &str,
    req: &ReportAnalysisRequest,
) -> (http::StatusCode, AckResponse) {
    post_json(app, &format!("/v1/runs/{project_id}/report/analysis"), req).await
}

pub async fn post_approve(
    app: Router,
    project_id: &str,
    body: serde_json::Value,
) -> (http::StatusCode, AckResponse) {
    post_json(app, &format!("/v1/runs/{project_id}/approve"), &body).await
}

pub async fn get_status(app: Router, project_id: &str) -> (http::StatusCode, RunStatusResponse) {
    let request = Request::builder()
        .method("GET")
        .uri(format!("/v1/runs/{project_id}"))
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let payload: RunStatusResponse = serde_json::from_slice(&body).expect("parse body");
    (status, payload)
}

pub async fn run_view(app: Router, project_id: &str) -> RunView {
    let (_, resp) = get_status(app, project_id).await;
    resp.run.expect("run view")
}

/// Poll the status endpoint until the run reaches the wanted state; panics
/// after the deadline so a hung wave fails the test instead of wedging it.
pub async fn wait_for_status(
    app: Router,
    project_id: &str,
    want: RunStatus,
    timeout_ms: u64,
) -> RunView {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        let view = run_view(app.clone(), project_id).await;
        if view.status == want {
            return view;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!(
                "run {project_id} never reached {}; last status {}",
                want.as_str(),
                view.status.as_str()
            );
        }
        sleep(Duration::from_millis(10)).await;
    }
}

pub async fn post_json<Req: Serialize, Resp: serde::de::DeserializeOwned>(
    app: Router,
    uri: &str,
    req: &Req,
) -> (http::StatusCode, Resp) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(req).expect("serialize")))
        .expect("build request");
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let payload: Resp = serde_json::from_slice(&body).expect("parse body");
    (status, payload)
}
