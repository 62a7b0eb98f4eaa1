use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::Json;
use axum::routing::post;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use http::Request;
use run_gateway::app::{AppState, build_router};
use run_gateway::config::environment::AppConfig;
use run_gateway::module::start_run::schema::StartResponse;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

fn test_config(orchestrator_base_url: &str) -> AppConfig {
    AppConfig {
        rust_env: "test".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        orchestrator_base_url: orchestrator_base_url.to_string(),
        forward_timeout_ms: 2_000,
    }
}

async fn spawn_orchestrator_capture(captured: Arc<Mutex<Option<Value>>>) -> String {
    let app = Router::new().route(
        "/v1/runs",
        post(move |Json(body): Json<Value>| {
            let captured = captured.clone();
            async move {
                *captured.lock().expect("capture lock") = Some(body.clone());
                Json(json!({
                    "accepted": true,
                    "idempotent": false,
                    "project_id": body["project_id"],
                    "status": "GENERATING",
                    "error_code": null,
                    "reason": "run started",
                }))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn post_start(app: Router, body: Value) -> (http::StatusCode, StartResponse) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/runs/start")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
        .expect("build request");
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let payload: StartResponse = serde_json::from_slice(&bytes).expect("parse body");
    (status, payload)
}

fn valid_body() -> Value {
    json!({
        "spec_content_b64": BASE64.encode("Build a landing page."),
        "scorecard_content_b64": BASE64.encode(
            r#"[{"test_type": "linter", "weight": 1.0, "config": {}}]"#
        ),
        "termination_conditions": {"max_waves": 3},
    })
}

#[tokio::test]
async fn start_decodes_and_forwards_to_orchestrator() {
    let captured: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let orchestrator = spawn_orchestrator_capture(captured.clone()).await;
    let app = build_router(AppState::new(test_config(&orchestrator)));

    let (status, resp) = post_start(app, valid_body()).await;

    assert_eq!(status, http::StatusCode::OK);
    assert!(resp.accepted);
    assert!(resp.project_id.starts_with("proj-"));
    assert!(resp.status_endpoint.ends_with(&format!("/v1/runs/{}", resp.project_id)));

    let forwarded = captured.lock().expect("capture lock").clone().expect("forwarded body");
    assert_eq!(forwarded["spec_content"], "Build a landing page.");
    assert_eq!(forwarded["project_id"], Value::String(resp.project_id));
    assert_eq!(forwarded["termination_conditions"]["max_waves"], 3);
    assert!(
        forwarded["scorecard_content"]
            .as_str()
            .expect("scorecard content")
            .contains("linter")
    );
}

#[tokio::test]
async fn invalid_base64_is_rejected() {
    let app = build_router(AppState::new(test_config("http://127.0.0.1:9")));
    let (status, resp) = post_start(
        app,
        json!({
            "spec_content_b64": "@@not-base64@@",
            "scorecard_content_b64": BASE64.encode("[]"),
        }),
    )
    .await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_code.as_deref(), Some("INVALID_BASE64"));
}

#[tokio::test]
async fn empty_spec_is_rejected() {
    let app = build_router(AppState::new(test_config("http://127.0.0.1:9")));
    let (status, resp) = post_start(
        app,
        json!({
            "spec_content_b64": BASE64.encode("   "),
            "scorecard_content_b64": BASE64.encode("[]"),
        }),
    )
    .await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_code.as_deref(), Some("EMPTY_SPEC"));
}

#[tokio::test]
async fn malformed_scorecard_is_rejected() {
    let app = build_router(AppState::new(test_config("http://127.0.0.1:9")));
    let (status, resp) = post_start(
        app,
        json!({
            "spec_content_b64": BASE64.encode("Build something."),
            "scorecard_content_b64": BASE64.encode(r#"[{"weight": 1.0}]"#),
        }),
    )
    .await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_code.as_deref(), Some("INVALID_SCORECARD"));
}

#[tokio::test]
async fn unreachable_orchestrator_is_a_gateway_error() {
    let app = build_router(AppState::new(test_config("http://127.0.0.1:9")));
    let (status, resp) = post_start(app, valid_body()).await;
    assert_eq!(status, http::StatusCode::BAD_GATEWAY);
    assert_eq!(resp.error_code.as_deref(), Some("ORCHESTRATOR_UNREACHABLE"));
}
