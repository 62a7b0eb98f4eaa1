use artifact_generator::app::{AppState, build_router};
use artifact_generator::config::environment::AppConfig;
use artifact_generator::module::generation::schema::AcceptResponse;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::Json;
use axum::routing::{post, put};
use http::Request;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tower::util::ServiceExt;

fn test_config(model_base_url: Option<String>, blob_base_url: Option<String>) -> AppConfig {
    AppConfig {
        rust_env: "test".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        model_base_url,
        model_timeout_ms: 2_000,
        model_max_tokens: 512,
        blob_store_base_url: blob_base_url,
        blob_timeout_ms: 2_000,
        report_timeout_ms: 2_000,
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

async fn spawn_model_server(reply: Value) -> String {
    let app = Router::new().route(
        "/v1/completions",
        post(move || {
            let reply = reply.clone();
            async move { Json(reply) }
        }),
    );
    serve(app).await
}

async fn spawn_blob_capture(captured: Arc<Mutex<Option<String>>>) -> String {
    let app = Router::new().route(
        "/artifacts/wave-1/w1-a1.html",
        put(move |body: String| {
            let captured = captured.clone();
            async move {
                *captured.lock().expect("blob lock") = Some(body);
                http::StatusCode::OK
            }
        }),
    );
    serve(app).await
}

async fn spawn_report_capture(captured: Arc<Mutex<Option<Value>>>) -> String {
    let app = Router::new().route(
        "/v1/runs/proj-1/report/generation",
        post(move |Json(body): Json<Value>| {
            let captured = captured.clone();
            async move {
                *captured.lock().expect("report lock") = Some(body);
                http::StatusCode::OK
            }
        }),
    );
    serve(app).await
}

async fn post_generate(app: Router, body: Value) -> (http::StatusCode, AcceptResponse) {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/generations")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
        .expect("build request");
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let payload: AcceptResponse = serde_json::from_slice(&bytes).expect("parse body");
    (status, payload)
}

async fn wait_for_report(captured: &Arc<Mutex<Option<Value>>>, timeout_ms: u64) -> Value {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        if let Some(report) = captured.lock().expect("report lock").clone() {
            return report;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("generation report never arrived");
        }
        sleep(Duration::from_millis(10)).await;
    }
}

fn generate_body(callback_url: &str) -> Value {
    json!({
        "orchestrator_callback_url": callback_url,
        "artifact_id": "w1-a1",
        "meta_prompt": "Build a landing page.",
        "output_blob_path": "artifacts/wave-1/w1-a1.html",
    })
}

#[tokio::test]
async fn successful_generation_stores_artifact_and_reports_usage() {
    let model = spawn_model_server(json!({
        "text": "<html><body>generated</body></html>",
        "usage": {"prompt_tokens": 1200, "completion_tokens": 800},
    }))
    .await;
    let stored: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
    let blob = spawn_blob_capture(stored.clone()).await;
    let reported: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let orchestrator = spawn_report_capture(reported.clone()).await;

    let app = build_router(AppState::new(test_config(Some(model), Some(blob))));
    let callback = format!("{orchestrator}/v1/runs/proj-1/report/generation");
    let (status, resp) = post_generate(app, generate_body(&callback)).await;

    assert_eq!(status, http::StatusCode::ACCEPTED);
    assert!(resp.accepted);
    assert_eq!(resp.artifact_id, "w1-a1");

    let report = wait_for_report(&reported, 2_000).await;
    assert_eq!(report["status"], "SUCCESS");
    assert_eq!(report["artifact_id"], "w1-a1");
    assert_eq!(report["blob_path"], "artifacts/wave-1/w1-a1.html");
    assert_eq!(report["cost_metrics"]["prompt_tokens"], 1200);
    assert_eq!(report["cost_metrics"]["completion_tokens"], 800);

    let body = stored.lock().expect("blob lock").clone().expect("stored artifact");
    assert_eq!(body, "<html><body>generated</body></html>");
}

#[tokio::test]
async fn model_failure_reports_failed_with_zero_usage() {
    // No model endpoint configured: the async job fails at the first step.
    let reported: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let orchestrator = spawn_report_capture(reported.clone()).await;

    let app = build_router(AppState::new(test_config(None, None)));
    let callback = format!("{orchestrator}/v1/runs/proj-1/report/generation");
    let (status, resp) = post_generate(app, generate_body(&callback)).await;

    assert_eq!(status, http::StatusCode::ACCEPTED);
    assert!(resp.accepted);

    let report = wait_for_report(&reported, 2_000).await;
    assert_eq!(report["status"], "FAILED");
    assert_eq!(report["blob_path"], Value::Null);
    assert_eq!(report["cost_metrics"]["prompt_tokens"], 0);
    assert_eq!(report["cost_metrics"]["completion_tokens"], 0);
}

#[tokio::test]
async fn missing_field_is_rejected_before_acceptance() {
    let app = build_router(AppState::new(test_config(None, None)));
    let (status, resp) = post_generate(
        app,
        json!({
            "orchestrator_callback_url": "http://127.0.0.1:9/cb",
            "artifact_id": "w1-a1",
            "meta_prompt": "",
            "output_blob_path": "artifacts/wave-1/w1-a1.html",
        }),
    )
    .await;
    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_code.as_deref(), Some("MISSING_FIELD"));
}

#[tokio::test]
async fn non_post_method_is_rejected() {
    let app = build_router(AppState::new(test_config(None, None)));
    let request = Request::builder()
        .method("DELETE")
        .uri("/v1/generations")
        .body(Body::empty())
        .expect("build request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), http::StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn unreachable_callback_is_swallowed() {
    let model = spawn_model_server(json!({
        "text": "<html/>",
        "usage": {"prompt_tokens": 10, "completion_tokens": 10},
    }))
    .await;
    let app = build_router(AppState::new(test_config(Some(model), None)));

    // The callback target does not exist; acceptance must still succeed and
    // the job must not bring the service down.
    let (status, resp) =
        post_generate(app, generate_body("http://127.0.0.1:9/v1/runs/x/report/generation")).await;
    assert_eq!(status, http::StatusCode::ACCEPTED);
    assert!(resp.accepted);
    sleep(Duration::from_millis(100)).await;
}
