use artifact_evaluator::app::{AppState, build_router};
use artifact_evaluator::config::environment::AppConfig;
use artifact_evaluator::module::evaluation::schema::{EvaluateResponse, ScorecardTest};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::routing::{get, post};
use http::Request;
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn test_config(blob_base_url: Option<String>, model_base_url: Option<String>) -> AppConfig {
    AppConfig {
        rust_env: "test".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        blob_store_base_url: blob_base_url,
        model_base_url,
        model_timeout_ms: 2_000,
        model_max_tokens: 256,
        blob_timeout_ms: 2_000,
    }
}

/// Blob store stand-in: serves one artifact document, 404s everything else.
async fn spawn_blob_server(body: &'static str) -> String {
    let app = Router::new().route(
        "/artifacts/wave-1/w1-a1.html",
        get(move || async move { body }),
    );
    serve(app).await
}

async fn spawn_model_server(reply: Value) -> String {
    let app = Router::new().route(
        "/v1/completions",
        post(move || {
            let reply = reply.clone();
            async move { axum::Json(reply) }
        }),
    );
    serve(app).await
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

async fn evaluate(
    app: Router,
    artifact_path: &str,
    scorecard: Vec<ScorecardTest>,
) -> (http::StatusCode, EvaluateResponse) {
    let body = json!({"artifact_path": artifact_path, "scorecard": scorecard});
    let request = Request::builder()
        .method("POST")
        .uri("/v1/evaluations")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
        .expect("build request");
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let payload: EvaluateResponse = serde_json::from_slice(&bytes).expect("parse body");
    (status, payload)
}

fn test(test_type: &str, weight: f64, config: Value) -> ScorecardTest {
    ScorecardTest {
        test_type: test_type.to_string(),
        weight,
        config,
    }
}

#[tokio::test]
async fn weighted_combination_of_linter_and_judge() {
    let blob = spawn_blob_server("<html><body>clean page</body></html>").await;
    let model = spawn_model_server(json!({
        "text": "{\"score\": 80, \"reasoning\": \"good\", \"strengths\": [], \"improvements\": []}",
        "usage": {"prompt_tokens": 200, "completion_tokens": 40},
    }))
    .await;
    let app = build_router(AppState::new(test_config(Some(blob), Some(model))));

    let (status, resp) = evaluate(
        app,
        "artifacts/wave-1/w1-a1.html",
        vec![
            test("linter", 0.4, json!({})),
            test("llm_evaluation", 0.6, json!({})),
        ],
    )
    .await;

    assert_eq!(status, http::StatusCode::OK);
    assert!((resp.quality_score - 88.0).abs() < 1e-9);
    assert_eq!(resp.details["linter"]["score"], 100.0);
    assert_eq!(resp.details["llm_evaluation"]["score"], 80.0);
}

#[tokio::test]
async fn missing_artifact_returns_not_found() {
    let blob = spawn_blob_server("content").await;
    let app = build_router(AppState::new(test_config(Some(blob), None)));

    let (status, resp) = evaluate(
        app,
        "artifacts/wave-9/missing.html",
        vec![test("linter", 1.0, json!({}))],
    )
    .await;

    assert_eq!(status, http::StatusCode::NOT_FOUND);
    assert_eq!(resp.error_code.as_deref(), Some("ARTIFACT_NOT_FOUND"));
}

#[tokio::test]
async fn unknown_test_type_degrades_to_zero_score() {
    let blob = spawn_blob_server("content").await;
    let app = build_router(AppState::new(test_config(Some(blob), None)));

    let (status, resp) = evaluate(
        app,
        "artifacts/wave-1/w1-a1.html",
        vec![
            test("linter", 1.0, json!({})),
            test("spellcheck", 1.0, json!({})),
        ],
    )
    .await;

    assert_eq!(status, http::StatusCode::OK);
    assert!((resp.quality_score - 50.0).abs() < 1e-9);
    assert_eq!(resp.details["spellcheck"]["score"], 0.0);
    assert_eq!(resp.details["spellcheck"]["error"], "unknown test type");
}

#[tokio::test]
async fn judge_failure_is_isolated_per_test() {
    // No model endpoint configured: the judge handler errors, the linter
    // still scores, and the request succeeds.
    let blob = spawn_blob_server("content").await;
    let app = build_router(AppState::new(test_config(Some(blob), None)));

    let (status, resp) = evaluate(
        app,
        "artifacts/wave-1/w1-a1.html",
        vec![
            test("linter", 0.4, json!({})),
            test("llm_evaluation", 0.6, json!({})),
        ],
    )
    .await;

    assert_eq!(status, http::StatusCode::OK);
    assert!((resp.quality_score - 40.0).abs() < 1e-9);
    assert_eq!(resp.details["llm_evaluation"]["score"], 0.0);
    assert!(resp.details["llm_evaluation"]["error"].is_string());
}

#[tokio::test]
async fn empty_scorecard_scores_zero() {
    let blob = spawn_blob_server("content").await;
    let app = build_router(AppState::new(test_config(Some(blob), None)));

    let (status, resp) = evaluate(app, "artifacts/wave-1/w1-a1.html", vec![]).await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(resp.quality_score, 0.0);
}

#[tokio::test]
async fn evaluation_is_deterministic_for_static_tests() {
    let blob = spawn_blob_server("<div style=\"a\"><div style=\"b\">").await;
    let app = build_router(AppState::new(test_config(Some(blob), None)));
    let scorecard = vec![test(
        "linter",
        1.0,
        json!({"warning_patterns": ["style="]}),
    )];

    let first = evaluate(app.clone(), "artifacts/wave-1/w1-a1.html", scorecard.clone()).await;
    let second = evaluate(app, "artifacts/wave-1/w1-a1.html", scorecard).await;

    assert_eq!(first.0, second.0);
    assert_eq!(
        serde_json::to_value(&first.1).expect("serialize"),
        serde_json::to_value(&second.1).expect("serialize")
    );
    assert!((first.1.quality_score - 96.0).abs() < 1e-9);
}

#[tokio::test]
async fn non_positive_weight_is_rejected() {
    let blob = spawn_blob_server("content").await;
    let app = build_router(AppState::new(test_config(Some(blob), None)));

    let (status, resp) = evaluate(
        app,
        "artifacts/wave-1/w1-a1.html",
        vec![test("linter", 0.0, json!({}))],
    )
    .await;

    assert_eq!(status, http::StatusCode::BAD_REQUEST);
    assert_eq!(resp.error_code.as_deref(), Some("INVALID_SCORECARD"));
}
