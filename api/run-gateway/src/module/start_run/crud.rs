use super::error::AppError;
use super::schema::{StartRequest, StartResponse};
use crate::app::AppState;
use crate::service::{metrics_service, orchestrator_service};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::Value;
use uuid::Uuid;

pub async fn start_run(state: &AppState, req: StartRequest) -> Result<StartResponse, AppError> {
    metrics_service::inc_runs_requested();

    let spec_content = decode_b64("spec_content_b64", &req.spec_content_b64)?;
    let scorecard_content = decode_b64("scorecard_content_b64", &req.scorecard_content_b64)?;
    if spec_content.trim().is_empty() {
        return Err(AppError::bad_request("EMPTY_SPEC", "spec document is empty"));
    }
    validate_scorecard_shape(&scorecard_content)?;

    let project_id = format!("proj-{}", Uuid::new_v4());
    orchestrator_service::forward_start(
        state,
        &project_id,
        &spec_content,
        &scorecard_content,
        req.termination_conditions.clone(),
    )
    .await
    .map_err(|e| AppError::bad_gateway("ORCHESTRATOR_UNREACHABLE", e))?;

    metrics_service::inc_runs_forwarded();
    let status_endpoint = format!(
        "{}/v1/runs/{}",
        state.config.orchestrator_base_url.trim_end_matches('/'),
        project_id
    );
    Ok(StartResponse {
        accepted: true,
        project_id,
        status_endpoint,
        error_code: None,
        reason: "run started".to_string(),
    })
}

fn decode_b64(field: &'static str, value: &str) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(
            "MISSING_FIELD",
            format!("{field} is required"),
        ));
    }
    let bytes = BASE64
        .decode(value.trim())
        .map_err(|e| AppError::bad_request("INVALID_BASE64", format!("{field}: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::bad_request("INVALID_BASE64", format!("{field}: {e}")))
}

/// Cheap shape check before the orchestrator sees the scorecard: an array
/// of tests with a named type and a positive weight.
fn validate_scorecard_shape(content: &str) -> Result<(), AppError> {
    let parsed: Value = serde_json::from_str(content).map_err(|e| {
        AppError::bad_request("INVALID_SCORECARD", format!("scorecard parse failed: {e}"))
    })?;
    let Some(tests) = parsed.as_array() else {
        return Err(AppError::bad_request(
            "INVALID_SCORECARD",
            "scorecard must be a JSON array",
        ));
    };
    for test in tests {
        let has_type = test
            .get("test_type")
            .or_else(|| test.get("testType"))
            .and_then(Value::as_str)
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false);
        let weight_ok = test
            .get("weight")
            .and_then(Value::as_f64)
            .map(|w| w > 0.0)
            .unwrap_or(false);
        if !has_type || !weight_ok {
            return Err(AppError::bad_request(
                "INVALID_SCORECARD",
                "each test needs a test_type and a positive weight",
            ));
        }
    }
    Ok(())
}
