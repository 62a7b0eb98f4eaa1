use crate::app::AppState;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

pub async fn forward_start(
    state: &AppState,
    project_id: &str,
    spec_content: &str,
    scorecard_content: &str,
    termination_conditions: Option<Value>,
) -> Result<(), String> {
    let url = format!(
        "{}/v1/runs",
        state.config.orchestrator_base_url.trim_end_matches('/')
    );
    let client = Client::builder()
        .timeout(Duration::from_millis(
            state.config.forward_timeout_ms.max(1) as u64,
        ))
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))?;

    let mut body = json!({
        "project_id": project_id,
        "spec_content": spec_content,
        "scorecard_content": scorecard_content,
    });
    if let Some(conditions) = termination_conditions {
        body["termination_conditions"] = conditions;
    }

    let resp = client
        .post(&url)
        .json(&body)
        .send()
        .await
        .map_err(|e| format!("orchestrator request failed: {e}"))?;
    if !resp.status().is_success() {
        return Err(format!("orchestrator returned status {}", resp.status()));
    }
    Ok(())
}
