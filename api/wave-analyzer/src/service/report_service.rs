use crate::app::AppState;
use crate::module::analysis::schema::{AnalysisResult, ReportAnalysisRequest};
use crate::service::metrics_service;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Deliver the wave's results to the orchestrator callback. Delivery errors
/// are logged and swallowed; the orchestrator's analysis deadline covers a
/// lost report.
pub async fn report(
    state: &AppState,
    callback_url: &str,
    results: Vec<AnalysisResult>,
    learnings_md: String,
) {
    let body = ReportAnalysisRequest {
        results,
        learnings_md,
    };
    let client = match Client::builder()
        .timeout(Duration::from_millis(
            state.config.report_timeout_ms.max(1) as u64,
        ))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "failed to build http client for report");
            return;
        }
    };
    match client.post(callback_url).json(&body).send().await {
        Ok(resp) if resp.status().is_success() => {
            metrics_service::inc_analyses_reported();
        }
        Ok(resp) => {
            warn!(callback_url = %callback_url, status = %resp.status(), "analysis report rejected")
        }
        Err(e) => warn!(callback_url = %callback_url, error = %e, "analysis report delivery failed"),
    }
}
