use crate::app::AppState;
use crate::module::generation::schema::ReportGenerationRequest;
use crate::service::metrics_service;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

/// Post the outcome back to the orchestrator. Callback errors are swallowed
/// after logging; the orchestrator's job deadline covers a lost report.
pub async fn report(state: &AppState, callback_url: &str, body: &ReportGenerationRequest) {
    let client = match Client::builder()
        .timeout(Duration::from_millis(
            state.config.report_timeout_ms.max(1) as u64,
        ))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "failed to build http client for report");
            metrics_service::inc_callback_failures();
            return;
        }
    };
    match client.post(callback_url).json(body).send().await {
        Ok(resp) if resp.status().is_success() => {}
        Ok(resp) => {
            warn!(callback_url = %callback_url, status = %resp.status(), "generation report rejected");
            metrics_service::inc_callback_failures();
        }
        Err(e) => {
            warn!(callback_url = %callback_url, error = %e, "generation report delivery failed");
            metrics_service::inc_callback_failures();
        }
    }
}
