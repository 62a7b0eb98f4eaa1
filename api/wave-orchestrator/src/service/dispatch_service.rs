use crate::app::AppState;
use crate::module::refinement_run::crud;
use crate::module::refinement_run::schema::ScorecardTest;
use crate::service::metrics_service;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, warn};

#[derive(Debug, Clone, Serialize)]
pub struct GenerateDispatchRequest {
    pub orchestrator_callback_url: String,
    pub artifact_id: String,
    pub meta_prompt: String,
    pub output_blob_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisArtifactRef {
    pub id: String,
    pub blob_path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeDispatchRequest {
    pub orchestrator_callback_url: String,
    pub project_id: String,
    pub wave_number: u32,
    pub artifacts: Vec<AnalysisArtifactRef>,
    pub scorecard: Vec<ScorecardTest>,
}

pub fn generation_callback_url(state: &AppState, project_id: &str) -> String {
    format!(
        "{}/v1/runs/{}/report/generation",
        state.config.public_base_url.trim_end_matches('/'),
        project_id
    )
}

pub fn analysis_callback_url(state: &AppState, project_id: &str) -> String {
    format!(
        "{}/v1/runs/{}/report/analysis",
        state.config.public_base_url.trim_end_matches('/'),
        project_id
    )
}

/// Fire-and-forget dispatch of one generation job. A synchronous dispatch
/// failure marks the job failed without retry; lost callbacks after a 2xx
/// acceptance are covered by the job deadline instead.
pub fn spawn_generation(
    state: AppState,
    project_id: String,
    job_id: String,
    request: GenerateDispatchRequest,
) {
    tokio::spawn(async move {
        metrics_service::inc_generation_jobs_dispatched();
        let url = format!(
            "{}/v1/generations",
            state.config.generator_base_url.trim_end_matches('/')
        );
        if let Err(e) = post_json(&state, &url, &request).await {
            warn!(project_id = %project_id, job_id = %job_id, error = %e, "generation dispatch failed");
            if let Err(mark_err) =
                crud::record_dispatch_failure(&state, &project_id, &job_id, &e).await
            {
                error!(project_id = %project_id, job_id = %job_id, error = %mark_err.message, "dispatch failure bookkeeping failed");
            }
        }
    });
}

pub fn spawn_analysis(
    state: AppState,
    project_id: String,
    job_id: String,
    request: AnalyzeDispatchRequest,
) {
    tokio::spawn(async move {
        let url = format!(
            "{}/v1/analyses",
            state.config.analyzer_base_url.trim_end_matches('/')
        );
        if let Err(e) = post_json(&state, &url, &request).await {
            warn!(project_id = %project_id, job_id = %job_id, error = %e, "analysis dispatch failed");
            if let Err(mark_err) =
                crud::record_dispatch_failure(&state, &project_id, &job_id, &e).await
            {
                error!(project_id = %project_id, job_id = %job_id, error = %mark_err.message, "dispatch failure bookkeeping failed");
            }
        }
    });
}

async fn post_json<T: Serialize>(state: &AppState, url: &str, body: &T) -> Result<(), String> {
    let client = Client::builder()
        .timeout(Duration::from_millis(
            state.config.dispatch_timeout_ms.max(1) as u64,
        ))
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))?;
    let resp = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| format!("dispatch request failed: {e}"))?;
    if !resp.status().is_success() {
        return Err(format!("dispatch returned status {}", resp.status()));
    }
    Ok(())
}
