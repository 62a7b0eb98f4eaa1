use crate::app::AppState;
use crate::module::analysis::schema::{ArtifactRef, ScorecardTest};
use crate::service::metrics_service;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct EvaluatedArtifact {
    pub id: String,
    pub blob_path: String,
    pub quality_score: f64,
    pub details: Value,
}

#[derive(Debug, Deserialize)]
struct EvaluatorReply {
    quality_score: f64,
    #[serde(default)]
    details: Value,
}

/// Score every artifact through the evaluator with a bounded fan-out. A
/// failed evaluation becomes a zero-score result instead of aborting the
/// wave. Results come back sorted by artifact id so downstream consumers
/// see a stable order regardless of completion order.
pub async fn evaluate_all(
    state: &AppState,
    artifacts: &[ArtifactRef],
    scorecard: &[ScorecardTest],
) -> Vec<EvaluatedArtifact> {
    let concurrency = state.config.evaluation_concurrency.max(1);
    let owned_artifacts: Vec<ArtifactRef> = artifacts.to_vec();
    let mut evaluated: Vec<EvaluatedArtifact> =
        futures::stream::iter(owned_artifacts.into_iter().map(|artifact| {
            let state = state.clone();
            let scorecard = scorecard.to_vec();
            async move { evaluate_one(&state, &artifact, &scorecard).await }
        }))
        .buffer_unordered(concurrency)
        .collect()
        .await;
    evaluated.sort_by(|a, b| a.id.cmp(&b.id));
    evaluated
}

async fn evaluate_one(
    state: &AppState,
    artifact: &ArtifactRef,
    scorecard: &[ScorecardTest],
) -> EvaluatedArtifact {
    metrics_service::inc_evaluations_requested();
    match request_evaluation(state, artifact, scorecard).await {
        Ok(reply) => EvaluatedArtifact {
            id: artifact.id.clone(),
            blob_path: artifact.blob_path.clone(),
            quality_score: reply.quality_score,
            details: reply.details,
        },
        Err(error) => {
            warn!(artifact_id = %artifact.id, error = %error, "evaluation failed");
            metrics_service::inc_evaluation_failures();
            EvaluatedArtifact {
                id: artifact.id.clone(),
                blob_path: artifact.blob_path.clone(),
                quality_score: 0.0,
                details: json!({"error": error}),
            }
        }
    }
}

async fn request_evaluation(
    state: &AppState,
    artifact: &ArtifactRef,
    scorecard: &[ScorecardTest],
) -> Result<EvaluatorReply, String> {
    let url = format!(
        "{}/v1/evaluations",
        state.config.evaluator_base_url.trim_end_matches('/')
    );
    let client = Client::builder()
        .timeout(Duration::from_millis(
            state.config.evaluation_timeout_ms.max(1) as u64,
        ))
        .build()
        .map_err(|e| format!("failed to build http client: {e}"))?;
    let resp = client
        .post(&url)
        .json(&json!({
            "artifact_path": artifact.blob_path,
            "scorecard": scorecard,
        }))
        .send()
        .await
        .map_err(|e| format!("evaluator request failed: {e}"))?;
    if !resp.status().is_success() {
        return Err(format!("evaluator returned status {}", resp.status()));
    }
    resp.json::<EvaluatorReply>()
        .await
        .map_err(|e| format!("invalid evaluator response: {e}"))
}
