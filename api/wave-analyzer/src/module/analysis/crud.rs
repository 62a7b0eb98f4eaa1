use super::error::AppError;
use super::schema::{AcceptResponse, AnalysisResult, AnalyzeRequest};
use crate::app::AppState;
use crate::service::{
    evaluation_service, metrics_service, ranking_service, report_service, synthesis_service,
};
use tracing::info;

/// Validate and accept one analysis job, then run it asynchronously; the
/// orchestrator hears back through its callback, not this response.
pub fn accept_analysis(state: &AppState, req: AnalyzeRequest) -> Result<AcceptResponse, AppError> {
    validate_request(&req)?;
    metrics_service::inc_analyses_accepted();

    let project_id = req.project_id.clone();
    let task_state = state.clone();
    tokio::spawn(async move {
        run_analysis(task_state, req).await;
    });

    Ok(AcceptResponse {
        accepted: true,
        project_id,
        error_code: None,
        reason: "analysis accepted".to_string(),
    })
}

async fn run_analysis(state: AppState, req: AnalyzeRequest) {
    let evaluated = evaluation_service::evaluate_all(&state, &req.artifacts, &req.scorecard).await;
    let top = ranking_service::top_k(&evaluated);
    let learnings = synthesis_service::synthesize(&state, &top).await;

    let results: Vec<AnalysisResult> = evaluated
        .into_iter()
        .map(|e| AnalysisResult {
            artifact_id: e.id,
            quality_score: e.quality_score,
            details: e.details,
        })
        .collect();

    info!(
        project_id = %req.project_id,
        wave_number = req.wave_number,
        artifacts = results.len(),
        top = top.len(),
        learnings_bytes = learnings.len(),
        "analysis complete; reporting"
    );
    report_service::report(&state, &req.orchestrator_callback_url, results, learnings).await;
}

fn validate_request(req: &AnalyzeRequest) -> Result<(), AppError> {
    if req.orchestrator_callback_url.trim().is_empty() {
        return Err(AppError::bad_request(
            "MISSING_FIELD",
            "orchestrator_callback_url is required",
        ));
    }
    if req.project_id.trim().is_empty() {
        return Err(AppError::bad_request(
            "MISSING_FIELD",
            "project_id is required",
        ));
    }
    for artifact in &req.artifacts {
        if artifact.id.trim().is_empty() || artifact.blob_path.trim().is_empty() {
            return Err(AppError::bad_request(
                "MISSING_FIELD",
                "artifact entries need id and blob_path",
            ));
        }
    }
    Ok(())
}
