use super::error::AppError;
use super::schema::{
    AcceptResponse, CostMetrics, GenerateRequest, GenerationOutcome, ReportGenerationRequest,
};
use crate::app::AppState;
use crate::service::{blob_service, metrics_service, model_service, report_service};
use tracing::warn;

/// Validate and accept one generation job. The artifact is produced
/// asynchronously; the orchestrator learns the outcome through its
/// callback or, if everything here dies silently, through its deadline.
pub fn accept_generation(
    state: &AppState,
    req: GenerateRequest,
) -> Result<AcceptResponse, AppError> {
    validate_request(&req)?;
    metrics_service::inc_generations_accepted();

    let artifact_id = req.artifact_id.clone();
    let task_state = state.clone();
    tokio::spawn(async move {
        run_generation(task_state, req).await;
    });

    Ok(AcceptResponse {
        accepted: true,
        artifact_id,
        error_code: None,
        reason: "generation accepted".to_string(),
    })
}

async fn run_generation(state: AppState, req: GenerateRequest) {
    let report = match produce_artifact(&state, &req).await {
        Ok(usage) => {
            metrics_service::inc_generations_succeeded();
            ReportGenerationRequest {
                artifact_id: req.artifact_id.clone(),
                blob_path: Some(req.output_blob_path.clone()),
                status: GenerationOutcome::Success,
                cost_metrics: usage,
            }
        }
        Err(e) => {
            warn!(artifact_id = %req.artifact_id, error = %e, "generation failed");
            metrics_service::inc_generations_failed();
            ReportGenerationRequest {
                artifact_id: req.artifact_id.clone(),
                blob_path: None,
                status: GenerationOutcome::Failed,
                cost_metrics: CostMetrics::default(),
            }
        }
    };
    report_service::report(&state, &req.orchestrator_callback_url, &report).await;
}

async fn produce_artifact(state: &AppState, req: &GenerateRequest) -> Result<CostMetrics, String> {
    let completion = model_service::complete(&state.config, &req.meta_prompt).await?;
    blob_service::put_text(
        &state.config,
        &req.output_blob_path,
        &completion.text,
        "text/html",
    )
    .await?;
    Ok(CostMetrics {
        prompt_tokens: completion.usage.prompt_tokens,
        completion_tokens: completion.usage.completion_tokens,
    })
}

fn validate_request(req: &GenerateRequest) -> Result<(), AppError> {
    let fields = [
        ("orchestrator_callback_url", &req.orchestrator_callback_url),
        ("artifact_id", &req.artifact_id),
        ("meta_prompt", &req.meta_prompt),
        ("output_blob_path", &req.output_blob_path),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::bad_request(
                "MISSING_FIELD",
                format!("{name} is required"),
            ));
        }
    }
    Ok(())
}
