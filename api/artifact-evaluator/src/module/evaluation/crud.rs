use super::error::AppError;
use super::schema::{EvaluateRequest, EvaluateResponse, ScorecardTest};
use crate::app::AppState;
use crate::service::{blob_service, metrics_service, test_registry};
use serde_json::{Map, Value};

pub async fn evaluate(
    state: &AppState,
    req: EvaluateRequest,
) -> Result<EvaluateResponse, AppError> {
    validate_request(&req)?;

    let artifact = blob_service::get_text(&state.config, &req.artifact_path)
        .await
        .map_err(|e| AppError::internal("BLOB_READ_FAILED", e))?
        .ok_or_else(|| AppError::not_found("ARTIFACT_NOT_FOUND", "artifact not found"))?;

    let mut scored: Vec<(f64, f64)> = Vec::with_capacity(req.scorecard.len());
    let mut details = Map::new();
    for test in &req.scorecard {
        let result = test_registry::run_test(state, &artifact, test).await;
        let score = result.get("score").and_then(Value::as_f64).unwrap_or(0.0);
        scored.push((test.weight, score));
        details.insert(test.test_type.clone(), result);
        metrics_service::inc_tests_run();
    }

    let quality_score = combine(&scored);
    metrics_service::inc_evaluations_served();
    Ok(EvaluateResponse {
        quality_score,
        details: Value::Object(details),
        error_code: None,
        reason: "artifact evaluated".to_string(),
    })
}

/// Weighted mean over per-test scores. Weights are normalized by their sum,
/// so a scorecard does not need weights that add up to one. An empty
/// scorecard scores zero.
fn combine(scored: &[(f64, f64)]) -> f64 {
    let total_weight: f64 = scored.iter().map(|(w, _)| w).sum();
    if total_weight <= 0.0 {
        return 0.0;
    }
    scored.iter().map(|(w, s)| w * s).sum::<f64>() / total_weight
}

fn validate_request(req: &EvaluateRequest) -> Result<(), AppError> {
    if req.artifact_path.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_ARTIFACT_PATH",
            "artifact_path is required",
        ));
    }
    for test in &req.scorecard {
        validate_test(test)?;
    }
    Ok(())
}

fn validate_test(test: &ScorecardTest) -> Result<(), AppError> {
    if test.test_type.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_SCORECARD",
            "test_type is required",
        ));
    }
    if !(test.weight > 0.0) {
        return Err(AppError::bad_request(
            "INVALID_SCORECARD",
            "weight must be positive",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_normalizes_weights() {
        let score = combine(&[(0.4, 100.0), (0.6, 80.0)]);
        assert!((score - 88.0).abs() < 1e-9);

        // Same ratios, unnormalized weights.
        let score = combine(&[(2.0, 100.0), (3.0, 80.0)]);
        assert!((score - 88.0).abs() < 1e-9);
    }

    #[test]
    fn empty_scorecard_scores_zero() {
        assert_eq!(combine(&[]), 0.0);
    }

    #[test]
    fn single_test_passes_through() {
        assert!((combine(&[(1.0, 73.5)]) - 73.5).abs() < 1e-9);
    }
}
