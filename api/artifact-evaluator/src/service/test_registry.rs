use crate::app::AppState;
use crate::module::evaluation::schema::ScorecardTest;
use crate::service::metrics_service;
use crate::service::{judge_service, linter_service};
use serde_json::{Value, json};
use tracing::warn;

/// Dispatch one scorecard test to its handler. Handlers are keyed by the
/// string `test_type`; an unknown kind and any handler error both degrade
/// to a zero-score result so one bad test never aborts the evaluation.
pub async fn run_test(state: &AppState, artifact: &str, test: &ScorecardTest) -> Value {
    let outcome = match test.test_type.as_str() {
        "linter" => linter_service::run(artifact, &test.config),
        "llm_evaluation" => judge_service::run(state, artifact, &test.config).await,
        _ => Err("unknown test type".to_string()),
    };
    match outcome {
        Ok(result) => result,
        Err(error) => {
            warn!(test_type = %test.test_type, error = %error, "scorecard test failed");
            metrics_service::inc_test_failures();
            json!({"score": 0.0, "error": error})
        }
    }
}
