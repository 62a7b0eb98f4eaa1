use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorecardTest {
    #[serde(alias = "testType")]
    pub test_type: String,
    pub weight: f64,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    #[serde(alias = "artifactPath", alias = "r2_path")]
    pub artifact_path: String,
    pub scorecard: Vec<ScorecardTest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub quality_score: f64,
    pub details: Value,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetricsView {
    pub evaluations_served: u64,
    pub tests_run: u64,
    pub test_failures: u64,
    pub judge_parse_fallbacks: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub model_configured: bool,
    pub blob_store_configured: bool,
    pub metrics: HealthMetricsView,
    pub reason: String,
}
