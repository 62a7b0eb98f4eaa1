use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    #[serde(alias = "specContentB64")]
    pub spec_content_b64: String,
    #[serde(alias = "scorecardContentB64")]
    pub scorecard_content_b64: String,
    #[serde(alias = "terminationConditions")]
    pub termination_conditions: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartResponse {
    pub accepted: bool,
    #[serde(alias = "projectId")]
    pub project_id: String,
    pub status_endpoint: String,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetricsView {
    pub runs_requested: u64,
    pub runs_forwarded: u64,
    pub runs_rejected: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub orchestrator_base_url: String,
    pub metrics: HealthMetricsView,
    pub reason: String,
}
