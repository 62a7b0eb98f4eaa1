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
pub struct ArtifactRef {
    pub id: String,
    #[serde(alias = "r2_path")]
    pub blob_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(alias = "orchestratorCallbackUrl")]
    pub orchestrator_callback_url: String,
    #[serde(alias = "projectId")]
    pub project_id: String,
    #[serde(alias = "waveNumber", default)]
    pub wave_number: u32,
    pub artifacts: Vec<ArtifactRef>,
    pub scorecard: Vec<ScorecardTest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptResponse {
    pub accepted: bool,
    pub project_id: String,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub artifact_id: String,
    pub quality_score: f64,
    pub details: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAnalysisRequest {
    pub results: Vec<AnalysisResult>,
    pub learnings_md: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetricsView {
    pub analyses_accepted: u64,
    pub analyses_reported: u64,
    pub evaluations_requested: u64,
    pub evaluation_failures: u64,
    pub synthesis_failures: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub model_configured: bool,
    pub metrics: HealthMetricsView,
    pub reason: String,
}
