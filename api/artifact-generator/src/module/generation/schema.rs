use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    #[serde(alias = "orchestratorCallbackUrl")]
    pub orchestrator_callback_url: String,
    #[serde(alias = "artifactId")]
    pub artifact_id: String,
    #[serde(alias = "metaPrompt")]
    pub meta_prompt: String,
    #[serde(alias = "output_r2_path", alias = "outputBlobPath")]
    pub output_blob_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptResponse {
    pub accepted: bool,
    pub artifact_id: String,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationOutcome {
    Success,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CostMetrics {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportGenerationRequest {
    pub artifact_id: String,
    pub blob_path: Option<String>,
    pub status: GenerationOutcome,
    pub cost_metrics: CostMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetricsView {
    pub generations_accepted: u64,
    pub generations_succeeded: u64,
    pub generations_failed: u64,
    pub callback_failures: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub model_configured: bool,
    pub blob_store_configured: bool,
    pub metrics: HealthMetricsView,
    pub reason: String,
}
