use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Idle,
    Generating,
    Analyzing,
    AwaitingApproval,
    Completed,
    Failed,
    CompletedBudgetExceeded,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Generating => "GENERATING",
            Self::Analyzing => "ANALYZING",
            Self::AwaitingApproval => "AWAITING_APPROVAL",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::CompletedBudgetExceeded => "COMPLETED_BUDGET_EXCEEDED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::CompletedBudgetExceeded
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactStatus {
    Pending,
    Success,
    Failed,
}

impl ArtifactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Generation,
    Analysis,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generation => "generation",
            Self::Analysis => "analysis",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Complete,
    Failed,
    TimedOut,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::TimedOut => "timed_out",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QualityPlateau {
    pub waves: u32,
    pub delta: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TerminationConditions {
    #[serde(alias = "maxWaves")]
    pub max_waves: Option<u32>,
    #[serde(alias = "maxCostUSD")]
    pub max_cost_usd: Option<f64>,
    #[serde(alias = "minViableCandidates")]
    pub min_viable_candidates: Option<u32>,
    #[serde(alias = "qualityPlateau")]
    pub quality_plateau: Option<QualityPlateau>,
    #[serde(alias = "manualApproval")]
    pub manual_approval: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CostTracker {
    pub total_tokens: u64,
    pub estimated_cost_usd: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CostMetrics {
    #[serde(alias = "promptTokens")]
    pub prompt_tokens: u64,
    #[serde(alias = "completionTokens")]
    pub completion_tokens: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusTransition {
    pub from_status: Option<RunStatus>,
    pub to_status: RunStatus,
    pub transitioned_at: i64,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorecardTest {
    #[serde(alias = "testType")]
    pub test_type: String,
    pub weight: f64,
    #[serde(default)]
    pub config: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopArtifact {
    pub artifact_id: String,
    pub quality_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedLearnings {
    pub analysis_summary: String,
    pub top_artifacts: Vec<TopArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRunRequest {
    #[serde(alias = "projectId")]
    pub project_id: String,
    #[serde(alias = "specContent")]
    pub spec_content: String,
    #[serde(alias = "scorecardContent")]
    pub scorecard_content: String,
    #[serde(alias = "terminationConditions")]
    pub termination_conditions: Option<TerminationConditions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRunResponse {
    pub accepted: bool,
    pub idempotent: bool,
    pub project_id: String,
    pub status: Option<RunStatus>,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationOutcome {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportGenerationRequest {
    #[serde(alias = "artifactId")]
    pub artifact_id: String,
    #[serde(alias = "r2_path")]
    pub blob_path: Option<String>,
    pub status: GenerationOutcome,
    #[serde(default)]
    pub cost_metrics: CostMetrics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(alias = "artifactId")]
    pub artifact_id: String,
    #[serde(alias = "qualityScore")]
    pub quality_score: f64,
    #[serde(default)]
    pub details: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAnalysisRequest {
    pub results: Vec<AnalysisResult>,
    #[serde(alias = "learningsMd")]
    pub learnings_md: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApproveRunRequest {
    #[serde(alias = "human_guidance_r2_path")]
    pub human_guidance_blob_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub accepted: bool,
    pub idempotent: bool,
    pub project_id: String,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactView {
    pub artifact_id: String,
    pub wave_number: u32,
    pub blob_path: Option<String>,
    pub status: ArtifactStatus,
    pub quality_score: Option<f64>,
    pub evaluation_details: Option<Value>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: String,
    pub artifact_id: Option<String>,
    pub kind: JobKind,
    pub status: JobStatus,
    pub wave_number: u32,
    pub retries: u32,
    pub created_at: i64,
    pub deadline_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveSummary {
    pub wave_number: u32,
    pub dispatched: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub timed_out: u32,
    pub best_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunView {
    pub project_id: String,
    pub status: RunStatus,
    pub current_wave: u32,
    pub spec_blob_path: String,
    pub scorecard_blob_path: String,
    pub termination_conditions: TerminationConditions,
    pub cost_tracker: CostTracker,
    pub latest_learnings: String,
    pub quality_history: Vec<f64>,
    pub proposed_learnings: Option<ProposedLearnings>,
    pub waves: Vec<WaveSummary>,
    pub artifacts: Vec<ArtifactView>,
    pub jobs: Vec<JobView>,
    pub transitions: Vec<StatusTransition>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatusResponse {
    pub found: bool,
    pub run: Option<RunView>,
    pub error_code: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetricsView {
    pub runs_started: u64,
    pub waves_dispatched: u64,
    pub generation_jobs_dispatched: u64,
    pub generation_reports: u64,
    pub analysis_reports: u64,
    pub duplicate_reports: u64,
    pub jobs_timed_out: u64,
    pub retries_scheduled: u64,
    pub runs_completed: u64,
    pub runs_failed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub redis_available: bool,
    pub metrics: HealthMetricsView,
    pub reason: String,
}
