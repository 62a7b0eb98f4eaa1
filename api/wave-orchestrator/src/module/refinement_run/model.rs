use super::schema::{
    ArtifactStatus, CostTracker, JobKind, JobStatus, ProposedLearnings, RunStatus, ScorecardTest,
    StatusTransition, TerminationConditions,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub project_id: String,
    pub status: RunStatus,
    pub current_wave: u32,
    pub spec_blob_path: String,
    pub scorecard_blob_path: String,
    pub spec_content: String,
    pub scorecard: Vec<ScorecardTest>,
    pub termination_conditions: TerminationConditions,
    pub cost_tracker: CostTracker,
    pub latest_learnings: String,
    pub quality_history: Vec<f64>,
    pub proposed_learnings: Option<ProposedLearnings>,
    pub human_guidance_blob_path: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub transitions: Vec<StatusTransition>,
}

impl RunRecord {
    pub fn transition(&mut self, to: RunStatus, error_code: Option<String>, now: i64) {
        let from = self.status;
        self.status = to;
        self.updated_at = now;
        self.transitions.push(StatusTransition {
            from_status: Some(from),
            to_status: to,
            transitioned_at: now,
            error_code,
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub artifact_id: String,
    pub wave_number: u32,
    pub blob_path: Option<String>,
    pub status: ArtifactStatus,
    pub quality_score: Option<f64>,
    pub evaluation_details: Option<Value>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchedJobRecord {
    pub job_id: String,
    pub artifact_id: Option<String>,
    pub kind: JobKind,
    pub status: JobStatus,
    pub wave_number: u32,
    pub retries: u32,
    pub created_at: i64,
    pub deadline_at: i64,
}

/// Full in-memory state for one project. Artifacts and jobs are keyed maps
/// so lookups by id are direct and iteration order is stable for views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectState {
    pub run: RunRecord,
    pub artifacts: BTreeMap<String, ArtifactRecord>,
    pub jobs: BTreeMap<String, DispatchedJobRecord>,
}

impl ProjectState {
    pub fn pending_jobs(&self, kind: JobKind, wave: u32) -> usize {
        self.jobs
            .values()
            .filter(|j| j.kind == kind && j.wave_number == wave && j.status == JobStatus::Pending)
            .count()
    }

    pub fn wave_successes(&self, wave: u32) -> Vec<&ArtifactRecord> {
        self.artifacts
            .values()
            .filter(|a| a.wave_number == wave && a.status == ArtifactStatus::Success)
            .collect()
    }

    pub fn completed_generation_jobs(&self) -> usize {
        self.jobs
            .values()
            .filter(|j| j.kind == JobKind::Generation && j.status == JobStatus::Complete)
            .count()
    }

    pub fn job_for_artifact(&self, artifact_id: &str) -> Option<&DispatchedJobRecord> {
        self.jobs
            .values()
            .find(|j| j.kind == JobKind::Generation && j.artifact_id.as_deref() == Some(artifact_id))
    }

    pub fn analysis_job(&self, wave: u32) -> Option<&DispatchedJobRecord> {
        self.jobs
            .values()
            .find(|j| j.kind == JobKind::Analysis && j.wave_number == wave)
    }
}
