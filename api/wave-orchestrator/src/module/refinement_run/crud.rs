use super::error::AppError;
use super::model::{ArtifactRecord, DispatchedJobRecord, ProjectState, RunRecord};
use super::schema::{
    AckResponse, AnalysisResult, ApproveRunRequest, ArtifactStatus, ArtifactView, CostTracker,
    GenerationOutcome, JobKind, JobStatus, JobView, ProposedLearnings, ReportAnalysisRequest,
    ReportGenerationRequest, RunStatus, RunStatusResponse, RunView, ScorecardTest,
    StartRunRequest, StartRunResponse, StatusTransition, TopArtifact, WaveSummary,
};
use crate::app::AppState;
use crate::infra::{RUNS_COLLECTION, RUNS_INDEX_KEY};
use crate::service::dispatch_service::{
    self, AnalysisArtifactRef, AnalyzeDispatchRequest, GenerateDispatchRequest,
};
use crate::service::termination_service::{self, TerminationDecision};
use crate::service::{blob_service, cost_service, metrics_service, prompt_service, timeout_service};
use chrono::Utc;
use redis::AsyncCommands;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Registry of per-project state. Each project sits behind its own async
/// mutex; a handler holds that lock for its whole read-compute-persist-commit
/// span, which gives callbacks, timeouts and approvals for one project a
/// total order while leaving other projects untouched.
#[derive(Debug, Default)]
pub struct RunStore {
    projects: RwLock<HashMap<String, Arc<Mutex<ProjectState>>>>,
}

enum SideEffect {
    Timer {
        job_id: String,
        deadline_at: i64,
    },
    Generation {
        job_id: String,
        request: GenerateDispatchRequest,
    },
    Analysis {
        job_id: String,
        request: AnalyzeDispatchRequest,
    },
}

pub async fn start_run(
    state: &AppState,
    req: StartRunRequest,
) -> Result<StartRunResponse, AppError> {
    validate_start_request(&req)?;
    let scorecard = parse_scorecard(&req.scorecard_content)?;

    if let Some(project) = get_project(state, &req.project_id).await? {
        let guard = project.lock().await;
        if guard.run.status != RunStatus::Idle {
            return Ok(StartRunResponse {
                accepted: true,
                idempotent: true,
                project_id: req.project_id,
                status: Some(guard.run.status),
                error_code: None,
                reason: "run already exists".to_string(),
            });
        }
    }

    let now = Utc::now().timestamp_millis();
    let run = RunRecord {
        project_id: req.project_id.clone(),
        status: RunStatus::Idle,
        current_wave: 1,
        spec_blob_path: blob_service::spec_blob_path(&req.project_id),
        scorecard_blob_path: blob_service::scorecard_blob_path(&req.project_id),
        spec_content: req.spec_content.clone(),
        scorecard,
        termination_conditions: req.termination_conditions.clone().unwrap_or_default(),
        cost_tracker: CostTracker::default(),
        latest_learnings: String::new(),
        quality_history: Vec::new(),
        proposed_learnings: None,
        human_guidance_blob_path: None,
        created_at: now,
        updated_at: now,
        transitions: vec![StatusTransition {
            from_status: None,
            to_status: RunStatus::Idle,
            transitioned_at: now,
            error_code: None,
        }],
    };
    let project = insert_project(
        state,
        &req.project_id,
        ProjectState {
            run,
            artifacts: BTreeMap::new(),
            jobs: BTreeMap::new(),
        },
    )
    .await;

    let mut guard = project.lock().await;
    if guard.run.status != RunStatus::Idle {
        return Ok(StartRunResponse {
            accepted: true,
            idempotent: true,
            project_id: req.project_id,
            status: Some(guard.run.status),
            error_code: None,
            reason: "run already exists".to_string(),
        });
    }

    blob_service::put_text(
        &state.config,
        &guard.run.spec_blob_path,
        &req.spec_content,
        "text/markdown",
    )
    .await
    .map_err(|e| AppError::internal("BLOB_WRITE_FAILED", e))?;
    blob_service::put_text(
        &state.config,
        &guard.run.scorecard_blob_path,
        &req.scorecard_content,
        "application/json",
    )
    .await
    .map_err(|e| AppError::internal("BLOB_WRITE_FAILED", e))?;

    let mut next = guard.clone();
    let mut effects = Vec::new();
    enter_generating(state, &mut next, &mut effects).await;
    commit(state, &mut guard, next).await?;
    let status = guard.run.status;
    drop(guard);
    fire_effects(state, &req.project_id, effects);
    metrics_service::inc_runs_started();
    info!(project_id = %req.project_id, status = status.as_str(), "run started");

    Ok(StartRunResponse {
        accepted: true,
        idempotent: false,
        project_id: req.project_id,
        status: Some(status),
        error_code: None,
        reason: "run started".to_string(),
    })
}

pub async fn get_run(state: &AppState, project_id: &str) -> Result<RunStatusResponse, AppError> {
    let Some(project) = get_project(state, project_id).await? else {
        return Ok(RunStatusResponse {
            found: false,
            run: None,
            error_code: Some("RUN_NOT_FOUND".to_string()),
            reason: "no run for project".to_string(),
        });
    };
    let guard = project.lock().await;
    Ok(RunStatusResponse {
        found: true,
        run: Some(to_view(&guard)),
        error_code: None,
        reason: "run found".to_string(),
    })
}

pub async fn report_generation(
    state: &AppState,
    project_id: &str,
    req: ReportGenerationRequest,
) -> Result<AckResponse, AppError> {
    if req.artifact_id.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_ARTIFACT_ID",
            "artifact_id is required",
        ));
    }
    let project = get_project(state, project_id)
        .await?
        .ok_or_else(|| AppError::not_found("RUN_NOT_FOUND", "no run for project"))?;
    let mut guard = project.lock().await;

    let (job_id, already_terminal) = match guard.job_for_artifact(&req.artifact_id) {
        Some(job) => (job.job_id.clone(), job.status.is_terminal()),
        None => {
            return Err(AppError::not_found(
                "UNKNOWN_ARTIFACT",
                "no dispatched job for artifact",
            ));
        }
    };
    if already_terminal {
        metrics_service::inc_duplicate_reports();
        return Ok(ack_idempotent(project_id, "report already reconciled"));
    }

    let now = Utc::now().timestamp_millis();
    let mut next = guard.clone();
    if let Some(job) = next.jobs.get_mut(&job_id) {
        job.status = match req.status {
            GenerationOutcome::Success => JobStatus::Complete,
            GenerationOutcome::Failed => JobStatus::Failed,
        };
    }
    let wave = {
        let artifact = next
            .artifacts
            .get_mut(&req.artifact_id)
            .ok_or_else(|| AppError::not_found("UNKNOWN_ARTIFACT", "no artifact record"))?;
        match req.status {
            GenerationOutcome::Success => {
                artifact.status = ArtifactStatus::Success;
                artifact.blob_path = req.blob_path.clone().or_else(|| {
                    Some(blob_service::artifact_blob_path(
                        artifact.wave_number,
                        &artifact.artifact_id,
                    ))
                });
            }
            GenerationOutcome::Failed => {
                artifact.status = ArtifactStatus::Failed;
            }
        }
        artifact.wave_number
    };
    if req.status == GenerationOutcome::Success {
        cost_service::accumulate(&state.config, &mut next.run.cost_tracker, &req.cost_metrics);
    }
    next.run.updated_at = now;

    let mut effects = Vec::new();
    settle_generation_wave(state, &mut next, wave, &mut effects, now);
    commit(state, &mut guard, next).await?;
    drop(guard);
    fire_effects(state, project_id, effects);
    metrics_service::inc_generation_reports();

    Ok(AckResponse {
        accepted: true,
        idempotent: false,
        project_id: project_id.to_string(),
        error_code: None,
        reason: "generation report reconciled".to_string(),
    })
}

pub async fn report_analysis(
    state: &AppState,
    project_id: &str,
    req: ReportAnalysisRequest,
) -> Result<AckResponse, AppError> {
    let project = get_project(state, project_id)
        .await?
        .ok_or_else(|| AppError::not_found("RUN_NOT_FOUND", "no run for project"))?;
    let mut guard = project.lock().await;

    let wave = guard.run.current_wave;
    let (job_id, already_terminal) = match guard.analysis_job(wave) {
        Some(job) => (job.job_id.clone(), job.status.is_terminal()),
        None => {
            // A late report for an earlier, already-settled wave is a no-op;
            // a report with no analysis job at all is a caller error.
            let settled_earlier = guard
                .jobs
                .values()
                .any(|j| j.kind == JobKind::Analysis && j.status.is_terminal());
            if settled_earlier {
                metrics_service::inc_duplicate_reports();
                return Ok(ack_idempotent(project_id, "analysis already reconciled"));
            }
            return Err(AppError::conflict(
                "NO_ANALYSIS_PENDING",
                "no analysis job for current wave",
            ));
        }
    };
    if already_terminal || guard.run.status != RunStatus::Analyzing {
        metrics_service::inc_duplicate_reports();
        return Ok(ack_idempotent(project_id, "analysis already reconciled"));
    }

    let now = Utc::now().timestamp_millis();
    let mut next = guard.clone();
    if let Some(job) = next.jobs.get_mut(&job_id) {
        job.status = JobStatus::Complete;
    }
    for result in &req.results {
        match next.artifacts.get_mut(&result.artifact_id) {
            Some(artifact) => {
                artifact.quality_score = Some(result.quality_score);
                artifact.evaluation_details = Some(result.details.clone());
            }
            None => {
                warn!(project_id = %project_id, artifact_id = %result.artifact_id, "analysis result for unknown artifact")
            }
        }
    }
    let best = req
        .results
        .iter()
        .map(|r| r.quality_score)
        .fold(f64::NEG_INFINITY, f64::max);
    next.run
        .quality_history
        .push(if best.is_finite() { best } else { 0.0 });

    let viable = next
        .artifacts
        .values()
        .filter(|a| a.quality_score.unwrap_or(0.0) >= state.config.viability_threshold)
        .count() as u32;
    let decision = termination_service::evaluate(
        &next.run.termination_conditions,
        next.run.current_wave,
        &next.run.cost_tracker,
        &next.run.quality_history,
        viable,
    );

    let mut effects = Vec::new();
    match decision {
        TerminationDecision::AwaitApproval => {
            next.run.proposed_learnings = Some(ProposedLearnings {
                analysis_summary: req.learnings_md.clone(),
                top_artifacts: top_candidates(&req.results),
            });
            next.run.transition(RunStatus::AwaitingApproval, None, now);
        }
        TerminationDecision::BudgetExceeded => {
            next.run.transition(
                RunStatus::CompletedBudgetExceeded,
                Some("BUDGET_EXCEEDED".to_string()),
                now,
            );
            metrics_service::inc_runs_completed();
        }
        TerminationDecision::Completed(reason) => {
            next.run.transition(RunStatus::Completed, None, now);
            metrics_service::inc_runs_completed();
            info!(project_id = %project_id, wave, reason = reason.as_str(), "run completed");
        }
        TerminationDecision::Continue => {
            next.run.current_wave += 1;
            next.run.latest_learnings = req.learnings_md.clone();
            enter_generating(state, &mut next, &mut effects).await;
        }
    }

    commit(state, &mut guard, next).await?;
    drop(guard);
    fire_effects(state, project_id, effects);
    metrics_service::inc_analysis_reports();

    Ok(AckResponse {
        accepted: true,
        idempotent: false,
        project_id: project_id.to_string(),
        error_code: None,
        reason: "analysis report reconciled".to_string(),
    })
}

pub async fn approve_run(
    state: &AppState,
    project_id: &str,
    req: ApproveRunRequest,
) -> Result<AckResponse, AppError> {
    let project = get_project(state, project_id)
        .await?
        .ok_or_else(|| AppError::not_found("RUN_NOT_FOUND", "no run for project"))?;
    let mut guard = project.lock().await;
    if guard.run.status != RunStatus::AwaitingApproval {
        return Err(AppError::conflict(
            "NOT_AWAITING_APPROVAL",
            "run is not awaiting approval",
        ));
    }

    let mut next = guard.clone();
    if let Some(path) = req.human_guidance_blob_path.clone() {
        next.run.human_guidance_blob_path = Some(path);
    }
    if let Some(proposed) = next.run.proposed_learnings.take() {
        next.run.latest_learnings = proposed.analysis_summary;
    }
    next.run.current_wave += 1;

    let mut effects = Vec::new();
    enter_generating(state, &mut next, &mut effects).await;
    commit(state, &mut guard, next).await?;
    let status = guard.run.status;
    drop(guard);
    fire_effects(state, project_id, effects);
    info!(project_id = %project_id, status = status.as_str(), "run approved");

    Ok(AckResponse {
        accepted: true,
        idempotent: false,
        project_id: project_id.to_string(),
        error_code: None,
        reason: "approval accepted".to_string(),
    })
}

/// Deadline expiry for one dispatched job. Terminal jobs are ignored, so a
/// callback that raced the timer wins cleanly.
pub async fn handle_timeout(
    state: &AppState,
    project_id: &str,
    job_id: &str,
) -> Result<(), AppError> {
    let Some(project) = get_project(state, project_id).await? else {
        return Ok(());
    };
    let mut guard = project.lock().await;
    let (kind, wave, retries, artifact_id) = match guard.jobs.get(job_id) {
        Some(job) if !job.status.is_terminal() => {
            (job.kind, job.wave_number, job.retries, job.artifact_id.clone())
        }
        _ => return Ok(()),
    };

    let now = Utc::now().timestamp_millis();
    let mut next = guard.clone();
    let mut effects = Vec::new();

    if retries < state.config.max_retries {
        let deadline = now
            + match kind {
                JobKind::Generation => state.config.generation_timeout_ms,
                JobKind::Analysis => state.config.analysis_timeout_ms,
            }
            .max(0);
        if let Some(job) = next.jobs.get_mut(job_id) {
            job.retries += 1;
            job.deadline_at = deadline;
        }
        effects.push(SideEffect::Timer {
            job_id: job_id.to_string(),
            deadline_at: deadline,
        });
        match kind {
            JobKind::Generation => {
                let artifact_id = artifact_id.unwrap_or_default();
                let request =
                    build_generation_request(state, &next, wave, &artifact_id).await;
                effects.push(SideEffect::Generation {
                    job_id: job_id.to_string(),
                    request,
                });
            }
            JobKind::Analysis => {
                let request = build_analysis_request(state, &next, wave);
                effects.push(SideEffect::Analysis {
                    job_id: job_id.to_string(),
                    request,
                });
            }
        }
        metrics_service::inc_retries_scheduled();
        warn!(project_id = %project_id, job_id = %job_id, retry = retries + 1, "job deadline passed; re-dispatching");
    } else {
        if let Some(job) = next.jobs.get_mut(job_id) {
            job.status = JobStatus::TimedOut;
        }
        metrics_service::inc_jobs_timed_out();
        match kind {
            JobKind::Generation => {
                if let Some(artifact_id) = &artifact_id {
                    if let Some(artifact) = next.artifacts.get_mut(artifact_id) {
                        if artifact.status == ArtifactStatus::Pending {
                            artifact.status = ArtifactStatus::Failed;
                        }
                    }
                }
                settle_generation_wave(state, &mut next, wave, &mut effects, now);
            }
            JobKind::Analysis => {
                if !next.run.status.is_terminal() {
                    next.run.transition(
                        RunStatus::Failed,
                        Some("ANALYSIS_TIMEOUT".to_string()),
                        now,
                    );
                    metrics_service::inc_runs_failed();
                }
            }
        }
        warn!(project_id = %project_id, job_id = %job_id, "job retries exhausted; marked timed out");
    }

    commit(state, &mut guard, next).await?;
    drop(guard);
    fire_effects(state, project_id, effects);
    Ok(())
}

/// A dispatch POST that failed synchronously. The job is settled as failed
/// without a retry; the generator side never accepted the work.
pub async fn record_dispatch_failure(
    state: &AppState,
    project_id: &str,
    job_id: &str,
    reason: &str,
) -> Result<(), AppError> {
    let Some(project) = get_project(state, project_id).await? else {
        return Ok(());
    };
    let mut guard = project.lock().await;
    let (kind, wave, artifact_id) = match guard.jobs.get(job_id) {
        Some(job) if !job.status.is_terminal() => {
            (job.kind, job.wave_number, job.artifact_id.clone())
        }
        _ => return Ok(()),
    };

    let now = Utc::now().timestamp_millis();
    let mut next = guard.clone();
    if let Some(job) = next.jobs.get_mut(job_id) {
        job.status = JobStatus::Failed;
    }
    let mut effects = Vec::new();
    match kind {
        JobKind::Generation => {
            if let Some(artifact_id) = &artifact_id {
                if let Some(artifact) = next.artifacts.get_mut(artifact_id) {
                    artifact.status = ArtifactStatus::Failed;
                }
            }
            settle_generation_wave(state, &mut next, wave, &mut effects, now);
        }
        JobKind::Analysis => {
            if !next.run.status.is_terminal() {
                next.run.transition(
                    RunStatus::Failed,
                    Some("ANALYSIS_DISPATCH_FAILED".to_string()),
                    now,
                );
                metrics_service::inc_runs_failed();
            }
        }
    }
    warn!(project_id = %project_id, job_id = %job_id, reason = %reason, "dispatch failed; job marked failed");

    commit(state, &mut guard, next).await?;
    drop(guard);
    fire_effects(state, project_id, effects);
    Ok(())
}

/// Restore all indexed runs from the durable store and re-arm deadline
/// timers for any still-pending jobs.
pub async fn rehydrate_runs(state: &AppState) -> Result<usize, String> {
    let Some(infra) = &state.infra else {
        return Ok(0);
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| format!("redis connect failed: {e}"))?;
    let project_ids: Vec<String> = conn
        .smembers(RUNS_INDEX_KEY)
        .await
        .map_err(|e| format!("redis query failed: {e}"))?;

    let mut restored = 0usize;
    for project_id in project_ids {
        {
            let projects = state.store.projects.read().await;
            if projects.contains_key(&project_id) {
                continue;
            }
        }
        match load_project_from_redis(state, &project_id).await {
            Ok(Some(ps)) => {
                insert_and_arm(state, &project_id, ps).await;
                restored += 1;
            }
            Ok(None) => warn!(project_id = %project_id, "indexed run missing from durable store"),
            Err(e) => warn!(project_id = %project_id, error = %e, "run rehydration failed"),
        }
    }
    Ok(restored)
}

/// Enter GENERATING for the run's current wave: affordability gate, then
/// artifact/job rows and the dispatch plus timer effects for each slot.
async fn enter_generating(
    state: &AppState,
    ps: &mut ProjectState,
    effects: &mut Vec<SideEffect>,
) {
    let now = Utc::now().timestamp_millis();
    let completed = ps.completed_generation_jobs();
    if !cost_service::within_budget(
        &state.config,
        &ps.run.cost_tracker,
        completed,
        ps.run.termination_conditions.max_cost_usd,
    ) {
        ps.run.transition(
            RunStatus::CompletedBudgetExceeded,
            Some("BUDGET_EXCEEDED".to_string()),
            now,
        );
        metrics_service::inc_runs_completed();
        info!(project_id = %ps.run.project_id, wave = ps.run.current_wave, "next wave unaffordable; run closed under budget");
        return;
    }

    ps.run.transition(RunStatus::Generating, None, now);
    let wave = ps.run.current_wave;
    let meta_prompt = build_meta_prompt_for_run(state, &ps.run).await;
    let callback = dispatch_service::generation_callback_url(state, &ps.run.project_id);
    let deadline = now + state.config.generation_timeout_ms.max(0);

    for i in 1..=state.config.generator_count_per_wave {
        let artifact_id = format!("w{wave}-a{i}");
        let output_blob_path = blob_service::artifact_blob_path(wave, &artifact_id);
        ps.artifacts.insert(
            artifact_id.clone(),
            ArtifactRecord {
                artifact_id: artifact_id.clone(),
                wave_number: wave,
                blob_path: None,
                status: ArtifactStatus::Pending,
                quality_score: None,
                evaluation_details: None,
                created_at: now,
            },
        );
        let job_id = Uuid::new_v4().to_string();
        ps.jobs.insert(
            job_id.clone(),
            DispatchedJobRecord {
                job_id: job_id.clone(),
                artifact_id: Some(artifact_id.clone()),
                kind: JobKind::Generation,
                status: JobStatus::Pending,
                wave_number: wave,
                retries: 0,
                created_at: now,
                deadline_at: deadline,
            },
        );
        effects.push(SideEffect::Timer {
            job_id: job_id.clone(),
            deadline_at: deadline,
        });
        effects.push(SideEffect::Generation {
            job_id,
            request: GenerateDispatchRequest {
                orchestrator_callback_url: callback.clone(),
                artifact_id,
                meta_prompt: meta_prompt.clone(),
                output_blob_path,
            },
        });
    }
    metrics_service::inc_waves_dispatched();
    info!(project_id = %ps.run.project_id, wave, jobs = state.config.generator_count_per_wave, "wave dispatched");
}

/// Once every generation job of the wave is terminal, either fail the run
/// (no survivors) or move to ANALYZING and dispatch the analysis job.
fn settle_generation_wave(
    state: &AppState,
    ps: &mut ProjectState,
    wave: u32,
    effects: &mut Vec<SideEffect>,
    now: i64,
) {
    if ps.run.status != RunStatus::Generating || ps.run.current_wave != wave {
        return;
    }
    if ps.pending_jobs(JobKind::Generation, wave) > 0 {
        return;
    }
    if ps.wave_successes(wave).is_empty() {
        ps.run
            .transition(RunStatus::Failed, Some("WAVE_FAILED".to_string()), now);
        metrics_service::inc_runs_failed();
        warn!(project_id = %ps.run.project_id, wave, "wave produced no artifacts");
        return;
    }

    ps.run.transition(RunStatus::Analyzing, None, now);
    let job_id = Uuid::new_v4().to_string();
    let deadline = now + state.config.analysis_timeout_ms.max(0);
    ps.jobs.insert(
        job_id.clone(),
        DispatchedJobRecord {
            job_id: job_id.clone(),
            artifact_id: None,
            kind: JobKind::Analysis,
            status: JobStatus::Pending,
            wave_number: wave,
            retries: 0,
            created_at: now,
            deadline_at: deadline,
        },
    );
    effects.push(SideEffect::Timer {
        job_id: job_id.clone(),
        deadline_at: deadline,
    });
    effects.push(SideEffect::Analysis {
        job_id,
        request: build_analysis_request(state, ps, wave),
    });
    info!(project_id = %ps.run.project_id, wave, "wave settled; analysis dispatched");
}

async fn build_meta_prompt_for_run(state: &AppState, run: &RunRecord) -> String {
    let human_guidance = match &run.human_guidance_blob_path {
        Some(path) => match blob_service::get_text(&state.config, path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(project_id = %run.project_id, path = %path, error = %e, "human guidance fetch failed; section omitted");
                None
            }
        },
        None => None,
    };
    prompt_service::build_meta_prompt(
        &run.spec_content,
        &run.latest_learnings,
        human_guidance.as_deref(),
    )
}

async fn build_generation_request(
    state: &AppState,
    ps: &ProjectState,
    wave: u32,
    artifact_id: &str,
) -> GenerateDispatchRequest {
    GenerateDispatchRequest {
        orchestrator_callback_url: dispatch_service::generation_callback_url(
            state,
            &ps.run.project_id,
        ),
        artifact_id: artifact_id.to_string(),
        meta_prompt: build_meta_prompt_for_run(state, &ps.run).await,
        output_blob_path: blob_service::artifact_blob_path(wave, artifact_id),
    }
}

fn build_analysis_request(
    state: &AppState,
    ps: &ProjectState,
    wave: u32,
) -> AnalyzeDispatchRequest {
    let artifacts = ps
        .wave_successes(wave)
        .into_iter()
        .map(|a| AnalysisArtifactRef {
            id: a.artifact_id.clone(),
            blob_path: a
                .blob_path
                .clone()
                .unwrap_or_else(|| blob_service::artifact_blob_path(wave, &a.artifact_id)),
        })
        .collect();
    AnalyzeDispatchRequest {
        orchestrator_callback_url: dispatch_service::analysis_callback_url(
            state,
            &ps.run.project_id,
        ),
        project_id: ps.run.project_id.clone(),
        wave_number: wave,
        artifacts,
        scorecard: ps.run.scorecard.clone(),
    }
}

/// Top candidates for the approval view: score descending, artifact id
/// ascending on ties, `min(5, ceil(0.2 N))` entries.
fn top_candidates(results: &[AnalysisResult]) -> Vec<TopArtifact> {
    let mut sorted: Vec<&AnalysisResult> = results.iter().collect();
    sorted.sort_by(|a, b| {
        b.quality_score
            .partial_cmp(&a.quality_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.artifact_id.cmp(&b.artifact_id))
    });
    let k = std::cmp::min(5, (results.len() as f64 * 0.2).ceil() as usize);
    sorted
        .into_iter()
        .take(k)
        .map(|r| TopArtifact {
            artifact_id: r.artifact_id.clone(),
            quality_score: r.quality_score,
        })
        .collect()
}

/// Persist the candidate state, then swap it in. A failed durable write
/// leaves the committed state untouched and drives the run to FAILED.
async fn commit(
    state: &AppState,
    guard: &mut MutexGuard<'_, ProjectState>,
    next: ProjectState,
) -> Result<(), AppError> {
    if let Err(e) = persist_project(state, &next).await {
        warn!(project_id = %next.run.project_id, error = %e, "durable write failed");
        if !guard.run.status.is_terminal() {
            let now = Utc::now().timestamp_millis();
            let mut failed = (**guard).clone();
            failed.run.transition(
                RunStatus::Failed,
                Some("PERSISTENCE_ERROR".to_string()),
                now,
            );
            let _ = persist_project(state, &failed).await;
            **guard = failed;
            metrics_service::inc_runs_failed();
        }
        return Err(AppError::internal("PERSISTENCE_ERROR", e));
    }
    **guard = next;
    Ok(())
}

fn fire_effects(state: &AppState, project_id: &str, effects: Vec<SideEffect>) {
    for effect in effects {
        match effect {
            SideEffect::Timer {
                job_id,
                deadline_at,
            } => timeout_service::arm(state.clone(), project_id.to_string(), job_id, deadline_at),
            SideEffect::Generation { job_id, request } => {
                dispatch_service::spawn_generation(
                    state.clone(),
                    project_id.to_string(),
                    job_id,
                    request,
                );
            }
            SideEffect::Analysis { job_id, request } => {
                dispatch_service::spawn_analysis(
                    state.clone(),
                    project_id.to_string(),
                    job_id,
                    request,
                );
            }
        }
    }
}

fn ack_idempotent(project_id: &str, reason: &str) -> AckResponse {
    AckResponse {
        accepted: true,
        idempotent: true,
        project_id: project_id.to_string(),
        error_code: None,
        reason: reason.to_string(),
    }
}

async fn get_project(
    state: &AppState,
    project_id: &str,
) -> Result<Option<Arc<Mutex<ProjectState>>>, AppError> {
    {
        let projects = state.store.projects.read().await;
        if let Some(project) = projects.get(project_id) {
            return Ok(Some(project.clone()));
        }
    }
    let loaded = load_project_from_redis(state, project_id)
        .await
        .map_err(|e| AppError::internal("REDIS_READ_FAILED", e))?;
    match loaded {
        Some(ps) => Ok(Some(insert_and_arm(state, project_id, ps).await)),
        None => Ok(None),
    }
}

async fn insert_project(
    state: &AppState,
    project_id: &str,
    ps: ProjectState,
) -> Arc<Mutex<ProjectState>> {
    let arc = Arc::new(Mutex::new(ps));
    let mut projects = state.store.projects.write().await;
    if let Some(existing) = projects.get(project_id) {
        return existing.clone();
    }
    projects.insert(project_id.to_string(), arc.clone());
    arc
}

async fn insert_and_arm(
    state: &AppState,
    project_id: &str,
    ps: ProjectState,
) -> Arc<Mutex<ProjectState>> {
    let pending: Vec<(String, i64)> = ps
        .jobs
        .values()
        .filter(|j| j.status == JobStatus::Pending)
        .map(|j| (j.job_id.clone(), j.deadline_at))
        .collect();
    let arc = Arc::new(Mutex::new(ps));
    {
        let mut projects = state.store.projects.write().await;
        if let Some(existing) = projects.get(project_id) {
            return existing.clone();
        }
        projects.insert(project_id.to_string(), arc.clone());
    }
    for (job_id, deadline_at) in pending {
        timeout_service::arm(state.clone(), project_id.to_string(), job_id, deadline_at);
    }
    arc
}

async fn persist_project(state: &AppState, ps: &ProjectState) -> Result<(), String> {
    let Some(infra) = &state.infra else {
        return Ok(());
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| format!("redis connect failed: {e}"))?;
    let run_key = format!("{RUNS_COLLECTION}:{}", ps.run.project_id);
    let payload = serde_json::to_string(&ps.run).map_err(|e| format!("run serialize failed: {e}"))?;
    let _: () = conn
        .set(&run_key, payload)
        .await
        .map_err(|e| format!("redis write failed: {e}"))?;
    let _: usize = conn
        .sadd(RUNS_INDEX_KEY, &ps.run.project_id)
        .await
        .map_err(|e| format!("redis write failed: {e}"))?;

    let artifacts_key = format!("{run_key}:artifacts");
    for artifact in ps.artifacts.values() {
        let payload = serde_json::to_string(artifact)
            .map_err(|e| format!("artifact serialize failed: {e}"))?;
        let _: usize = conn
            .hset(&artifacts_key, &artifact.artifact_id, payload)
            .await
            .map_err(|e| format!("redis write failed: {e}"))?;
    }
    let jobs_key = format!("{run_key}:jobs");
    for job in ps.jobs.values() {
        let payload =
            serde_json::to_string(job).map_err(|e| format!("job serialize failed: {e}"))?;
        let _: usize = conn
            .hset(&jobs_key, &job.job_id, payload)
            .await
            .map_err(|e| format!("redis write failed: {e}"))?;
    }
    Ok(())
}

async fn load_project_from_redis(
    state: &AppState,
    project_id: &str,
) -> Result<Option<ProjectState>, String> {
    let Some(infra) = &state.infra else {
        return Ok(None);
    };
    let mut conn = infra
        .redis
        .get_multiplexed_async_connection()
        .await
        .map_err(|e| format!("redis connect failed: {e}"))?;
    let run_key = format!("{RUNS_COLLECTION}:{project_id}");
    let raw: Option<String> = conn
        .get(&run_key)
        .await
        .map_err(|e| format!("redis query failed: {e}"))?;
    let Some(raw) = raw else {
        return Ok(None);
    };
    let run: RunRecord =
        serde_json::from_str(&raw).map_err(|e| format!("run decode failed: {e}"))?;

    let artifacts_raw: HashMap<String, String> = conn
        .hgetall(format!("{run_key}:artifacts"))
        .await
        .map_err(|e| format!("redis query failed: {e}"))?;
    let mut artifacts = BTreeMap::new();
    for (artifact_id, payload) in artifacts_raw {
        let record: ArtifactRecord = serde_json::from_str(&payload)
            .map_err(|e| format!("artifact decode failed: {e}"))?;
        artifacts.insert(artifact_id, record);
    }

    let jobs_raw: HashMap<String, String> = conn
        .hgetall(format!("{run_key}:jobs"))
        .await
        .map_err(|e| format!("redis query failed: {e}"))?;
    let mut jobs = BTreeMap::new();
    for (job_id, payload) in jobs_raw {
        let record: DispatchedJobRecord =
            serde_json::from_str(&payload).map_err(|e| format!("job decode failed: {e}"))?;
        jobs.insert(job_id, record);
    }

    Ok(Some(ProjectState {
        run,
        artifacts,
        jobs,
    }))
}

fn validate_start_request(req: &StartRunRequest) -> Result<(), AppError> {
    if req.project_id.trim().is_empty() {
        return Err(AppError::bad_request(
            "INVALID_PROJECT_ID",
            "project_id is required",
        ));
    }
    if !req
        .project_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::bad_request(
            "INVALID_PROJECT_ID",
            "project_id contains invalid characters",
        ));
    }
    if req.spec_content.trim().is_empty() {
        return Err(AppError::bad_request("EMPTY_SPEC", "spec_content is required"));
    }
    Ok(())
}

fn parse_scorecard(content: &str) -> Result<Vec<ScorecardTest>, AppError> {
    let tests: Vec<ScorecardTest> = serde_json::from_str(content).map_err(|e| {
        AppError::bad_request("INVALID_SCORECARD", format!("scorecard parse failed: {e}"))
    })?;
    for test in &tests {
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
    }
    Ok(tests)
}

fn to_view(ps: &ProjectState) -> RunView {
    let mut waves: BTreeMap<u32, WaveSummary> = BTreeMap::new();
    for job in ps.jobs.values().filter(|j| j.kind == JobKind::Generation) {
        let entry = waves.entry(job.wave_number).or_insert(WaveSummary {
            wave_number: job.wave_number,
            dispatched: 0,
            succeeded: 0,
            failed: 0,
            timed_out: 0,
            best_score: None,
        });
        entry.dispatched += 1;
        if job.status == JobStatus::TimedOut {
            entry.timed_out += 1;
        }
    }
    for artifact in ps.artifacts.values() {
        let entry = waves.entry(artifact.wave_number).or_insert(WaveSummary {
            wave_number: artifact.wave_number,
            dispatched: 0,
            succeeded: 0,
            failed: 0,
            timed_out: 0,
            best_score: None,
        });
        match artifact.status {
            ArtifactStatus::Success => entry.succeeded += 1,
            ArtifactStatus::Failed => entry.failed += 1,
            ArtifactStatus::Pending => {}
        }
        if let Some(score) = artifact.quality_score {
            entry.best_score = Some(entry.best_score.map_or(score, |b: f64| b.max(score)));
        }
    }

    RunView {
        project_id: ps.run.project_id.clone(),
        status: ps.run.status,
        current_wave: ps.run.current_wave,
        spec_blob_path: ps.run.spec_blob_path.clone(),
        scorecard_blob_path: ps.run.scorecard_blob_path.clone(),
        termination_conditions: ps.run.termination_conditions.clone(),
        cost_tracker: ps.run.cost_tracker,
        latest_learnings: ps.run.latest_learnings.clone(),
        quality_history: ps.run.quality_history.clone(),
        proposed_learnings: ps.run.proposed_learnings.clone(),
        waves: waves.into_values().collect(),
        artifacts: ps
            .artifacts
            .values()
            .map(|a| ArtifactView {
                artifact_id: a.artifact_id.clone(),
                wave_number: a.wave_number,
                blob_path: a.blob_path.clone(),
                status: a.status,
                quality_score: a.quality_score,
                evaluation_details: a.evaluation_details.clone(),
                created_at: a.created_at,
            })
            .collect(),
        jobs: ps
            .jobs
            .values()
            .map(|j| JobView {
                job_id: j.job_id.clone(),
                artifact_id: j.artifact_id.clone(),
                kind: j.kind,
                status: j.status,
                wave_number: j.wave_number,
                retries: j.retries,
                created_at: j.created_at,
                deadline_at: j.deadline_at,
            })
            .collect(),
        transitions: ps.run.transitions.clone(),
        created_at: ps.run.created_at,
        updated_at: ps.run.updated_at,
    }
}
