use crate::module::refinement_run::schema::HealthMetricsView;
use std::sync::atomic::{AtomicU64, Ordering};

static RUNS_STARTED: AtomicU64 = AtomicU64::new(0);
static WAVES_DISPATCHED: AtomicU64 = AtomicU64::new(0);
static GENERATION_JOBS_DISPATCHED: AtomicU64 = AtomicU64::new(0);
static GENERATION_REPORTS: AtomicU64 = AtomicU64::new(0);
static ANALYSIS_REPORTS: AtomicU64 = AtomicU64::new(0);
static DUPLICATE_REPORTS: AtomicU64 = AtomicU64::new(0);
static JOBS_TIMED_OUT: AtomicU64 = AtomicU64::new(0);
static RETRIES_SCHEDULED: AtomicU64 = AtomicU64::new(0);
static RUNS_COMPLETED: AtomicU64 = AtomicU64::new(0);
static RUNS_FAILED: AtomicU64 = AtomicU64::new(0);

pub fn inc_runs_started() {
    RUNS_STARTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_waves_dispatched() {
    WAVES_DISPATCHED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_generation_jobs_dispatched() {
    GENERATION_JOBS_DISPATCHED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_generation_reports() {
    GENERATION_REPORTS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_analysis_reports() {
    ANALYSIS_REPORTS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_duplicate_reports() {
    DUPLICATE_REPORTS.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_jobs_timed_out() {
    JOBS_TIMED_OUT.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_retries_scheduled() {
    RETRIES_SCHEDULED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_runs_completed() {
    RUNS_COMPLETED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_runs_failed() {
    RUNS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> HealthMetricsView {
    HealthMetricsView {
        runs_started: RUNS_STARTED.load(Ordering::Relaxed),
        waves_dispatched: WAVES_DISPATCHED.load(Ordering::Relaxed),
        generation_jobs_dispatched: GENERATION_JOBS_DISPATCHED.load(Ordering::Relaxed),
        generation_reports: GENERATION_REPORTS.load(Ordering::Relaxed),
        analysis_reports: ANALYSIS_REPORTS.load(Ordering::Relaxed),
        duplicate_reports: DUPLICATE_REPORTS.load(Ordering::Relaxed),
        jobs_timed_out: JOBS_TIMED_OUT.load(Ordering::Relaxed),
        retries_scheduled: RETRIES_SCHEDULED.load(Ordering::Relaxed),
        runs_completed: RUNS_COMPLETED.load(Ordering::Relaxed),
        runs_failed: RUNS_FAILED.load(Ordering::Relaxed),
    }
}
