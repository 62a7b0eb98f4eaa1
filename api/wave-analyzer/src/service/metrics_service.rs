use crate::module::analysis::schema::HealthMetricsView;
use std::sync::atomic::{AtomicU64, Ordering};

static ANALYSES_ACCEPTED: AtomicU64 = AtomicU64::new(0);
static ANALYSES_REPORTED: AtomicU64 = AtomicU64::new(0);
static EVALUATIONS_REQUESTED: AtomicU64 = AtomicU64::new(0);
static EVALUATION_FAILURES: AtomicU64 = AtomicU64::new(0);
static SYNTHESIS_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn inc_analyses_accepted() {
    ANALYSES_ACCEPTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_analyses_reported() {
    ANALYSES_REPORTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_evaluations_requested() {
    EVALUATIONS_REQUESTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_evaluation_failures() {
    EVALUATION_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_synthesis_failures() {
    SYNTHESIS_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> HealthMetricsView {
    HealthMetricsView {
        analyses_accepted: ANALYSES_ACCEPTED.load(Ordering::Relaxed),
        analyses_reported: ANALYSES_REPORTED.load(Ordering::Relaxed),
        evaluations_requested: EVALUATIONS_REQUESTED.load(Ordering::Relaxed),
        evaluation_failures: EVALUATION_FAILURES.load(Ordering::Relaxed),
        synthesis_failures: SYNTHESIS_FAILURES.load(Ordering::Relaxed),
    }
}
