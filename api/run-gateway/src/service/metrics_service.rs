use crate::module::start_run::schema::HealthMetricsView;
use std::sync::atomic::{AtomicU64, Ordering};

static RUNS_REQUESTED: AtomicU64 = AtomicU64::new(0);
static RUNS_FORWARDED: AtomicU64 = AtomicU64::new(0);
static RUNS_REJECTED: AtomicU64 = AtomicU64::new(0);

pub fn inc_runs_requested() {
    RUNS_REQUESTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_runs_forwarded() {
    RUNS_FORWARDED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_runs_rejected() {
    RUNS_REJECTED.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> HealthMetricsView {
    HealthMetricsView {
        runs_requested: RUNS_REQUESTED.load(Ordering::Relaxed),
        runs_forwarded: RUNS_FORWARDED.load(Ordering::Relaxed),
        runs_rejected: RUNS_REJECTED.load(Ordering::Relaxed),
    }
}
