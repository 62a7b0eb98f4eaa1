use crate::module::generation::schema::HealthMetricsView;
use std::sync::atomic::{AtomicU64, Ordering};

static GENERATIONS_ACCEPTED: AtomicU64 = AtomicU64::new(0);
static GENERATIONS_SUCCEEDED: AtomicU64 = AtomicU64::new(0);
static GENERATIONS_FAILED: AtomicU64 = AtomicU64::new(0);
static CALLBACK_FAILURES: AtomicU64 = AtomicU64::new(0);

pub fn inc_generations_accepted() {
    GENERATIONS_ACCEPTED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_generations_succeeded() {
    GENERATIONS_SUCCEEDED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_generations_failed() {
    GENERATIONS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_callback_failures() {
    CALLBACK_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> HealthMetricsView {
    HealthMetricsView {
        generations_accepted: GENERATIONS_ACCEPTED.load(Ordering::Relaxed),
        generations_succeeded: GENERATIONS_SUCCEEDED.load(Ordering::Relaxed),
        generations_failed: GENERATIONS_FAILED.load(Ordering::Relaxed),
        callback_failures: CALLBACK_FAILURES.load(Ordering::Relaxed),
    }
}
