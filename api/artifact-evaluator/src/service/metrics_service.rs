use crate::module::evaluation::schema::HealthMetricsView;
use std::sync::atomic::{AtomicU64, Ordering};

static EVALUATIONS_SERVED: AtomicU64 = AtomicU64::new(0);
static TESTS_RUN: AtomicU64 = AtomicU64::new(0);
static TEST_FAILURES: AtomicU64 = AtomicU64::new(0);
static JUDGE_PARSE_FALLBACKS: AtomicU64 = AtomicU64::new(0);

pub fn inc_evaluations_served() {
    EVALUATIONS_SERVED.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_tests_run() {
    TESTS_RUN.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_test_failures() {
    TEST_FAILURES.fetch_add(1, Ordering::Relaxed);
}

pub fn inc_judge_parse_fallbacks() {
    JUDGE_PARSE_FALLBACKS.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> HealthMetricsView {
    HealthMetricsView {
        evaluations_served: EVALUATIONS_SERVED.load(Ordering::Relaxed),
        tests_run: TESTS_RUN.load(Ordering::Relaxed),
        test_failures: TEST_FAILURES.load(Ordering::Relaxed),
        judge_parse_fallbacks: JUDGE_PARSE_FALLBACKS.load(Ordering::Relaxed),
    }
}
