use crate::app::AppState;
use crate::module::refinement_run::crud;
use chrono::Utc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Arm a deadline timer for a dispatched job. The timer fires through the
/// same serialized reconciliation path as callbacks, and firing on an
/// already-terminal job is a no-op, so reconciliation "cancels" the timer
/// simply by settling the job first.
pub fn arm(state: AppState, project_id: String, job_id: String, deadline_at: i64) {
    tokio::spawn(async move {
        let wait_ms = (deadline_at - Utc::now().timestamp_millis()).max(0) as u64;
        sleep(Duration::from_millis(wait_ms)).await;
        if let Err(e) = crud::handle_timeout(&state, &project_id, &job_id).await {
            warn!(project_id = %project_id, job_id = %job_id, error = %e.message, "timeout handling failed");
        }
    });
}
