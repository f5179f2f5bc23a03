//! Periodic detachment of vanished students from the clock ledger.
//!
//! The campus replica drops students who unenroll; ledger entries keep
//! their row but must not point at a missing student. This job nulls
//! those links, preserving the original id in the entry's status blob.

use std::time::Duration;

use attend_db::DbPool;
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(900); // 15 minutes

/// Run the student link cleanup loop until `cancel` is triggered.
pub async fn run(pool: DbPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Student link cleanup job started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Student link cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match attend_engine::sweep::student_link_cleanup_once(&pool).await {
                    Ok(detached) => {
                        if detached > 0 {
                            tracing::info!(detached, "Student link cleanup: detached vanished students");
                        } else {
                            tracing::debug!("Student link cleanup: no dangling links");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Student link cleanup: sweep failed");
                    }
                }
            }
        }
    }
}
