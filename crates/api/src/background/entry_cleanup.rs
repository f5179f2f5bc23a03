//! Periodic cancelation of stale unassigned room entries.
//!
//! Students swipe in and sometimes never get picked up by a holding (no
//! session started, wrong room). This job cancels those entries once
//! they fall outside every scheduled term window plus the configured
//! grace periods. Runs on a fixed interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use attend_core::config::ReconcileConfig;
use attend_db::DbPool;
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes

/// Run the stale entry cleanup loop until `cancel` is triggered.
pub async fn run(pool: DbPool, cfg: Arc<ReconcileConfig>, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Entry cleanup job started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Entry cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match attend_engine::sweep::entry_cleanup_once(&pool, &cfg).await {
                    Ok(canceled) => {
                        if canceled > 0 {
                            tracing::info!(canceled, "Entry cleanup: canceled stale entries");
                        } else {
                            tracing::debug!("Entry cleanup: nothing to cancel");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Entry cleanup: sweep failed");
                    }
                }
            }
        }
    }
}
