//! Periodic force-ending of overrun holdings.
//!
//! Lecturers forget to end sessions. This job ends running holdings
//! whose scheduled term ended more than the overdraft ago, backdating
//! the end to the scheduled term end so bookings stay truthful.

use std::sync::Arc;
use std::time::Duration;

use attend_core::config::ReconcileConfig;
use attend_db::DbPool;
use attend_engine::notify::Notifier;
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes

/// Run the overrun holding cleanup loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    cfg: Arc<ReconcileConfig>,
    notifier: Notifier,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Holding cleanup job started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Holding cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match attend_engine::sweep::holding_cleanup_once(&pool, &cfg, &notifier).await {
                    Ok(ended) => {
                        if ended > 0 {
                            tracing::info!(ended, "Holding cleanup: force-ended overrun holdings");
                        } else {
                            tracing::debug!("Holding cleanup: nothing to end");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Holding cleanup: sweep failed");
                    }
                }
            }
        }
    }
}
