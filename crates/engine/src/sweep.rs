//! One-shot bodies of the periodic cleanup sweeps.
//!
//! The API crate's background tasks call these on an interval; keeping
//! the bodies here lets the integration tests drive a sweep directly
//! against a database without timers. Each sweep returns how many records
//! it acted on. Per-record failures are logged and skipped so one bad row
//! never stops a sweep.

use attend_core::cleanup::{overrun_backdate, stale_entry_action, StaleEntryAction};
use attend_core::config::ReconcileConfig;
use attend_core::types::TermWindow;
use attend_db::repositories::{EntryRepo, HoldingRepo, RoomEntryRepo, ScheduleRepo};
use attend_db::DbPool;
use chrono::Utc;

use crate::error::EngineError;
use crate::notify::Notifier;
use crate::{holding, room_entry};

/// Cancel `created` room entries that no holding will legitimately pick
/// up any more.
pub async fn entry_cleanup_once(pool: &DbPool, cfg: &ReconcileConfig) -> Result<u64, EngineError> {
    let now = Utc::now();
    let mut canceled = 0;

    for entry in RoomEntryRepo::all_created(pool).await? {
        let windows = match ScheduleRepo::day_windows(pool, entry.room_id, entry.created_at).await {
            Ok(windows) => windows,
            Err(err) => {
                tracing::error!(
                    room_entry_id = entry.id,
                    error = %err,
                    "Failed to load day schedule, skipping entry"
                );
                continue;
            }
        };

        match stale_entry_action(entry.created_at, now, cfg.entry_lifetime, cfg.entry_buffer, &windows)
        {
            StaleEntryAction::Keep => {}
            StaleEntryAction::Cancel => {
                match room_entry::cancel(pool, entry.id, None).await {
                    Ok(_) => {
                        tracing::info!(room_entry_id = entry.id, "Canceled stale room entry");
                        canceled += 1;
                    }
                    // A holding claimed it between the listing and the lock.
                    Err(err) if err.is_invalid_transition() => {
                        tracing::debug!(room_entry_id = entry.id, "Entry advanced concurrently");
                    }
                    Err(err) => {
                        tracing::error!(
                            room_entry_id = entry.id,
                            error = %err,
                            "Failed to cancel stale room entry"
                        );
                    }
                }
            }
        }
    }

    Ok(canceled)
}

/// Force-end running holdings whose scheduled term ended more than the
/// overdraft ago, backdating the end to the scheduled term end.
pub async fn holding_cleanup_once(
    pool: &DbPool,
    cfg: &ReconcileConfig,
    notifier: &Notifier,
) -> Result<u64, EngineError> {
    let now = Utc::now();
    let mut ended = 0;

    for running in HoldingRepo::list_running(pool).await? {
        let Some(initiated) = running.initiated_at else {
            tracing::warn!(holding_id = running.id, "Running holding without initiation time");
            continue;
        };
        let term = match ScheduleRepo::find_term(pool, running.course_group_term_id).await? {
            Some(term) => term,
            None => {
                tracing::warn!(
                    holding_id = running.id,
                    term_id = running.course_group_term_id,
                    "Term vanished from the schedule source, skipping overrun check"
                );
                continue;
            }
        };

        let window = TermWindow {
            start: term.start_at,
            end: term.end_at,
        };
        if let Some(backdate) = overrun_backdate(initiated, window, cfg.holding_overdraft, now) {
            match holding::end(pool, cfg, notifier, running.id, Some(backdate)).await {
                Ok(_) => {
                    tracing::info!(holding_id = running.id, %backdate, "Force-ended overrun holding");
                    ended += 1;
                }
                Err(err) if err.is_invalid_transition() => {
                    tracing::debug!(holding_id = running.id, "Holding advanced concurrently");
                }
                Err(err) => {
                    tracing::error!(
                        holding_id = running.id,
                        error = %err,
                        "Failed to force-end overrun holding"
                    );
                }
            }
        }
    }

    Ok(ended)
}

/// Detach student links on clock events whose student no longer exists in
/// the schedule replica. The original id is preserved in the entry's
/// status column.
pub async fn student_link_cleanup_once(pool: &DbPool) -> Result<u64, EngineError> {
    let mut detached = 0;

    for entry in EntryRepo::with_dangling_student(pool).await? {
        tracing::warn!(
            entry_id = entry.id,
            student_id = entry.student_id,
            "Detaching vanished student from clock event"
        );
        if EntryRepo::detach_student(pool, entry.id).await? {
            detached += 1;
        }
    }

    Ok(detached)
}
