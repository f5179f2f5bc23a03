//! Transition service for holdings, including the start-time
//! reconciliation of pending room entries and the end-time completion of
//! everything attached.
//!
//! Start and end are multi-phase: the holding's own state flip commits
//! first, then each affected entry is transitioned in its own
//! transaction. A failure on one entry is logged and the batch moves on;
//! rerunning the operation on the surviving records is safe because every
//! transition is guarded and every booking write is idempotent.

use std::collections::HashSet;

use attend_core::config::ReconcileConfig;
use attend_core::error::CoreError;
use attend_core::reconcile::{pending_action, PendingAction};
use attend_core::state::{self, HoldingState};
use attend_core::types::{DbId, Timestamp};
use attend_db::models::campus::Student;
use attend_db::models::holding::Holding;
use attend_db::repositories::{HoldingRepo, ManualEntryRepo, RoomEntryRepo, ScheduleRepo};
use attend_db::DbPool;
use chrono::Utc;

use crate::error::EngineError;
use crate::notify::Notifier;
use crate::{manual_entry, room_entry};

const ENTITY: &str = "Holding";

/// Entry states a holding end (or cancel) still has to deal with.
const LIVE_ENTRY_STATES: &[&str] = &["assigned", "left"];

/// Start a holding: flip it to `running`, force conflicting holdings in
/// the room to end, then sweep the room's pending entries onto it.
pub async fn start(
    pool: &DbPool,
    cfg: &ReconcileConfig,
    notifier: &Notifier,
    id: DbId,
) -> Result<Holding, EngineError> {
    let now = Utc::now();

    let mut tx = pool.begin().await?;
    let holding = HoldingRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = HoldingState::parse(&holding.state)?;
    state::guard(ENTITY, current, &[HoldingState::Pending], "running")?;

    let term = ScheduleRepo::term(&mut tx, holding.course_group_term_id)
        .await?
        .ok_or_else(|| {
            CoreError::RosterLookup(format!(
                "Term {} behind holding {id} vanished from the schedule source",
                holding.course_group_term_id
            ))
        })?;

    HoldingRepo::mark_running(&mut tx, id, now).await?;
    let conflicting = HoldingRepo::conflicting_running(
        &mut tx,
        holding.room_id,
        id,
        term.id,
        term.room_id,
        term.start_at,
        term.end_at,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(holding_id = id, room_id = holding.room_id, "Holding started");

    // A room hosts one session at a time, parallel sessions excepted.
    for conflict_id in conflicting {
        tracing::info!(holding_id = id, conflict_id, "Ending conflicting holding");
        if let Err(err) = end(pool, cfg, notifier, conflict_id, None).await {
            tracing::error!(
                holding_id = conflict_id,
                error = %err,
                "Failed to end conflicting holding"
            );
        }
    }

    // Students rostered for a genuine parallel session keep their pending
    // entries; that session will claim them when it starts.
    let parallel_terms =
        ScheduleRepo::parallel_term_ids(pool, term.room_id, term.start_at, term.end_at, term.id)
            .await?;
    let parallel_students: HashSet<DbId> = if parallel_terms.is_empty() {
        HashSet::new()
    } else {
        ScheduleRepo::students_of_terms(pool, &parallel_terms)
            .await?
            .into_iter()
            .collect()
    };

    for pending in RoomEntryRepo::pending_in_room(pool, holding.room_id).await? {
        match pending_action(pending.student_id, &parallel_students) {
            PendingAction::Assign => {
                if let Err(err) = room_entry::assign(pool, pending.id, id).await {
                    tracing::error!(
                        room_entry_id = pending.id,
                        holding_id = id,
                        error = %err,
                        "Failed to assign pending entry"
                    );
                }
            }
            PendingAction::Skip => {
                tracing::debug!(
                    room_entry_id = pending.id,
                    "Leaving entry for a parallel holding"
                );
            }
            PendingAction::Drop => {
                tracing::warn!(
                    room_entry_id = pending.id,
                    "Dropping pending entry with dangling student link"
                );
                let mut tx = pool.begin().await?;
                RoomEntryRepo::delete(&mut tx, pending.id).await?;
                tx.commit().await?;
            }
        }
    }

    reload(pool, id).await
}

/// End a running holding: flip it to `finished` and write the session
/// booking in one transaction, then complete every live entry and queue
/// the unaccredited-attendee notification.
///
/// `finished` backdates the end (the overrun sweep passes the scheduled
/// term end); it defaults to now.
pub async fn end(
    pool: &DbPool,
    cfg: &ReconcileConfig,
    notifier: &Notifier,
    id: DbId,
    finished: Option<Timestamp>,
) -> Result<Holding, EngineError> {
    let now = Utc::now();
    let finished = finished.unwrap_or(now);

    let mut tx = pool.begin().await?;
    let holding = HoldingRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = HoldingState::parse(&holding.state)?;
    state::guard(ENTITY, current, &[HoldingState::Running], "finished")?;

    let term = ScheduleRepo::term(&mut tx, holding.course_group_term_id)
        .await?
        .ok_or_else(|| {
            CoreError::RosterLookup(format!(
                "Term {} behind holding {id} vanished from the schedule source",
                holding.course_group_term_id
            ))
        })?;
    // Running implies initiated_at was set by the start transition.
    let initiated = holding.initiated_at.ok_or_else(|| {
        CoreError::Internal(format!("Running holding {id} has no initiation timestamp"))
    })?;

    HoldingRepo::mark_finished(&mut tx, id, finished).await?;
    ScheduleRepo::write_session_booking(
        &mut tx,
        id,
        term.course_group_id,
        holding.lecturer_id,
        term.term_no,
        initiated,
        finished,
    )
    .await
    .map_err(|e| CoreError::BookingWrite(e.to_string()))?;
    tx.commit().await?;

    tracing::info!(holding_id = id, %finished, "Holding ended");

    for entry_id in RoomEntryRepo::ids_for_holding_in_states(pool, id, LIVE_ENTRY_STATES).await? {
        if let Err(err) = room_entry::complete(pool, cfg, entry_id, None, Some(finished)).await {
            tracing::error!(
                room_entry_id = entry_id,
                holding_id = id,
                error = %err,
                "Failed to complete room entry"
            );
        }
    }
    for entry_id in ManualEntryRepo::ids_for_holding_in_states(pool, id, LIVE_ENTRY_STATES).await? {
        if let Err(err) = manual_entry::complete(pool, entry_id, Some(finished)).await {
            tracing::error!(
                manual_entry_id = entry_id,
                holding_id = id,
                error = %err,
                "Failed to complete manual entry"
            );
        }
    }

    let room_entry_ids = RoomEntryRepo::unaccredited_ids(pool, id).await?;
    let manual_entry_ids = ManualEntryRepo::unaccredited_ids(pool, id).await?;
    if !room_entry_ids.is_empty() || !manual_entry_ids.is_empty() {
        notifier.notify_unaccredited(id, room_entry_ids, manual_entry_ids);
    }

    reload(pool, id).await
}

/// Cancel a holding that never happened (or was started by mistake).
/// Attached entries are discarded; nothing is booked.
pub async fn cancel(pool: &DbPool, id: DbId) -> Result<Holding, EngineError> {
    let mut tx = pool.begin().await?;
    let holding = HoldingRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = HoldingState::parse(&holding.state)?;
    state::guard(
        ENTITY,
        current,
        &[HoldingState::Pending, HoldingState::Running],
        "canceled",
    )?;

    HoldingRepo::mark_canceled(&mut tx, id).await?;
    tx.commit().await?;

    tracing::info!(holding_id = id, "Holding canceled");

    for entry_id in RoomEntryRepo::ids_for_holding_in_states(pool, id, LIVE_ENTRY_STATES).await? {
        if let Err(err) = room_entry::discard(pool, entry_id).await {
            tracing::error!(
                room_entry_id = entry_id,
                holding_id = id,
                error = %err,
                "Failed to discard room entry"
            );
        }
    }
    for entry_id in ManualEntryRepo::ids_for_holding_in_states(pool, id, LIVE_ENTRY_STATES).await? {
        if let Err(err) = manual_entry::discard(pool, entry_id).await {
            tracing::error!(
                manual_entry_id = entry_id,
                holding_id = id,
                error = %err,
                "Failed to discard manual entry"
            );
        }
    }

    reload(pool, id).await
}

/// The derived "who should have attended" roster for a holding: every
/// student in any course group under the term's parent course. Failures
/// reading the schedule source degrade to an empty list.
pub async fn accredited(pool: &DbPool, id: DbId) -> Result<Vec<Student>, EngineError> {
    let holding = HoldingRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;

    match ScheduleRepo::course_roster_for_term(pool, holding.course_group_term_id).await {
        Ok(students) => Ok(students),
        Err(err) => {
            tracing::warn!(
                holding_id = id,
                error = %err,
                "Roster lookup failed; returning empty accredited list"
            );
            Ok(Vec::new())
        }
    }
}

async fn reload(pool: &DbPool, id: DbId) -> Result<Holding, EngineError> {
    HoldingRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })
        .map_err(EngineError::from)
}
