//! Transition service for room entries.
//!
//! Every function here follows the same shape: open a transaction, lock
//! the row, parse and guard the state, mutate, commit. Completion
//! additionally writes the attendance booking into the schedule source
//! inside the same transaction, so a failed write-back rolls the state
//! flip back and the operation can be retried.

use attend_core::config::ReconcileConfig;
use attend_core::error::CoreError;
use attend_core::state::{self, RoomEntryState};
use attend_core::types::{DbId, Timestamp};
use attend_db::repositories::{HoldingRepo, RoomEntryRepo, ScheduleRepo};
use attend_db::{models::room_entry::RoomEntry, DbPool};
use chrono::Utc;

use crate::error::EngineError;

const ENTITY: &str = "RoomEntry";

/// Booking key for a completed room entry; retries overwrite nothing.
fn booking_id(entry_id: DbId) -> String {
    format!("room-entry-{entry_id}")
}

/// Attach a pending entry to a holding, freezing the accreditation flag.
///
/// Accreditation degrades to `false` when the holding's term or the
/// student link cannot be resolved; assignment itself still happens.
pub async fn assign(pool: &DbPool, id: DbId, holding_id: DbId) -> Result<RoomEntry, EngineError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let entry = RoomEntryRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = RoomEntryState::parse(&entry.state)?;
    state::guard(ENTITY, current, &[RoomEntryState::Created], "assigned")?;

    let holding = HoldingRepo::fetch(&mut tx, holding_id).await?.ok_or(CoreError::NotFound {
        entity: "Holding",
        id: holding_id,
    })?;

    let student_id = RoomEntryRepo::student_of(&mut tx, id).await?;
    let term = ScheduleRepo::term(&mut tx, holding.course_group_term_id).await?;
    let accredited = match (student_id, term) {
        (Some(student_id), Some(term)) => {
            ScheduleRepo::is_rostered(&mut tx, term.course_group_id, student_id).await?
        }
        _ => false,
    };

    RoomEntryRepo::mark_assigned(&mut tx, id, holding_id, accredited, now).await?;
    tx.commit().await?;

    tracing::debug!(room_entry_id = id, holding_id, accredited, "Room entry assigned");
    reload(pool, id).await
}

/// Swipe-out while the holding is still running. Keeps the holding link;
/// the entry completes when the holding ends.
pub async fn leave(pool: &DbPool, id: DbId, outgoing_id: Option<DbId>) -> Result<RoomEntry, EngineError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let entry = RoomEntryRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = RoomEntryState::parse(&entry.state)?;
    state::guard(ENTITY, current, &[RoomEntryState::Assigned], "left")?;

    RoomEntryRepo::mark_left(&mut tx, id, outgoing_id, now).await?;
    tx.commit().await?;

    tracing::debug!(room_entry_id = id, "Room entry left");
    reload(pool, id).await
}

/// Cancel a pending entry that never reached a holding. No booking is
/// written.
pub async fn cancel(pool: &DbPool, id: DbId, outgoing_id: Option<DbId>) -> Result<RoomEntry, EngineError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let entry = RoomEntryRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = RoomEntryState::parse(&entry.state)?;
    state::guard(ENTITY, current, &[RoomEntryState::Created], "canceled")?;

    RoomEntryRepo::mark_canceled(&mut tx, id, outgoing_id, now).await?;
    tx.commit().await?;

    tracing::debug!(room_entry_id = id, "Room entry canceled");
    reload(pool, id).await
}

/// Withdraw an already-assigned entry from its holding without crediting
/// attendance. Clears the assignment timestamp.
pub async fn discard(pool: &DbPool, id: DbId) -> Result<RoomEntry, EngineError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let entry = RoomEntryRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = RoomEntryState::parse(&entry.state)?;
    state::guard(
        ENTITY,
        current,
        &[RoomEntryState::Assigned, RoomEntryState::Left],
        "canceled",
    )?;

    RoomEntryRepo::mark_discarded(&mut tx, id, now).await?;
    tx.commit().await?;

    tracing::info!(room_entry_id = id, "Room entry discarded");
    reload(pool, id).await
}

/// Complete an entry when its holding ends.
///
/// Writes the attendance booking in the same transaction as the state
/// flip, then seeds a fresh `created` entry in the same room when the
/// student is rostered for a continuation term starting within the
/// configured buffer after this term's end.
pub async fn complete(
    pool: &DbPool,
    cfg: &ReconcileConfig,
    id: DbId,
    outgoing_id: Option<DbId>,
    finished: Option<Timestamp>,
) -> Result<RoomEntry, EngineError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let entry = RoomEntryRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = RoomEntryState::parse(&entry.state)?;
    state::guard(
        ENTITY,
        current,
        &[RoomEntryState::Assigned, RoomEntryState::Left],
        "complete",
    )?;

    let holding_id = entry.holding_id.ok_or_else(|| {
        CoreError::Internal(format!("Room entry {id} is {current} without a holding"))
    })?;
    let holding = HoldingRepo::fetch(&mut tx, holding_id).await?.ok_or(CoreError::NotFound {
        entity: "Holding",
        id: holding_id,
    })?;
    let term = ScheduleRepo::term(&mut tx, holding.course_group_term_id)
        .await?
        .ok_or_else(|| {
            CoreError::RosterLookup(format!(
                "Term {} behind holding {holding_id} vanished from the schedule source",
                holding.course_group_term_id
            ))
        })?;
    let student_id = RoomEntryRepo::student_of(&mut tx, id).await?.ok_or_else(|| {
        CoreError::RosterLookup(format!("Student link of room entry {id} no longer resolves"))
    })?;

    // Entries still `assigned` get the holding's end as their own; `left`
    // entries keep the swipe-out timestamp already on the row.
    let ended = match current {
        RoomEntryState::Assigned => Some(finished.unwrap_or(now)),
        _ => None,
    };

    ScheduleRepo::write_attendance_booking(
        &mut tx,
        &booking_id(id),
        student_id,
        term.course_group_id,
        term.term_no,
        entry.assigned_at,
        ended.or(entry.ended_at),
    )
    .await
    .map_err(|e| CoreError::BookingWrite(e.to_string()))?;

    RoomEntryRepo::mark_complete(&mut tx, id, outgoing_id, ended).await?;

    let window_end = term.end_at + cfg.continuation_buffer;
    if let Some(next) =
        ScheduleRepo::continuation_term(&mut tx, entry.room_id, student_id, term.end_at, window_end)
            .await?
    {
        let seeded = RoomEntryRepo::create(&mut tx, entry.incoming_id, entry.room_id).await?;
        tracing::info!(
            room_entry_id = id,
            seeded_id = seeded.id,
            next_term_id = next.id,
            "Seeded continuation entry"
        );
    }

    tx.commit().await?;

    tracing::debug!(room_entry_id = id, holding_id, "Room entry completed");
    reload(pool, id).await
}

async fn reload(pool: &DbPool, id: DbId) -> Result<RoomEntry, EngineError> {
    RoomEntryRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })
        .map_err(EngineError::from)
}
