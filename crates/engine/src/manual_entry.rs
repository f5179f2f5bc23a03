//! Transition service for lecturer-entered manual entries.
//!
//! Manual entries skip the pending phase: creation puts them straight
//! into `assigned` under a holding. The transition shape otherwise
//! mirrors `room_entry`, minus continuation seeding.

use attend_core::error::CoreError;
use attend_core::state::{self, ManualEntryState};
use attend_core::types::{DbId, Timestamp};
use attend_db::models::manual_entry::{CreateManualEntry, ManualEntry};
use attend_db::repositories::{HoldingRepo, ManualEntryRepo, ScheduleRepo};
use attend_db::DbPool;
use chrono::Utc;

use crate::error::EngineError;

const ENTITY: &str = "ManualEntry";

fn booking_id(entry_id: DbId) -> String {
    format!("manual-entry-{entry_id}")
}

/// Create a manual entry under a holding.
///
/// Any still-`assigned` entry for the same (student, holding) pair is
/// forced to `left` first, so a student never holds two live manual
/// entries in one session.
pub async fn create(pool: &DbPool, input: &CreateManualEntry) -> Result<ManualEntry, EngineError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let holding = HoldingRepo::fetch(&mut tx, input.holding_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Holding",
            id: input.holding_id,
        })?;

    for previous in
        ManualEntryRepo::assigned_for_update(&mut tx, input.holding_id, input.student_id).await?
    {
        tracing::debug!(
            manual_entry_id = previous.id,
            student_id = input.student_id,
            "Forcing duplicate manual entry to left"
        );
        ManualEntryRepo::mark_left(&mut tx, previous.id, now).await?;
    }

    let accredited = match ScheduleRepo::term(&mut tx, holding.course_group_term_id).await? {
        Some(term) => {
            ScheduleRepo::is_rostered(&mut tx, term.course_group_id, input.student_id).await?
        }
        None => false,
    };

    let entry = ManualEntryRepo::create(
        &mut tx,
        input.holding_id,
        input.student_id,
        input.room_id,
        accredited,
    )
    .await?;
    tx.commit().await?;

    tracing::info!(
        manual_entry_id = entry.id,
        holding_id = input.holding_id,
        student_id = input.student_id,
        "Manual entry created"
    );
    Ok(entry)
}

/// The lecturer marked the student as having left early.
pub async fn leave(pool: &DbPool, id: DbId) -> Result<ManualEntry, EngineError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let entry = ManualEntryRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = ManualEntryState::parse(&entry.state)?;
    state::guard(ENTITY, current, &[ManualEntryState::Assigned], "left")?;

    ManualEntryRepo::mark_left(&mut tx, id, now).await?;
    tx.commit().await?;

    tracing::debug!(manual_entry_id = id, "Manual entry left");
    reload(pool, id).await
}

/// Withdraw the entry without crediting attendance.
pub async fn discard(pool: &DbPool, id: DbId) -> Result<ManualEntry, EngineError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let entry = ManualEntryRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = ManualEntryState::parse(&entry.state)?;
    state::guard(
        ENTITY,
        current,
        &[ManualEntryState::Assigned, ManualEntryState::Left],
        "canceled",
    )?;

    ManualEntryRepo::mark_discarded(&mut tx, id, now).await?;
    tx.commit().await?;

    tracing::info!(manual_entry_id = id, "Manual entry discarded");
    reload(pool, id).await
}

/// Complete an entry when its holding ends, writing the attendance
/// booking in the same transaction.
pub async fn complete(
    pool: &DbPool,
    id: DbId,
    finished: Option<Timestamp>,
) -> Result<ManualEntry, EngineError> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let entry = ManualEntryRepo::find_for_update(&mut tx, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })?;
    let current = ManualEntryState::parse(&entry.state)?;
    state::guard(
        ENTITY,
        current,
        &[ManualEntryState::Assigned, ManualEntryState::Left],
        "complete",
    )?;

    let holding = HoldingRepo::fetch(&mut tx, entry.holding_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Holding",
            id: entry.holding_id,
        })?;
    let term = ScheduleRepo::term(&mut tx, holding.course_group_term_id)
        .await?
        .ok_or_else(|| {
            CoreError::RosterLookup(format!(
                "Term {} behind holding {} vanished from the schedule source",
                holding.course_group_term_id, entry.holding_id
            ))
        })?;

    let ended = match current {
        ManualEntryState::Assigned => Some(finished.unwrap_or(now)),
        _ => None,
    };

    ScheduleRepo::write_attendance_booking(
        &mut tx,
        &booking_id(id),
        entry.student_id,
        term.course_group_id,
        term.term_no,
        Some(entry.assigned_at),
        ended.or(entry.ended_at),
    )
    .await
    .map_err(|e| CoreError::BookingWrite(e.to_string()))?;

    ManualEntryRepo::mark_complete(&mut tx, id, ended).await?;
    tx.commit().await?;

    tracing::debug!(manual_entry_id = id, holding_id = entry.holding_id, "Manual entry completed");
    reload(pool, id).await
}

async fn reload(pool: &DbPool, id: DbId) -> Result<ManualEntry, EngineError> {
    ManualEntryRepo::find_by_id(pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: ENTITY, id })
        .map_err(EngineError::from)
}
