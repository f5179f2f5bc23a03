//! Room entry (terminal-driven presence record) model.

use attend_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `room_entries` table.
///
/// Links an incoming clock event to an eventual outgoing one and,
/// once assigned, to a holding. `holding_id` is set if and only if the
/// state has reached `assigned`; `accredited` is frozen at assign time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoomEntry {
    pub id: DbId,
    pub incoming_id: DbId,
    pub outgoing_id: Option<DbId>,
    pub holding_id: Option<DbId>,
    pub room_id: DbId,
    pub assigned_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub accredited: bool,
    pub state: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A room entry joined with the student behind its incoming event, used by
/// sweeps and batch reconciliation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RoomEntryWithStudent {
    pub id: DbId,
    pub room_id: DbId,
    pub state: String,
    pub created_at: Timestamp,
    pub student_id: Option<DbId>,
}
