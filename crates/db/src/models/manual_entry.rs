//! Lecturer-entered presence record models.

use attend_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `manual_entries` table. Creation implies `assigned`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ManualEntry {
    pub id: DbId,
    pub holding_id: DbId,
    pub student_id: DbId,
    pub room_id: DbId,
    pub assigned_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub accredited: bool,
    pub state: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a manual entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateManualEntry {
    pub holding_id: DbId,
    pub student_id: DbId,
    pub room_id: DbId,
}
