//! Holding (session instance) models.

use attend_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `holdings` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Holding {
    pub id: DbId,
    pub course_group_term_id: DbId,
    pub room_id: DbId,
    pub lecturer_id: Option<DbId>,
    pub initiated_at: Option<Timestamp>,
    pub finished_at: Option<Timestamp>,
    pub state: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a holding (state starts at `pending`).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateHolding {
    pub course_group_term_id: DbId,
    pub room_id: DbId,
    pub lecturer_id: Option<DbId>,
}

/// Query filters for listing holdings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HoldingFilter {
    pub state: Option<String>,
    pub room_id: Option<DbId>,
    pub lecturer_id: Option<DbId>,
}
