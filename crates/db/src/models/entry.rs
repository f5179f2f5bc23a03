//! Raw clock event ledger model.

use attend_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `entries` table. Immutable once written, except for the
/// student link which the cleanup sweep nulls when the roster replica no
/// longer knows the student.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Entry {
    pub id: DbId,
    pub terminal_id: DbId,
    pub student_id: Option<DbId>,
    /// Side-channel notes, e.g. the original student id after a link was
    /// detached.
    pub status: Option<serde_json::Value>,
    pub created_at: Timestamp,
}
