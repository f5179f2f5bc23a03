//! Models for the read-only schedule replica (`campus` schema).

use attend_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `campus.rooms`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Room {
    pub id: DbId,
    pub name: String,
    pub name_short: Option<String>,
}

/// A row from `campus.persons` (lecturers).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Person {
    pub id: DbId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

/// A row from `campus.students`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Student {
    pub id: DbId,
    pub matriculation: String,
    pub first_name: String,
    pub last_name: String,
    pub card_id: Option<String>,
    pub eligible: bool,
}

impl Student {
    /// Display name shown on terminals.
    pub fn display(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A row from `campus.course_group_terms`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseGroupTerm {
    pub id: DbId,
    pub course_group_id: DbId,
    pub room_id: DbId,
    pub person_id: Option<DbId>,
    pub term_no: i32,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
}
