//! Statistics tally models.

use attend_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `statistics` table: a named tally with an optional
/// active time range, attached to any number of terminals.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Statistics {
    pub id: DbId,
    pub name: String,
    pub active_from: Option<Timestamp>,
    pub active_to: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for creating a statistics set.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStatistics {
    pub name: String,
    #[serde(default)]
    pub active_from: Option<Timestamp>,
    #[serde(default)]
    pub active_to: Option<Timestamp>,
    #[serde(default)]
    pub terminal_ids: Vec<DbId>,
}

/// A row from the `statistics_entries` table, unique per
/// (statistics, incoming entry).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StatisticsEntry {
    pub id: DbId,
    pub statistics_id: DbId,
    pub incoming_id: DbId,
    pub outgoing_id: Option<DbId>,
    pub state: String,
    pub created_at: Timestamp,
}
