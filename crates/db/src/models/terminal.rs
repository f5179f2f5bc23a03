//! Card-swipe terminal models.

use attend_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `terminals` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Terminal {
    pub id: DbId,
    pub hostname: String,
    /// Device health flag reported externally, not reconciliation state.
    pub online: bool,
    pub enabled: bool,
    pub config: Option<serde_json::Value>,
    /// Ordered behaviour identifiers resolved against the static registry.
    pub behaviour: Vec<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a terminal.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTerminal {
    pub hostname: String,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
    #[serde(default)]
    pub behaviour: Vec<String>,
    #[serde(default)]
    pub room_ids: Vec<DbId>,
}

/// DTO for patching a terminal. `None` fields are left unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTerminal {
    pub hostname: Option<String>,
    pub online: Option<bool>,
    pub enabled: Option<bool>,
    pub config: Option<serde_json::Value>,
    pub behaviour: Option<Vec<String>>,
    pub room_ids: Option<Vec<DbId>>,
}
