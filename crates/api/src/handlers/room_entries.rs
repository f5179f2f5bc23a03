//! Handlers for the `/room-entries` resource.
//!
//! Room entries are created by the terminal clock protocol, never over
//! this API; lecturers can only look them up and withdraw them from a
//! holding.

use axum::extract::{Path, State};
use axum::Json;

use attend_core::error::CoreError;
use attend_core::types::DbId;
use attend_db::models::room_entry::RoomEntry;
use attend_db::repositories::RoomEntryRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/v1/room-entries/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<RoomEntry>> {
    let entry = RoomEntryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "RoomEntry",
            id,
        }))?;
    Ok(Json(entry))
}

/// POST /api/v1/room-entries/{id}/discard
///
/// Withdraw a mis-assigned entry from its holding.
pub async fn discard(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<RoomEntry>> {
    let entry = attend_engine::room_entry::discard(&state.pool, id).await?;
    Ok(Json(entry))
}
