//! Handlers for the `/manual-entries` resource.
//!
//! Manual entries are the lecturer-side correction channel: students who
//! attended without a working card get added here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use attend_core::error::CoreError;
use attend_core::types::DbId;
use attend_db::models::manual_entry::{CreateManualEntry, ManualEntry};
use attend_db::repositories::ManualEntryRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/v1/manual-entries
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateManualEntry>,
) -> AppResult<(StatusCode, Json<ManualEntry>)> {
    let entry = attend_engine::manual_entry::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/v1/manual-entries/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ManualEntry>> {
    let entry = ManualEntryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ManualEntry",
            id,
        }))?;
    Ok(Json(entry))
}

/// POST /api/v1/manual-entries/{id}/leave
pub async fn leave(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ManualEntry>> {
    let entry = attend_engine::manual_entry::leave(&state.pool, id).await?;
    Ok(Json(entry))
}

/// POST /api/v1/manual-entries/{id}/discard
pub async fn discard(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ManualEntry>> {
    let entry = attend_engine::manual_entry::discard(&state.pool, id).await?;
    Ok(Json(entry))
}
