//! Handlers for the `/holdings` resource.
//!
//! Lifecycle transitions (start, end, cancel) delegate to the engine,
//! which owns the transactions and reconciliation side effects.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use attend_core::error::CoreError;
use attend_core::types::{DbId, Timestamp};
use attend_db::models::campus::Student;
use attend_db::models::holding::{CreateHolding, Holding, HoldingFilter};
use attend_db::models::manual_entry::ManualEntry;
use attend_db::models::room_entry::RoomEntry;
use attend_db::repositories::{HoldingRepo, ManualEntryRepo, RoomEntryRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Optional body for ending a holding; `finished` backdates the end.
#[derive(Debug, Default, Deserialize)]
pub struct EndBody {
    pub finished: Option<Timestamp>,
}

/// POST /api/v1/holdings
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateHolding>,
) -> AppResult<(StatusCode, Json<Holding>)> {
    let holding = HoldingRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(holding)))
}

/// GET /api/v1/holdings
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<HoldingFilter>,
) -> AppResult<Json<Vec<Holding>>> {
    let holdings = HoldingRepo::list(&state.pool, &filter).await?;
    Ok(Json(holdings))
}

/// GET /api/v1/holdings/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Holding>> {
    let holding = HoldingRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Holding",
            id,
        }))?;
    Ok(Json(holding))
}

/// POST /api/v1/holdings/{id}/start
pub async fn start(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<Json<Holding>> {
    let holding =
        attend_engine::holding::start(&state.pool, &state.reconcile, &state.notifier, id).await?;
    Ok(Json(holding))
}

/// POST /api/v1/holdings/{id}/end
pub async fn end(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    body: Option<Json<EndBody>>,
) -> AppResult<Json<Holding>> {
    let finished = body.and_then(|Json(body)| body.finished);
    let holding =
        attend_engine::holding::end(&state.pool, &state.reconcile, &state.notifier, id, finished)
            .await?;
    Ok(Json(holding))
}

/// POST /api/v1/holdings/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Holding>> {
    let holding = attend_engine::holding::cancel(&state.pool, id).await?;
    Ok(Json(holding))
}

/// GET /api/v1/holdings/{id}/accredited
///
/// The derived "who should have attended" roster from the schedule
/// source.
pub async fn accredited(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Student>>>> {
    let students = attend_engine::holding::accredited(&state.pool, id).await?;
    Ok(Json(DataResponse { data: students }))
}

/// GET /api/v1/holdings/{id}/room-entries
pub async fn room_entries(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<RoomEntry>>> {
    ensure_exists(&state, id).await?;
    let entries = RoomEntryRepo::list_by_holding(&state.pool, id).await?;
    Ok(Json(entries))
}

/// GET /api/v1/holdings/{id}/manual-entries
pub async fn manual_entries(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<ManualEntry>>> {
    ensure_exists(&state, id).await?;
    let entries = ManualEntryRepo::list_by_holding(&state.pool, id).await?;
    Ok(Json(entries))
}

async fn ensure_exists(state: &AppState, id: DbId) -> AppResult<()> {
    HoldingRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Holding",
            id,
        }))?;
    Ok(())
}
