//! Handlers for the `/statistics` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use attend_core::error::CoreError;
use attend_core::types::DbId;
use attend_db::models::statistics::{CreateStatistics, Statistics, StatisticsEntry};
use attend_db::repositories::StatisticsRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/v1/statistics
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateStatistics>,
) -> AppResult<(StatusCode, Json<Statistics>)> {
    let statistics = StatisticsRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(statistics)))
}

/// GET /api/v1/statistics
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Statistics>>> {
    let statistics = StatisticsRepo::list(&state.pool).await?;
    Ok(Json(statistics))
}

/// GET /api/v1/statistics/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Statistics>> {
    let statistics = StatisticsRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Statistics",
            id,
        }))?;
    Ok(Json(statistics))
}

/// GET /api/v1/statistics/{id}/entries
pub async fn entries(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Vec<StatisticsEntry>>> {
    StatisticsRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Statistics",
            id,
        }))?;
    let entries = StatisticsRepo::list_entries(&state.pool, id).await?;
    Ok(Json(entries))
}
