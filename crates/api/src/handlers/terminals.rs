//! Handlers for the `/terminals` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use attend_core::error::CoreError;
use attend_core::types::DbId;
use attend_db::models::campus::Room;
use attend_db::models::terminal::{CreateTerminal, Terminal, UpdateTerminal};
use attend_db::repositories::TerminalRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// A terminal together with the rooms it serves.
#[derive(Debug, Serialize)]
pub struct TerminalDetail {
    #[serde(flatten)]
    pub terminal: Terminal,
    pub rooms: Vec<Room>,
}

/// POST /api/v1/terminals
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateTerminal>,
) -> AppResult<(StatusCode, Json<Terminal>)> {
    let terminal = TerminalRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(terminal)))
}

/// GET /api/v1/terminals
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Terminal>>> {
    let terminals = TerminalRepo::list(&state.pool).await?;
    Ok(Json(terminals))
}

/// GET /api/v1/terminals/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<TerminalDetail>> {
    let terminal = TerminalRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Terminal",
            id,
        }))?;
    let rooms = TerminalRepo::rooms(&state.pool, id).await?;
    Ok(Json(TerminalDetail { terminal, rooms }))
}

/// PUT /api/v1/terminals/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateTerminal>,
) -> AppResult<Json<Terminal>> {
    let terminal = TerminalRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Terminal",
            id,
        }))?;
    Ok(Json(terminal))
}

/// DELETE /api/v1/terminals/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let deleted = TerminalRepo::delete(&state.pool, id).await?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Terminal",
            id,
        }))
    }
}
