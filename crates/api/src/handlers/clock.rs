//! Handlers for the device-facing clock protocol.
//!
//! Terminals preflight a swipe with GET (resolving the student and
//! collecting behaviour prompts), then commit it with POST, which appends
//! the clock event and runs every configured behaviour.
//!
//! The student payload masks the matriculation number; this response is
//! shown on a shared device.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use attend_core::error::CoreError;
use attend_core::mask;
use attend_core::types::DbId;
use attend_db::models::campus::Student;
use attend_db::models::terminal::Terminal;
use attend_db::repositories::{EntryRepo, ScheduleRepo, TerminalRepo};
use attend_engine::behaviour::{Dispatcher, PreflightPrompt};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Student fields safe to show on a terminal display.
#[derive(Debug, Serialize)]
pub struct StudentPayload {
    pub id: DbId,
    pub display: String,
    pub matriculation: String,
}

impl From<&Student> for StudentPayload {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            display: student.display(),
            matriculation: mask::matriculation(&student.matriculation),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PreflightResponse {
    pub terminal_id: DbId,
    pub card_id: String,
    pub student: StudentPayload,
    pub prompts: Vec<PreflightPrompt>,
}

#[derive(Debug, Serialize)]
pub struct ClockResponse {
    pub entry_id: DbId,
    pub student: StudentPayload,
    pub messages: Vec<String>,
}

/// Resolve the swiping device and card. Disabled or offline terminals
/// and unknown cards are indistinguishable 404s to the device.
async fn resolve(
    state: &AppState,
    terminal_id: DbId,
    card_id: &str,
) -> AppResult<(Terminal, Student)> {
    let terminal = TerminalRepo::find_active(&state.pool, terminal_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Terminal",
            id: terminal_id,
        })?;
    let student = ScheduleRepo::find_student_by_card(&state.pool, card_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Unknown card '{card_id}'")))?;
    Ok((terminal, student))
}

/// GET /terminal/clock/{terminal_id}/{card_id}
pub async fn preflight(
    State(state): State<AppState>,
    Path((terminal_id, card_id)): Path<(DbId, String)>,
) -> AppResult<Json<PreflightResponse>> {
    let (terminal, student) = resolve(&state, terminal_id, &card_id).await?;

    let dispatcher = Dispatcher::for_terminal(&terminal);
    let prompts = dispatcher.preflight(&state.pool, &terminal, &student).await?;

    Ok(Json(PreflightResponse {
        terminal_id: terminal.id,
        card_id,
        student: StudentPayload::from(&student),
        prompts,
    }))
}

/// POST /terminal/clock/{terminal_id}/{card_id}
///
/// The body carries the prompt answers collected during preflight. The
/// clock event is appended before the behaviours run and stays in the
/// ledger even when one of them aborts the request.
pub async fn clock(
    State(state): State<AppState>,
    Path((terminal_id, card_id)): Path<(DbId, String)>,
    Json(payload): Json<Value>,
) -> AppResult<Json<ClockResponse>> {
    let (terminal, student) = resolve(&state, terminal_id, &card_id).await?;

    let entry = EntryRepo::create(&state.pool, terminal.id, student.id).await?;
    tracing::debug!(
        entry_id = entry.id,
        terminal_id = terminal.id,
        student_id = student.id,
        "Clock event recorded"
    );

    let dispatcher = Dispatcher::for_terminal(&terminal);
    let messages = dispatcher
        .clock(&state.pool, &state.reconcile, &entry, &student, &payload)
        .await?;

    Ok(Json(ClockResponse {
        entry_id: entry.id,
        student: StudentPayload::from(&student),
        messages,
    }))
}
