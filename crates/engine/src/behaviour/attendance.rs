//! The core attendance behaviour: swipe-in opens a room entry, swipe-out
//! closes it.

use attend_core::config::ReconcileConfig;
use attend_core::error::CoreError;
use attend_core::state::{HoldingState, RoomEntryState};
use attend_core::types::DbId;
use attend_db::models::campus::Student;
use attend_db::models::entry::Entry;
use attend_db::models::holding::Holding;
use attend_db::models::room_entry::RoomEntry;
use attend_db::models::terminal::Terminal;
use attend_db::repositories::{HoldingRepo, RoomEntryRepo, ScheduleRepo, TerminalRepo};
use attend_db::DbPool;
use async_trait::async_trait;
use chrono::Utc;

use super::{ClockPayload, PreflightPrompt, PromptOption, TerminalBehaviour};
use crate::error::EngineError;
use crate::room_entry;

/// Prompt id; the room answer comes back under this payload key.
const ROOM_PROMPT: &str = "attendance:room";

pub struct AttendanceBehaviour;

impl AttendanceBehaviour {
    fn selected_room(payload: &ClockPayload) -> Option<DbId> {
        match payload.get(ROOM_PROMPT)? {
            serde_json::Value::Number(n) => n.as_i64(),
            serde_json::Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Resolve which room the swipe is for. Terminals serving one room
    /// skip the prompt entirely.
    async fn resolve_room(
        pool: &DbPool,
        terminal_id: DbId,
        payload: &ClockPayload,
    ) -> Result<DbId, EngineError> {
        let rooms = TerminalRepo::rooms(pool, terminal_id).await?;
        match rooms.as_slice() {
            [] => Err(CoreError::NotFound {
                entity: "Room",
                id: terminal_id,
            }
            .into()),
            [room] => Ok(room.id),
            _ => {
                let selected = Self::selected_room(payload).ok_or_else(|| {
                    CoreError::Validation(
                        "Room selection missing for multi-room terminal".to_string(),
                    )
                })?;
                if rooms.iter().any(|r| r.id == selected) {
                    Ok(selected)
                } else {
                    Err(CoreError::NotFound {
                        entity: "Room",
                        id: selected,
                    }
                    .into())
                }
            }
        }
    }

    /// Swipe-in: open a room entry and, when a session is already running
    /// in the room, attach to it immediately. Prefers a running holding
    /// whose roster carries the student.
    async fn arrival(
        &self,
        pool: &DbPool,
        entry: &Entry,
        student: &Student,
        payload: &ClockPayload,
    ) -> Result<Option<String>, EngineError> {
        let room_id = Self::resolve_room(pool, entry.terminal_id, payload).await?;

        let mut conn = pool.acquire().await?;
        let opened = RoomEntryRepo::create(&mut conn, entry.id, room_id).await?;
        drop(conn);

        let running = HoldingRepo::running_in_room(pool, room_id, Utc::now()).await?;
        let Some(holding) = self.preferred_holding(pool, &running, student.id).await? else {
            tracing::debug!(room_entry_id = opened.id, room_id, "Arrival waits for a holding");
            return Ok(Some(format!("Welcome, {}", student.display())));
        };

        room_entry::assign(pool, opened.id, holding.id).await?;
        let session = self.session_name(pool, holding).await;
        Ok(Some(match session {
            Some(name) => format!("Welcome, {} ({name})", student.display()),
            None => format!("Welcome, {}", student.display()),
        }))
    }

    /// Pick the running holding to attach to: the first one whose roster
    /// carries the student, else the oldest running one.
    async fn preferred_holding<'a>(
        &self,
        pool: &DbPool,
        running: &'a [Holding],
        student_id: DbId,
    ) -> Result<Option<&'a Holding>, EngineError> {
        for holding in running {
            if let Some(term) = ScheduleRepo::find_term(pool, holding.course_group_term_id).await? {
                if ScheduleRepo::roster_contains(pool, term.course_group_id, student_id).await? {
                    return Ok(Some(holding));
                }
            }
        }
        Ok(running.first())
    }

    async fn session_name(&self, pool: &DbPool, holding: &Holding) -> Option<String> {
        let term = ScheduleRepo::find_term(pool, holding.course_group_term_id)
            .await
            .ok()??;
        ScheduleRepo::group_name(pool, term.course_group_id).await.ok()?
    }

    /// Swipe-out: close the student's open room entry. Unassigned entries
    /// are canceled; assigned ones leave their running holding.
    async fn departure(
        &self,
        pool: &DbPool,
        entry: &Entry,
        open: &RoomEntry,
    ) -> Result<Option<String>, EngineError> {
        let Some(holding_id) = open.holding_id else {
            room_entry::cancel(pool, open.id, Some(entry.id)).await?;
            return Ok(Some("Goodbye".to_string()));
        };

        let Some(holding) = HoldingRepo::find_by_id(pool, holding_id).await? else {
            tracing::warn!(
                room_entry_id = open.id,
                holding_id,
                "Open entry references a missing holding"
            );
            return Ok(Some("Goodbye".to_string()));
        };

        let holding_state = HoldingState::parse(&holding.state)?;
        let entry_state = RoomEntryState::parse(&open.state)?;
        if holding_state == HoldingState::Running && entry_state == RoomEntryState::Assigned {
            room_entry::leave(pool, open.id, Some(entry.id)).await?;
        }

        Ok(Some(match self.session_name(pool, &holding).await {
            Some(name) => format!("Thank you for attending {name}"),
            None => "Goodbye".to_string(),
        }))
    }
}

#[async_trait]
impl TerminalBehaviour for AttendanceBehaviour {
    fn id(&self) -> &'static str {
        "attendance"
    }

    fn label(&self) -> &'static str {
        "Attendance tracking"
    }

    async fn preflight(
        &self,
        pool: &DbPool,
        terminal: &Terminal,
        student: &Student,
    ) -> Result<Option<PreflightPrompt>, EngineError> {
        let rooms = TerminalRepo::rooms(pool, terminal.id).await?;
        if rooms.len() < 2 {
            return Ok(None);
        }
        // A departure swipe closes the already-open entry; no room needed.
        if RoomEntryRepo::find_open_by_student(pool, student.id).await?.is_some() {
            return Ok(None);
        }
        Ok(Some(PreflightPrompt {
            id: ROOM_PROMPT.to_string(),
            question: Some("Which room are you entering?".to_string()),
            options: rooms
                .into_iter()
                .map(|r| PromptOption {
                    id: r.id,
                    label: r.name_short.unwrap_or(r.name),
                })
                .collect(),
        }))
    }

    async fn clock(
        &self,
        pool: &DbPool,
        _cfg: &ReconcileConfig,
        entry: &Entry,
        student: &Student,
        payload: &ClockPayload,
    ) -> Result<Option<String>, EngineError> {
        // Two simultaneous swipes for the same card must not both pass
        // the open-entry check and open two entries. The advisory lock
        // serializes clock hooks per student; it releases with the guard
        // transaction on every exit path.
        let mut guard = pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(student.id)
            .execute(&mut *guard)
            .await?;

        let result = match RoomEntryRepo::find_open_by_student(pool, student.id).await? {
            Some(open) => self.departure(pool, entry, &open).await,
            None => self.arrival(pool, entry, student, payload).await,
        };

        guard.commit().await?;
        result
    }
}
