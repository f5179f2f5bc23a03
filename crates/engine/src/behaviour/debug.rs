//! Debug behaviour: logs every hook invocation and echoes the payload.
//! Only meant for terminals under test.

use attend_core::config::ReconcileConfig;
use attend_db::models::campus::Student;
use attend_db::models::entry::Entry;
use attend_db::models::terminal::Terminal;
use attend_db::DbPool;
use async_trait::async_trait;

use super::{ClockPayload, PreflightPrompt, TerminalBehaviour};
use crate::error::EngineError;

pub struct DebugBehaviour;

#[async_trait]
impl TerminalBehaviour for DebugBehaviour {
    fn id(&self) -> &'static str {
        "debug"
    }

    fn label(&self) -> &'static str {
        "Debug logging"
    }

    async fn preflight(
        &self,
        _pool: &DbPool,
        terminal: &Terminal,
        student: &Student,
    ) -> Result<Option<PreflightPrompt>, EngineError> {
        tracing::info!(
            terminal_id = terminal.id,
            student_id = student.id,
            "Debug preflight"
        );
        Ok(None)
    }

    async fn clock(
        &self,
        _pool: &DbPool,
        _cfg: &ReconcileConfig,
        entry: &Entry,
        student: &Student,
        payload: &ClockPayload,
    ) -> Result<Option<String>, EngineError> {
        tracing::info!(
            entry_id = entry.id,
            student_id = student.id,
            payload = %payload,
            "Debug clock"
        );
        Ok(Some(format!("debug: entry {}", entry.id)))
    }
}
