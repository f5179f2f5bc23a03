//! Eligibility gate: rejects swipes from students flagged ineligible
//! before anything else happens.

use attend_core::config::ReconcileConfig;
use attend_core::error::CoreError;
use attend_db::models::campus::Student;
use attend_db::models::entry::Entry;
use attend_db::models::terminal::Terminal;
use attend_db::DbPool;
use async_trait::async_trait;

use super::{ClockPayload, PreflightPrompt, TerminalBehaviour};
use crate::error::EngineError;

pub struct EligibilityBehaviour;

impl EligibilityBehaviour {
    fn check(student: &Student) -> Result<(), EngineError> {
        if student.eligible {
            Ok(())
        } else {
            Err(CoreError::HardFailure(format!(
                "{} is not eligible for attendance tracking",
                student.display()
            ))
            .into())
        }
    }
}

#[async_trait]
impl TerminalBehaviour for EligibilityBehaviour {
    fn id(&self) -> &'static str {
        "eligibility"
    }

    fn label(&self) -> &'static str {
        "Eligibility gate"
    }

    async fn preflight(
        &self,
        _pool: &DbPool,
        _terminal: &Terminal,
        student: &Student,
    ) -> Result<Option<PreflightPrompt>, EngineError> {
        Self::check(student)?;
        Ok(None)
    }

    async fn clock(
        &self,
        _pool: &DbPool,
        _cfg: &ReconcileConfig,
        _entry: &Entry,
        student: &Student,
        _payload: &ClockPayload,
    ) -> Result<Option<String>, EngineError> {
        Self::check(student)?;
        Ok(None)
    }
}
