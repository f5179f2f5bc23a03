//! Terminal behaviour plugins.
//!
//! A terminal carries an ordered list of behaviour identifiers; the
//! dispatcher resolves them against the static registry and runs each
//! behaviour's preflight and clock hooks in that order. Unknown
//! identifiers are logged and skipped, so a misconfigured terminal
//! degrades instead of failing every swipe.
//!
//! Clock hook failures are soft by default: the error is logged, the
//! remaining behaviours still run, and the swipe succeeds. Only
//! eligibility-style hard failures (and missing rooms) abort the request.

mod attendance;
mod debug;
mod eligibility;
mod statistics;

use attend_core::config::ReconcileConfig;
use attend_core::types::DbId;
use attend_db::models::campus::Student;
use attend_db::models::entry::Entry;
use attend_db::models::terminal::Terminal;
use attend_db::DbPool;
use async_trait::async_trait;
use serde::Serialize;

pub use attendance::AttendanceBehaviour;
pub use debug::DebugBehaviour;
pub use eligibility::EligibilityBehaviour;
pub use statistics::StatisticsBehaviour;

use crate::error::EngineError;

/// One selectable answer in a preflight prompt.
#[derive(Debug, Clone, Serialize)]
pub struct PromptOption {
    pub id: DbId,
    pub label: String,
}

/// A question a behaviour needs answered before the swipe is processed.
///
/// The terminal shows the prompt and repeats the swipe with the chosen
/// option under the prompt's id in the clock payload.
#[derive(Debug, Clone, Serialize)]
pub struct PreflightPrompt {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    pub options: Vec<PromptOption>,
}

/// Answers supplied by the terminal, keyed by prompt id.
pub type ClockPayload = serde_json::Value;

/// A pluggable per-swipe behaviour.
#[async_trait]
pub trait TerminalBehaviour: Send + Sync {
    /// Stable identifier stored in the terminal's behaviour list.
    fn id(&self) -> &'static str;

    /// Human-readable name for configuration UIs.
    fn label(&self) -> &'static str;

    /// Called before the clock event is recorded. Returning a prompt
    /// pauses processing until the terminal answers.
    async fn preflight(
        &self,
        _pool: &DbPool,
        _terminal: &Terminal,
        _student: &Student,
    ) -> Result<Option<PreflightPrompt>, EngineError> {
        Ok(None)
    }

    /// Called with the recorded clock event. Returns an optional message
    /// for the terminal display.
    async fn clock(
        &self,
        pool: &DbPool,
        cfg: &ReconcileConfig,
        entry: &Entry,
        student: &Student,
        payload: &ClockPayload,
    ) -> Result<Option<String>, EngineError>;
}

/// All known behaviours, in registry order.
pub fn registry() -> &'static [&'static dyn TerminalBehaviour] {
    static BEHAVIOURS: [&dyn TerminalBehaviour; 4] = [
        &AttendanceBehaviour,
        &StatisticsBehaviour,
        &EligibilityBehaviour,
        &DebugBehaviour,
    ];
    &BEHAVIOURS
}

/// Resolve a behaviour identifier against the registry.
pub fn find(id: &str) -> Option<&'static dyn TerminalBehaviour> {
    registry().iter().copied().find(|b| b.id() == id)
}

/// The resolved behaviour chain of one terminal.
pub struct Dispatcher {
    behaviours: Vec<&'static dyn TerminalBehaviour>,
}

impl Dispatcher {
    pub fn for_terminal(terminal: &Terminal) -> Self {
        let behaviours = terminal
            .behaviour
            .iter()
            .filter_map(|id| match find(id) {
                Some(behaviour) => Some(behaviour),
                None => {
                    tracing::warn!(
                        terminal_id = terminal.id,
                        behaviour = %id,
                        "Unknown behaviour configured, skipping"
                    );
                    None
                }
            })
            .collect();
        Self { behaviours }
    }

    pub fn is_empty(&self) -> bool {
        self.behaviours.is_empty()
    }

    /// Collect preflight prompts. Any error here aborts the request; no
    /// clock event has been recorded yet.
    pub async fn preflight(
        &self,
        pool: &DbPool,
        terminal: &Terminal,
        student: &Student,
    ) -> Result<Vec<PreflightPrompt>, EngineError> {
        let mut prompts = Vec::new();
        for behaviour in &self.behaviours {
            if let Some(prompt) = behaviour.preflight(pool, terminal, student).await? {
                prompts.push(prompt);
            }
        }
        Ok(prompts)
    }

    /// Run the clock hooks, collecting display messages. Soft failures
    /// are logged and skipped; hard failures abort.
    pub async fn clock(
        &self,
        pool: &DbPool,
        cfg: &ReconcileConfig,
        entry: &Entry,
        student: &Student,
        payload: &ClockPayload,
    ) -> Result<Vec<String>, EngineError> {
        let mut messages = Vec::new();
        for behaviour in &self.behaviours {
            match behaviour.clock(pool, cfg, entry, student, payload).await {
                Ok(Some(message)) => messages.push(message),
                Ok(None) => {}
                Err(err) if err.aborts_clock() => return Err(err),
                Err(err) => {
                    tracing::error!(
                        behaviour = behaviour.id(),
                        entry_id = entry.id,
                        error = %err,
                        "Behaviour clock hook failed"
                    );
                }
            }
        }
        Ok(messages)
    }
}
