//! Statistics tally behaviour: anonymous in/out counting per terminal,
//! independent of rooms and holdings.

use attend_core::config::ReconcileConfig;
use attend_db::models::campus::Student;
use attend_db::models::entry::Entry;
use attend_db::repositories::StatisticsRepo;
use attend_db::DbPool;
use async_trait::async_trait;
use chrono::Utc;

use super::{ClockPayload, TerminalBehaviour};
use crate::error::EngineError;

pub struct StatisticsBehaviour;

#[async_trait]
impl TerminalBehaviour for StatisticsBehaviour {
    fn id(&self) -> &'static str {
        "statistics"
    }

    fn label(&self) -> &'static str {
        "Statistics tally"
    }

    async fn clock(
        &self,
        pool: &DbPool,
        _cfg: &ReconcileConfig,
        entry: &Entry,
        student: &Student,
        _payload: &ClockPayload,
    ) -> Result<Option<String>, EngineError> {
        let mut messages = Vec::new();

        for set in StatisticsRepo::active_for_terminal(pool, entry.terminal_id, Utc::now()).await? {
            match StatisticsRepo::latest_open_entry(pool, set.id, student.id).await? {
                Some(open) => {
                    // Conditional flip; a concurrent swipe may have beaten us.
                    if StatisticsRepo::complete_entry(pool, open.id, entry.id).await?.is_some() {
                        messages.push(format!("Checked out: {}", set.name));
                    } else {
                        tracing::debug!(
                            statistics_entry_id = open.id,
                            "Tally entry completed concurrently"
                        );
                    }
                }
                None => {
                    StatisticsRepo::create_entry(pool, set.id, entry.id).await?;
                    messages.push(format!("Checked in: {}", set.name));
                }
            }
        }

        if messages.is_empty() {
            Ok(None)
        } else {
            Ok(Some(messages.join("\n")))
        }
    }
}
