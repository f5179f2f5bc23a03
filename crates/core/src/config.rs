//! Reconciliation timing configuration.

use chrono::Duration;

/// Default lifetime of an unassigned room entry: 45 minutes.
const DEFAULT_ENTRY_LIFETIME_MIN: i64 = 45;

/// Default buffer ahead of the next scheduled term in which an entry is
/// kept alive: 15 minutes.
const DEFAULT_ENTRY_BUFFER_MIN: i64 = 15;

/// Default window after a term's end in which a follow-up term counts as a
/// continuation: 30 minutes.
const DEFAULT_CONTINUATION_BUFFER_MIN: i64 = 30;

/// Default overdraft allowance before a running holding is force-ended:
/// 15 minutes.
const DEFAULT_HOLDING_OVERDRAFT_MIN: i64 = 15;

/// Timing knobs for the reconciliation core and cleanup sweeps.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// How long a `created` room entry may wait for a holding before the
    /// cleanup sweep cancels it.
    pub entry_lifetime: Duration,
    /// Entries created within this buffer before the next scheduled term
    /// are left alone by the cleanup sweep.
    pub entry_buffer: Duration,
    /// A term starting within this window after a holding's term ends is a
    /// continuation for rostered students.
    pub continuation_buffer: Duration,
    /// Grace period past the scheduled end before a running holding is
    /// force-ended.
    pub holding_overdraft: Duration,
}

impl ReconcileConfig {
    /// Load configuration from environment variables, in minutes.
    ///
    /// | Env Var                          | Default |
    /// |----------------------------------|---------|
    /// | `ATTEND_ENTRY_LIFETIME_MIN`      | `45`    |
    /// | `ATTEND_ENTRY_BUFFER_MIN`        | `15`    |
    /// | `ATTEND_CONTINUATION_BUFFER_MIN` | `30`    |
    /// | `ATTEND_HOLDING_OVERDRAFT_MIN`   | `15`    |
    pub fn from_env() -> Self {
        Self {
            entry_lifetime: env_minutes("ATTEND_ENTRY_LIFETIME_MIN", DEFAULT_ENTRY_LIFETIME_MIN),
            entry_buffer: env_minutes("ATTEND_ENTRY_BUFFER_MIN", DEFAULT_ENTRY_BUFFER_MIN),
            continuation_buffer: env_minutes(
                "ATTEND_CONTINUATION_BUFFER_MIN",
                DEFAULT_CONTINUATION_BUFFER_MIN,
            ),
            holding_overdraft: env_minutes(
                "ATTEND_HOLDING_OVERDRAFT_MIN",
                DEFAULT_HOLDING_OVERDRAFT_MIN,
            ),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            entry_lifetime: Duration::minutes(DEFAULT_ENTRY_LIFETIME_MIN),
            entry_buffer: Duration::minutes(DEFAULT_ENTRY_BUFFER_MIN),
            continuation_buffer: Duration::minutes(DEFAULT_CONTINUATION_BUFFER_MIN),
            holding_overdraft: Duration::minutes(DEFAULT_HOLDING_OVERDRAFT_MIN),
        }
    }
}

fn env_minutes(var: &str, default: i64) -> Duration {
    let minutes = std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default);
    Duration::minutes(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_minutes() {
        let cfg = ReconcileConfig::default();
        assert_eq!(cfg.entry_lifetime, Duration::minutes(45));
        assert_eq!(cfg.entry_buffer, Duration::minutes(15));
        assert_eq!(cfg.continuation_buffer, Duration::minutes(30));
        assert_eq!(cfg.holding_overdraft, Duration::minutes(15));
    }
}
