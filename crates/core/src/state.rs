//! State machine enums and the central transition guard.
//!
//! Every stateful record stores its state as text in the database; the
//! enums here are the single source of truth for legal values and legal
//! transitions. Transition services parse the stored text, call [`guard`]
//! with the allowed source states, and only then apply the mutation.

use std::fmt;

use crate::error::CoreError;

/// Validate that `current` is one of the `allowed` source states for a
/// transition to `target`.
///
/// Returns [`CoreError::InvalidTransition`] otherwise. Callers that want
/// idempotent behaviour (cleanup sweeps) check for the target state before
/// invoking the transition; the guard itself never coerces.
pub fn guard<S>(entity: &'static str, current: S, allowed: &[S], target: &'static str) -> Result<(), CoreError>
where
    S: Copy + Eq + fmt::Display,
{
    if allowed.iter().any(|s| *s == current) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            entity,
            from: current.to_string(),
            to: target,
        })
    }
}

macro_rules! state_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }

            /// Parse a stored state string, rejecting unknown values.
            pub fn parse(value: &str) -> Result<Self, CoreError> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::Validation(format!(
                        "Unknown {} state '{other}'",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

state_enum! {
    /// States of a terminal-driven room entry.
    ///
    /// `created -> {assigned, canceled}`, `assigned -> {left, canceled,
    /// complete}`, `left -> {canceled, complete}`. Terminal states are
    /// `canceled` and `complete`.
    RoomEntryState {
        Created => "created",
        Assigned => "assigned",
        Left => "left",
        Canceled => "canceled",
        Complete => "complete",
    }
}

state_enum! {
    /// States of a lecturer-entered manual entry. Creation implies
    /// `assigned`; there is no `created` state.
    ManualEntryState {
        Assigned => "assigned",
        Left => "left",
        Canceled => "canceled",
        Complete => "complete",
    }
}

state_enum! {
    /// States of a holding (one lecturer-led session instance).
    HoldingState {
        Pending => "pending",
        Running => "running",
        Finished => "finished",
        Canceled => "canceled",
    }
}

state_enum! {
    /// States of a statistics tally entry.
    StatisticsEntryState {
        Created => "created",
        Completed => "completed",
    }
}

impl RoomEntryState {
    /// Whether the record still counts as open for the per-(student, room)
    /// uniqueness rule.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Created | Self::Assigned | Self::Left)
    }
}

impl HoldingState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Canceled)
    }
}
