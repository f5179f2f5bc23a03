use crate::types::DbId;

/// Domain error taxonomy shared across the workspace.
///
/// State machine guards return [`CoreError::InvalidTransition`] and never
/// silently coerce an illegal operation. Roster lookups on read paths are
/// expected to degrade before reaching this type; on write-back paths a
/// failed lookup is a hard [`CoreError::RosterLookup`] error.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Illegal transition for {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: &'static str,
    },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Roster lookup failed: {0}")]
    RosterLookup(String),

    #[error("Booking write-back failed: {0}")]
    BookingWrite(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A terminal behaviour rejected the request outright (eligibility
    /// gate). Aborts the whole clock request.
    #[error("{0}")]
    HardFailure(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
