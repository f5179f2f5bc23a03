use attend_core::error::CoreError;

/// Error type for transition services and behaviour dispatch.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EngineError {
    /// True when a transition was refused because the record is not in an
    /// allowed source state. Sweeps treat this as "already handled".
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::Core(CoreError::InvalidTransition { .. }))
    }

    /// True when a behaviour failure must abort the whole clock request
    /// instead of being logged and skipped.
    pub fn aborts_clock(&self) -> bool {
        matches!(
            self,
            Self::Core(CoreError::HardFailure(_))
                | Self::Core(CoreError::NotFound { .. })
                | Self::Core(CoreError::Validation(_))
        )
    }
}
