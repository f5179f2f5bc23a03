/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// The scheduled time window of a course-group term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TermWindow {
    /// Scheduled duration of the term.
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}
