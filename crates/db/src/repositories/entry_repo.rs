//! Repository for the append-only `entries` clock event ledger.

use attend_core::types::DbId;
use sqlx::PgPool;

use crate::models::entry::Entry;

const COLUMNS: &str = "id, terminal_id, student_id, status, created_at";

/// Provides append and lookup operations for raw clock events.
pub struct EntryRepo;

impl EntryRepo {
    /// Append one clock event. Entries are never updated afterwards except
    /// by [`EntryRepo::detach_student`].
    pub async fn create(
        pool: &PgPool,
        terminal_id: DbId,
        student_id: DbId,
    ) -> Result<Entry, sqlx::Error> {
        let query = format!(
            "INSERT INTO entries (terminal_id, student_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Entry>(&query)
            .bind(terminal_id)
            .bind(student_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Entry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entries WHERE id = $1");
        sqlx::query_as::<_, Entry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Entries whose student link no longer resolves in the roster replica.
    pub async fn with_dangling_student(pool: &PgPool) -> Result<Vec<Entry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entries e
             WHERE e.student_id IS NOT NULL
               AND NOT EXISTS (SELECT 1 FROM campus.students s WHERE s.id = e.student_id)"
        );
        sqlx::query_as::<_, Entry>(&query).fetch_all(pool).await
    }

    /// Null the student link, preserving the original id in the status
    /// blob. Returns `true` if the row was updated.
    pub async fn detach_student(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE entries
             SET status = jsonb_set(COALESCE(status, '{}'::jsonb), '{student}', to_jsonb(student_id)),
                 student_id = NULL
             WHERE id = $1 AND student_id IS NOT NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
