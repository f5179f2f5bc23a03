//! Repository for the `manual_entries` table.

use attend_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::manual_entry::ManualEntry;

const COLUMNS: &str = "id, holding_id, student_id, room_id, assigned_at, ended_at, \
                       accredited, state, created_at, updated_at";

/// Provides lookup and transition support for manual entries.
pub struct ManualEntryRepo;

impl ManualEntryRepo {
    /// Insert a manual entry; it starts out `assigned` with the assignment
    /// timestamp set by the database.
    pub async fn create(
        conn: &mut PgConnection,
        holding_id: DbId,
        student_id: DbId,
        room_id: DbId,
        accredited: bool,
    ) -> Result<ManualEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO manual_entries (holding_id, student_id, room_id, accredited)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ManualEntry>(&query)
            .bind(holding_id)
            .bind(student_id)
            .bind(room_id)
            .bind(accredited)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ManualEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM manual_entries WHERE id = $1");
        sqlx::query_as::<_, ManualEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a manual entry row for the duration of the caller's
    /// transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<ManualEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM manual_entries WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ManualEntry>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Lock any still-`assigned` entries for the same (student, holding)
    /// pair; creation forces them to `left` first.
    pub async fn assigned_for_update(
        conn: &mut PgConnection,
        holding_id: DbId,
        student_id: DbId,
    ) -> Result<Vec<ManualEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM manual_entries
             WHERE holding_id = $1 AND student_id = $2 AND state = 'assigned'
             ORDER BY id
             FOR UPDATE"
        );
        sqlx::query_as::<_, ManualEntry>(&query)
            .bind(holding_id)
            .bind(student_id)
            .fetch_all(conn)
            .await
    }

    /// Completed entries under a holding whose student was not on the
    /// course group roster.
    pub async fn unaccredited_ids(
        pool: &PgPool,
        holding_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM manual_entries
             WHERE holding_id = $1 AND state = 'complete' AND NOT accredited
             ORDER BY id",
        )
        .bind(holding_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Entry ids under a holding currently in one of the given states.
    pub async fn ids_for_holding_in_states(
        pool: &PgPool,
        holding_id: DbId,
        states: &[&str],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let states: Vec<String> = states.iter().map(|s| s.to_string()).collect();
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM manual_entries
             WHERE holding_id = $1 AND state = ANY($2)
             ORDER BY id",
        )
        .bind(holding_id)
        .bind(&states)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn list_by_holding(
        pool: &PgPool,
        holding_id: DbId,
    ) -> Result<Vec<ManualEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM manual_entries WHERE holding_id = $1 ORDER BY assigned_at, id"
        );
        sqlx::query_as::<_, ManualEntry>(&query)
            .bind(holding_id)
            .fetch_all(pool)
            .await
    }

    /// Display names for the students behind the given entries.
    pub async fn attendee_names(pool: &PgPool, ids: &[DbId]) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT s.first_name, s.last_name
             FROM manual_entries me
             JOIN campus.students s ON s.id = me.student_id
             WHERE me.id = ANY($1)
             ORDER BY s.last_name, s.first_name",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(first, last)| format!("{first} {last}"))
            .collect())
    }

    pub async fn mark_left(
        conn: &mut PgConnection,
        id: DbId,
        ended: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE manual_entries
             SET state = 'left', ended_at = $2, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(ended)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn mark_discarded(
        conn: &mut PgConnection,
        id: DbId,
        ended: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE manual_entries
             SET state = 'canceled', ended_at = $2, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(ended)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Flip to `complete`. `ended` is only written when provided.
    pub async fn mark_complete(
        conn: &mut PgConnection,
        id: DbId,
        ended: Option<Timestamp>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE manual_entries
             SET state = 'complete', ended_at = COALESCE($2, ended_at), updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(ended)
        .execute(conn)
        .await?;
        Ok(())
    }
}
