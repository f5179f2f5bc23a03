//! Repository for the `holdings` table.
//!
//! State flips happen through the `mark_*` methods, which the engine calls
//! inside a transaction after locking the row and validating the
//! transition.

use attend_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::holding::{CreateHolding, Holding, HoldingFilter};

const COLUMNS: &str = "id, course_group_term_id, room_id, lecturer_id, initiated_at, \
                       finished_at, state, created_at, updated_at";

/// Provides CRUD and transition support for holdings.
pub struct HoldingRepo;

impl HoldingRepo {
    pub async fn create(pool: &PgPool, input: &CreateHolding) -> Result<Holding, sqlx::Error> {
        let query = format!(
            "INSERT INTO holdings (course_group_term_id, room_id, lecturer_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Holding>(&query)
            .bind(input.course_group_term_id)
            .bind(input.room_id)
            .bind(input.lecturer_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Holding>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM holdings WHERE id = $1");
        sqlx::query_as::<_, Holding>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Plain read on a connection, for transactions that only need to
    /// reference a holding without locking it.
    pub async fn fetch(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Holding>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM holdings WHERE id = $1");
        sqlx::query_as::<_, Holding>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Lock a holding row for the duration of the caller's transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<Holding>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM holdings WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, Holding>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn list(pool: &PgPool, filter: &HoldingFilter) -> Result<Vec<Holding>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM holdings
             WHERE ($1::text IS NULL OR state = $1)
               AND ($2::bigint IS NULL OR room_id = $2)
               AND ($3::bigint IS NULL OR lecturer_id = $3)
             ORDER BY initiated_at NULLS LAST, id"
        );
        sqlx::query_as::<_, Holding>(&query)
            .bind(&filter.state)
            .bind(filter.room_id)
            .bind(filter.lecturer_id)
            .fetch_all(pool)
            .await
    }

    /// Running holdings in a room whose session has begun, oldest first.
    pub async fn running_in_room(
        pool: &PgPool,
        room_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<Holding>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM holdings
             WHERE room_id = $1 AND state = 'running' AND initiated_at <= $2
             ORDER BY initiated_at, id"
        );
        sqlx::query_as::<_, Holding>(&query)
            .bind(room_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// All running holdings, for the overrun sweep.
    pub async fn list_running(pool: &PgPool) -> Result<Vec<Holding>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM holdings WHERE state = 'running' ORDER BY id");
        sqlx::query_as::<_, Holding>(&query).fetch_all(pool).await
    }

    /// Running holdings in the same room that must be ended when a new
    /// holding starts: excludes the starting holding itself, holdings on
    /// the identical term, and genuine parallel sessions (terms sharing
    /// room, start and end with the starting holding's term).
    pub async fn conflicting_running(
        conn: &mut PgConnection,
        room_id: DbId,
        holding_id: DbId,
        term_id: DbId,
        term_room_id: DbId,
        term_start: Timestamp,
        term_end: Timestamp,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT h.id
             FROM holdings h
             JOIN campus.course_group_terms t ON t.id = h.course_group_term_id
             WHERE h.room_id = $1
               AND h.state = 'running'
               AND h.id <> $2
               AND h.course_group_term_id <> $3
               AND NOT (t.room_id = $4 AND t.start_at = $5 AND t.end_at = $6)
             ORDER BY h.id",
        )
        .bind(room_id)
        .bind(holding_id)
        .bind(term_id)
        .bind(term_room_id)
        .bind(term_start)
        .bind(term_end)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn mark_running(
        conn: &mut PgConnection,
        id: DbId,
        initiated: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE holdings
             SET state = 'running', initiated_at = $2, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(initiated)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn mark_finished(
        conn: &mut PgConnection,
        id: DbId,
        finished: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE holdings
             SET state = 'finished', finished_at = $2, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(finished)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn mark_canceled(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE holdings SET state = 'canceled', updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
