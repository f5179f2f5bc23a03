//! Repository for statistics sets and their tally entries.

use attend_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::statistics::{CreateStatistics, Statistics, StatisticsEntry};

const SET_COLUMNS: &str = "id, name, active_from, active_to, created_at";
const ENTRY_COLUMNS: &str = "id, statistics_id, incoming_id, outgoing_id, state, created_at";

/// Provides CRUD and tally operations for statistics.
pub struct StatisticsRepo;

impl StatisticsRepo {
    pub async fn create(pool: &PgPool, input: &CreateStatistics) -> Result<Statistics, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO statistics (name, active_from, active_to)
             VALUES ($1, $2, $3)
             RETURNING {SET_COLUMNS}"
        );
        let statistics = sqlx::query_as::<_, Statistics>(&query)
            .bind(&input.name)
            .bind(input.active_from)
            .bind(input.active_to)
            .fetch_one(&mut *tx)
            .await?;

        for terminal_id in &input.terminal_ids {
            sqlx::query(
                "INSERT INTO statistics_terminals (statistics_id, terminal_id) VALUES ($1, $2)",
            )
            .bind(statistics.id)
            .bind(terminal_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(statistics)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Statistics>, sqlx::Error> {
        let query = format!("SELECT {SET_COLUMNS} FROM statistics WHERE id = $1");
        sqlx::query_as::<_, Statistics>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Statistics>, sqlx::Error> {
        let query = format!("SELECT {SET_COLUMNS} FROM statistics ORDER BY id");
        sqlx::query_as::<_, Statistics>(&query).fetch_all(pool).await
    }

    /// Statistics sets attached to a terminal whose active range (if any)
    /// covers `now`.
    pub async fn active_for_terminal(
        pool: &PgPool,
        terminal_id: DbId,
        now: Timestamp,
    ) -> Result<Vec<Statistics>, sqlx::Error> {
        sqlx::query_as::<_, Statistics>(
            "SELECT s.id, s.name, s.active_from, s.active_to, s.created_at
             FROM statistics s
             JOIN statistics_terminals st ON st.statistics_id = s.id
             WHERE st.terminal_id = $1
               AND (s.active_from IS NULL OR s.active_from <= $2)
               AND (s.active_to IS NULL OR s.active_to >= $2)
             ORDER BY s.id",
        )
        .bind(terminal_id)
        .bind(now)
        .fetch_all(pool)
        .await
    }

    /// The most recent open tally entry for a student in a statistics set.
    pub async fn latest_open_entry(
        pool: &PgPool,
        statistics_id: DbId,
        student_id: DbId,
    ) -> Result<Option<StatisticsEntry>, sqlx::Error> {
        sqlx::query_as::<_, StatisticsEntry>(
            "SELECT se.id, se.statistics_id, se.incoming_id, se.outgoing_id, se.state,
                    se.created_at
             FROM statistics_entries se
             JOIN entries e ON e.id = se.incoming_id
             WHERE se.statistics_id = $1
               AND e.student_id = $2
               AND se.outgoing_id IS NULL
               AND se.state = 'created'
             ORDER BY e.created_at DESC
             LIMIT 1",
        )
        .bind(statistics_id)
        .bind(student_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create_entry(
        pool: &PgPool,
        statistics_id: DbId,
        incoming_id: DbId,
    ) -> Result<StatisticsEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO statistics_entries (statistics_id, incoming_id)
             VALUES ($1, $2)
             RETURNING {ENTRY_COLUMNS}"
        );
        sqlx::query_as::<_, StatisticsEntry>(&query)
            .bind(statistics_id)
            .bind(incoming_id)
            .fetch_one(pool)
            .await
    }

    /// Conditional `created -> completed` flip; returns the updated row or
    /// `None` when another writer already completed it.
    pub async fn complete_entry(
        pool: &PgPool,
        id: DbId,
        outgoing_id: DbId,
    ) -> Result<Option<StatisticsEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE statistics_entries
             SET state = 'completed', outgoing_id = $2
             WHERE id = $1 AND state = 'created'
             RETURNING {ENTRY_COLUMNS}"
        );
        sqlx::query_as::<_, StatisticsEntry>(&query)
            .bind(id)
            .bind(outgoing_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_entries(
        pool: &PgPool,
        statistics_id: DbId,
    ) -> Result<Vec<StatisticsEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {ENTRY_COLUMNS} FROM statistics_entries
             WHERE statistics_id = $1
             ORDER BY id"
        );
        sqlx::query_as::<_, StatisticsEntry>(&query)
            .bind(statistics_id)
            .fetch_all(pool)
            .await
    }
}
