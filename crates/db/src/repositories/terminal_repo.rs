//! Repository for the `terminals` table and its room assignments.

use attend_core::types::DbId;
use sqlx::PgPool;

use crate::models::campus::Room;
use crate::models::terminal::{CreateTerminal, Terminal, UpdateTerminal};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, hostname, online, enabled, config, behaviour, created_at, updated_at";

/// Provides CRUD operations for terminals.
pub struct TerminalRepo;

impl TerminalRepo {
    /// Insert a new terminal with its room assignments.
    pub async fn create(pool: &PgPool, input: &CreateTerminal) -> Result<Terminal, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO terminals (hostname, config, behaviour)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let terminal = sqlx::query_as::<_, Terminal>(&query)
            .bind(&input.hostname)
            .bind(&input.config)
            .bind(&input.behaviour)
            .fetch_one(&mut *tx)
            .await?;

        for room_id in &input.room_ids {
            sqlx::query("INSERT INTO terminal_rooms (terminal_id, room_id) VALUES ($1, $2)")
                .bind(terminal.id)
                .bind(room_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(terminal)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Terminal>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM terminals WHERE id = $1");
        sqlx::query_as::<_, Terminal>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a terminal that is both enabled and online; the device protocol
    /// only serves those.
    pub async fn find_active(pool: &PgPool, id: DbId) -> Result<Option<Terminal>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM terminals WHERE id = $1 AND enabled AND online");
        sqlx::query_as::<_, Terminal>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Terminal>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM terminals ORDER BY id");
        sqlx::query_as::<_, Terminal>(&query).fetch_all(pool).await
    }

    /// Patch a terminal. Returns the updated row, or `None` if not found.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTerminal,
    ) -> Result<Option<Terminal>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE terminals SET
                hostname = COALESCE($1, hostname),
                online = COALESCE($2, online),
                enabled = COALESCE($3, enabled),
                config = COALESCE($4, config),
                behaviour = COALESCE($5, behaviour),
                updated_at = NOW()
             WHERE id = $6
             RETURNING {COLUMNS}"
        );
        let terminal = sqlx::query_as::<_, Terminal>(&query)
            .bind(&input.hostname)
            .bind(input.online)
            .bind(input.enabled)
            .bind(&input.config)
            .bind(&input.behaviour)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(terminal) = terminal else {
            return Ok(None);
        };

        if let Some(room_ids) = &input.room_ids {
            sqlx::query("DELETE FROM terminal_rooms WHERE terminal_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            for room_id in room_ids {
                sqlx::query("INSERT INTO terminal_rooms (terminal_id, room_id) VALUES ($1, $2)")
                    .bind(id)
                    .bind(room_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(Some(terminal))
    }

    /// Delete a terminal. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM terminals WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The rooms this terminal serves, ordered by id.
    pub async fn rooms(pool: &PgPool, terminal_id: DbId) -> Result<Vec<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>(
            "SELECT r.id, r.name, r.name_short
             FROM terminal_rooms tr
             JOIN campus.rooms r ON r.id = tr.room_id
             WHERE tr.terminal_id = $1
             ORDER BY r.id",
        )
        .bind(terminal_id)
        .fetch_all(pool)
        .await
    }
}
