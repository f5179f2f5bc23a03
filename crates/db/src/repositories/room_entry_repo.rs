//! Repository for the `room_entries` table.

use attend_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::room_entry::{RoomEntry, RoomEntryWithStudent};

const COLUMNS: &str = "id, incoming_id, outgoing_id, holding_id, room_id, assigned_at, \
                       ended_at, accredited, state, created_at, updated_at";

/// Provides lookup and transition support for room entries.
pub struct RoomEntryRepo;

impl RoomEntryRepo {
    /// Insert a fresh `created` room entry for an incoming clock event.
    pub async fn create(
        conn: &mut PgConnection,
        incoming_id: DbId,
        room_id: DbId,
    ) -> Result<RoomEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO room_entries (incoming_id, room_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RoomEntry>(&query)
            .bind(incoming_id)
            .bind(room_id)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<RoomEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM room_entries WHERE id = $1");
        sqlx::query_as::<_, RoomEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a room entry row for the duration of the caller's transaction.
    pub async fn find_for_update(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<RoomEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM room_entries WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, RoomEntry>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// The student's open presence record (no outgoing event yet), in any
    /// room. At most one exists at a time.
    pub async fn find_open_by_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Option<RoomEntry>, sqlx::Error> {
        sqlx::query_as::<_, RoomEntry>(
            "SELECT re.id, re.incoming_id, re.outgoing_id, re.holding_id, re.room_id,
                    re.assigned_at, re.ended_at, re.accredited, re.state, re.created_at,
                    re.updated_at
             FROM room_entries re
             JOIN entries e ON e.id = re.incoming_id
             WHERE e.student_id = $1 AND re.ended_at IS NULL
             ORDER BY re.id
             LIMIT 1",
        )
        .bind(student_id)
        .fetch_optional(pool)
        .await
    }

    /// The student behind an entry's incoming clock event, if the link
    /// still resolves.
    pub async fn student_of(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<DbId>, sqlx::Error> {
        let row: Option<(Option<DbId>,)> = sqlx::query_as(
            "SELECT e.student_id
             FROM room_entries re
             JOIN entries e ON e.id = re.incoming_id
             WHERE re.id = $1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;
        Ok(row.and_then(|(student_id,)| student_id))
    }

    /// Completed entries under a holding whose student was not on the
    /// course group roster.
    pub async fn unaccredited_ids(
        pool: &PgPool,
        holding_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM room_entries
             WHERE holding_id = $1 AND state = 'complete' AND NOT accredited
             ORDER BY id",
        )
        .bind(holding_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Unassigned `created` entries in a room, joined with their student,
    /// for the holding-start reconciliation.
    pub async fn pending_in_room(
        pool: &PgPool,
        room_id: DbId,
    ) -> Result<Vec<RoomEntryWithStudent>, sqlx::Error> {
        sqlx::query_as::<_, RoomEntryWithStudent>(
            "SELECT re.id, re.room_id, re.state, re.created_at, e.student_id
             FROM room_entries re
             JOIN entries e ON e.id = re.incoming_id
             WHERE re.room_id = $1 AND re.holding_id IS NULL AND re.state = 'created'
             ORDER BY re.id",
        )
        .bind(room_id)
        .fetch_all(pool)
        .await
    }

    /// All `created` entries, joined with their student, for the stale
    /// entry sweep.
    pub async fn all_created(pool: &PgPool) -> Result<Vec<RoomEntryWithStudent>, sqlx::Error> {
        sqlx::query_as::<_, RoomEntryWithStudent>(
            "SELECT re.id, re.room_id, re.state, re.created_at, e.student_id
             FROM room_entries re
             JOIN entries e ON e.id = re.incoming_id
             WHERE re.state = 'created'
             ORDER BY re.id",
        )
        .fetch_all(pool)
        .await
    }

    /// Entry ids under a holding currently in one of the given states.
    pub async fn ids_for_holding_in_states(
        pool: &PgPool,
        holding_id: DbId,
        states: &[&str],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let states: Vec<String> = states.iter().map(|s| s.to_string()).collect();
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM room_entries
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
    ) -> Result<Vec<RoomEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM room_entries WHERE holding_id = $1 ORDER BY id"
        );
        sqlx::query_as::<_, RoomEntry>(&query)
            .bind(holding_id)
            .fetch_all(pool)
            .await
    }

    /// Display names for the students behind the given entries, for the
    /// unaccredited-attendee notification.
    pub async fn attendee_names(pool: &PgPool, ids: &[DbId]) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT s.first_name, s.last_name
             FROM room_entries re
             JOIN entries e ON e.id = re.incoming_id
             JOIN campus.students s ON s.id = e.student_id
             WHERE re.id = ANY($1)
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

    pub async fn mark_assigned(
        conn: &mut PgConnection,
        id: DbId,
        holding_id: DbId,
        accredited: bool,
        assigned: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE room_entries
             SET state = 'assigned', holding_id = $2, accredited = $3, assigned_at = $4,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(holding_id)
        .bind(accredited)
        .bind(assigned)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn mark_left(
        conn: &mut PgConnection,
        id: DbId,
        outgoing_id: Option<DbId>,
        ended: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE room_entries
             SET state = 'left', outgoing_id = $2, ended_at = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(outgoing_id)
        .bind(ended)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn mark_canceled(
        conn: &mut PgConnection,
        id: DbId,
        outgoing_id: Option<DbId>,
        ended: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE room_entries
             SET state = 'canceled', outgoing_id = $2, ended_at = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(outgoing_id)
        .bind(ended)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Discard clears the assignment timestamp; the entry was withdrawn
    /// from its holding rather than swiped out.
    pub async fn mark_discarded(
        conn: &mut PgConnection,
        id: DbId,
        ended: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE room_entries
             SET state = 'canceled', assigned_at = NULL, ended_at = $2, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(ended)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Flip to `complete`. `ended` is only written when provided; an entry
    /// already in `left` keeps its swipe-out timestamp.
    pub async fn mark_complete(
        conn: &mut PgConnection,
        id: DbId,
        outgoing_id: Option<DbId>,
        ended: Option<Timestamp>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE room_entries
             SET state = 'complete',
                 outgoing_id = COALESCE($2, outgoing_id),
                 ended_at = COALESCE($3, ended_at),
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(outgoing_id)
        .bind(ended)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Remove a pending entry whose student link no longer resolves.
    pub async fn delete(conn: &mut PgConnection, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM room_entries WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
