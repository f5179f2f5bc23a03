//! Queries against the schedule replica (`campus` schema) plus the two
//! idempotent booking write-backs.
//!
//! Reads never mutate the replica. The booking inserts are keyed so that
//! retried identical writes are no-ops, which lets transition services
//! couple them into the local transaction and retry after rollback.

use attend_core::types::{DbId, TermWindow, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::campus::{CourseGroupTerm, Person, Room, Student};

const STUDENT_COLUMNS: &str = "id, matriculation, first_name, last_name, card_id, eligible";
const TERM_COLUMNS: &str = "id, course_group_id, room_id, person_id, term_no, start_at, end_at";

/// Read-side schedule source and booking write-back target.
pub struct ScheduleRepo;

impl ScheduleRepo {
    pub async fn find_student_by_card(
        pool: &PgPool,
        card_id: &str,
    ) -> Result<Option<Student>, sqlx::Error> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM campus.students WHERE card_id = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(card_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_student(pool: &PgPool, id: DbId) -> Result<Option<Student>, sqlx::Error> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM campus.students WHERE id = $1");
        sqlx::query_as::<_, Student>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_room(pool: &PgPool, id: DbId) -> Result<Option<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>("SELECT id, name, name_short FROM campus.rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_person(pool: &PgPool, id: DbId) -> Result<Option<Person>, sqlx::Error> {
        sqlx::query_as::<_, Person>(
            "SELECT id, first_name, last_name, email, username FROM campus.persons WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_term(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<CourseGroupTerm>, sqlx::Error> {
        let query = format!("SELECT {TERM_COLUMNS} FROM campus.course_group_terms WHERE id = $1");
        sqlx::query_as::<_, CourseGroupTerm>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Look up a term inside a transition's transaction.
    pub async fn term(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<CourseGroupTerm>, sqlx::Error> {
        let query = format!("SELECT {TERM_COLUMNS} FROM campus.course_group_terms WHERE id = $1");
        sqlx::query_as::<_, CourseGroupTerm>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    pub async fn group_name(pool: &PgPool, group_id: DbId) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT name FROM campus.course_groups WHERE id = $1")
                .bind(group_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.map(|(name,)| name))
    }

    /// Whether a student is on the roster of a course group.
    pub async fn is_rostered(
        conn: &mut PgConnection,
        course_group_id: DbId,
        student_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM campus.course_group_students
                 WHERE course_group_id = $1 AND student_id = $2
             )",
        )
        .bind(course_group_id)
        .bind(student_id)
        .fetch_one(conn)
        .await?;
        Ok(row.0)
    }

    /// Pool-side variant of [`Self::is_rostered`] for read paths outside a
    /// transaction.
    pub async fn roster_contains(
        pool: &PgPool,
        course_group_id: DbId,
        student_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM campus.course_group_students
                 WHERE course_group_id = $1 AND student_id = $2
             )",
        )
        .bind(course_group_id)
        .bind(student_id)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// Terms sharing room, start and end with the given window, excluding
    /// one term (the starting holding's own).
    pub async fn parallel_term_ids(
        pool: &PgPool,
        room_id: DbId,
        start: Timestamp,
        end: Timestamp,
        exclude_term_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT id FROM campus.course_group_terms
             WHERE room_id = $1 AND start_at = $2 AND end_at = $3 AND id <> $4
             ORDER BY id",
        )
        .bind(room_id)
        .bind(start)
        .bind(end)
        .bind(exclude_term_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Union of the rosters of the given terms.
    pub async fn students_of_terms(
        pool: &PgPool,
        term_ids: &[DbId],
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as(
            "SELECT DISTINCT cgs.student_id
             FROM campus.course_group_terms t
             JOIN campus.course_group_students cgs ON cgs.course_group_id = t.course_group_id
             WHERE t.id = ANY($1)",
        )
        .bind(term_ids)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// The next term in the room that the student is rostered for, starting
    /// inside `(window_start, window_end)`. Used for continuation seeding.
    pub async fn continuation_term(
        conn: &mut PgConnection,
        room_id: DbId,
        student_id: DbId,
        window_start: Timestamp,
        window_end: Timestamp,
    ) -> Result<Option<CourseGroupTerm>, sqlx::Error> {
        sqlx::query_as::<_, CourseGroupTerm>(
            "SELECT t.id, t.course_group_id, t.room_id, t.person_id, t.term_no,
                    t.start_at, t.end_at
             FROM campus.course_group_terms t
             JOIN campus.course_group_students cgs ON cgs.course_group_id = t.course_group_id
             WHERE t.room_id = $1
               AND cgs.student_id = $2
               AND t.start_at > $3
               AND t.start_at < $4
             ORDER BY t.start_at
             LIMIT 1",
        )
        .bind(room_id)
        .bind(student_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_optional(conn)
        .await
    }

    /// Scheduled windows for a room on the day of the given timestamp,
    /// sorted by start. Feeds the stale-entry decision logic.
    pub async fn day_windows(
        pool: &PgPool,
        room_id: DbId,
        day: Timestamp,
    ) -> Result<Vec<TermWindow>, sqlx::Error> {
        let rows: Vec<(Timestamp, Timestamp)> = sqlx::query_as(
            "SELECT start_at, end_at FROM campus.course_group_terms
             WHERE room_id = $1 AND start_at::date = $2::date AND end_at::date = $2::date
             ORDER BY start_at",
        )
        .bind(room_id)
        .bind(day)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(start, end)| TermWindow { start, end })
            .collect())
    }

    /// Every student rostered in any course group under the parent course
    /// of the given term. This is the derived "who should have attended"
    /// roster; callers degrade to an empty list on failure.
    pub async fn course_roster_for_term(
        pool: &PgPool,
        term_id: DbId,
    ) -> Result<Vec<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            "SELECT DISTINCT s.id, s.matriculation, s.first_name, s.last_name, s.card_id,
                    s.eligible
             FROM campus.course_group_terms t
             JOIN campus.course_groups g ON g.id = t.course_group_id
             JOIN campus.course_groups sibling ON sibling.course_id = g.course_id
             JOIN campus.course_group_students cgs ON cgs.course_group_id = sibling.id
             JOIN campus.students s ON s.id = cgs.student_id
             WHERE t.id = $1
             ORDER BY s.last_name, s.first_name",
        )
        .bind(term_id)
        .fetch_all(pool)
        .await
    }

    /// Record one attendance row for a completed room/manual entry.
    /// Idempotent on `booking_id`.
    pub async fn write_attendance_booking(
        conn: &mut PgConnection,
        booking_id: &str,
        student_id: DbId,
        course_group_id: DbId,
        term_no: i32,
        assigned: Option<Timestamp>,
        ended: Option<Timestamp>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO campus.attendance_bookings
                 (booking_id, student_id, course_group_id, term_no, assigned_at, ended_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (booking_id) DO NOTHING",
        )
        .bind(booking_id)
        .bind(student_id)
        .bind(course_group_id)
        .bind(term_no)
        .bind(assigned)
        .bind(ended)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Record one session row for an ended holding. Idempotent on
    /// `session_id`.
    pub async fn write_session_booking(
        conn: &mut PgConnection,
        session_id: DbId,
        course_group_id: DbId,
        lecturer_id: Option<DbId>,
        term_no: i32,
        initiated: Timestamp,
        finished: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO campus.session_bookings
                 (session_id, course_group_id, lecturer_id, term_no, initiated_at, finished_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (session_id) DO NOTHING",
        )
        .bind(session_id)
        .bind(course_group_id)
        .bind(lecturer_id)
        .bind(term_no)
        .bind(initiated)
        .bind(finished)
        .execute(conn)
        .await?;
        Ok(())
    }
}
