//! Shared seed helpers for engine integration tests.
//!
//! The campus schema is a replica in production; tests populate it with
//! raw inserts the same way the sync job would.

#![allow(dead_code)]

use attend_core::types::{DbId, Timestamp};
use chrono::{Duration, Utc};
use sqlx::PgPool;

pub fn minutes_ago(n: i64) -> Timestamp {
    Utc::now() - Duration::minutes(n)
}

pub fn minutes_from_now(n: i64) -> Timestamp {
    Utc::now() + Duration::minutes(n)
}

pub async fn seed_room(pool: &PgPool, name: &str) -> DbId {
    let (id,): (DbId,) =
        sqlx::query_as("INSERT INTO campus.rooms (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .unwrap();
    id
}

pub async fn seed_person(pool: &PgPool, last_name: &str, email: Option<&str>) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO campus.persons (first_name, last_name, email)
         VALUES ('Jo', $1, $2) RETURNING id",
    )
    .bind(last_name)
    .bind(email)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub async fn seed_student(pool: &PgPool, card_id: &str) -> DbId {
    seed_student_with(pool, card_id, true).await
}

pub async fn seed_student_with(pool: &PgPool, card_id: &str, eligible: bool) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO campus.students (matriculation, first_name, last_name, card_id, eligible)
         VALUES ($1, 'Sam', $2, $1, $3) RETURNING id",
    )
    .bind(card_id)
    .bind(format!("Holder-{card_id}"))
    .bind(eligible)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub async fn seed_course_group(pool: &PgPool, course_id: DbId, name: &str) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO campus.course_groups (course_id, name) VALUES ($1, $2) RETURNING id",
    )
    .bind(course_id)
    .bind(name)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub async fn enroll(pool: &PgPool, course_group_id: DbId, student_id: DbId) {
    sqlx::query(
        "INSERT INTO campus.course_group_students (course_group_id, student_id) VALUES ($1, $2)",
    )
    .bind(course_group_id)
    .bind(student_id)
    .execute(pool)
    .await
    .unwrap();
}

pub async fn seed_term(
    pool: &PgPool,
    course_group_id: DbId,
    room_id: DbId,
    start: Timestamp,
    end: Timestamp,
) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO campus.course_group_terms
             (course_group_id, room_id, term_no, start_at, end_at)
         VALUES ($1, $2, 1, $3, $4) RETURNING id",
    )
    .bind(course_group_id)
    .bind(room_id)
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub async fn seed_terminal(pool: &PgPool, hostname: &str, behaviour: &[&str], room_ids: &[DbId]) -> DbId {
    let behaviour: Vec<String> = behaviour.iter().map(|b| b.to_string()).collect();
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO terminals (hostname, online, behaviour) VALUES ($1, TRUE, $2) RETURNING id",
    )
    .bind(hostname)
    .bind(&behaviour)
    .fetch_one(pool)
    .await
    .unwrap();
    for room_id in room_ids {
        sqlx::query("INSERT INTO terminal_rooms (terminal_id, room_id) VALUES ($1, $2)")
            .bind(id)
            .bind(room_id)
            .execute(pool)
            .await
            .unwrap();
    }
    id
}

pub async fn seed_holding(pool: &PgPool, term_id: DbId, room_id: DbId, lecturer_id: Option<DbId>) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO holdings (course_group_term_id, room_id, lecturer_id)
         VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(term_id)
    .bind(room_id)
    .bind(lecturer_id)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

/// Record a swipe and open the pending room entry for it, the way the
/// attendance behaviour does on arrival.
pub async fn swipe_in(pool: &PgPool, terminal_id: DbId, student_id: DbId, room_id: DbId) -> DbId {
    let (entry_id,): (DbId,) = sqlx::query_as(
        "INSERT INTO entries (terminal_id, student_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(terminal_id)
    .bind(student_id)
    .fetch_one(pool)
    .await
    .unwrap();
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO room_entries (incoming_id, room_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(entry_id)
    .bind(room_id)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub async fn backdate_room_entry(pool: &PgPool, id: DbId, created: Timestamp) {
    sqlx::query("UPDATE room_entries SET created_at = $2 WHERE id = $1")
        .bind(id)
        .bind(created)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn room_entry_state(pool: &PgPool, id: DbId) -> String {
    let (state,): (String,) = sqlx::query_as("SELECT state FROM room_entries WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap();
    state
}

pub async fn manual_entry_state(pool: &PgPool, id: DbId) -> String {
    let (state,): (String,) = sqlx::query_as("SELECT state FROM manual_entries WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap();
    state
}

pub async fn holding_state(pool: &PgPool, id: DbId) -> String {
    let (state,): (String,) = sqlx::query_as("SELECT state FROM holdings WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap();
    state
}

pub async fn attendance_booking_count(pool: &PgPool, booking_id: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM campus.attendance_bookings WHERE booking_id = $1",
    )
    .bind(booking_id)
    .fetch_one(pool)
    .await
    .unwrap();
    count
}

pub async fn session_booking_count(pool: &PgPool, session_id: DbId) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM campus.session_bookings WHERE session_id = $1")
            .bind(session_id)
            .fetch_one(pool)
            .await
            .unwrap();
    count
}
