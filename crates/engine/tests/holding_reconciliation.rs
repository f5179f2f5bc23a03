//! Holding start/end/cancel against a real database: pending entry
//! reconciliation, parallel sessions, conflict resolution and the
//! session booking.

mod common;

use attend_core::config::ReconcileConfig;
use attend_db::models::manual_entry::CreateManualEntry;
use attend_engine::notify::Notifier;
use attend_engine::{holding, manual_entry};
use sqlx::PgPool;

use common::*;

#[sqlx::test(migrations = "../db/migrations")]
async fn test_start_assigns_pending_entries(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let notifier = Notifier::disconnected();
    let room = seed_room(&pool, "H1").await;
    let terminal = seed_terminal(&pool, "term-1", &["attendance"], &[room]).await;
    let rostered = seed_student(&pool, "CARD-A").await;
    let walk_in = seed_student(&pool, "CARD-B").await;
    let group = seed_course_group(&pool, 10, "CS-A").await;
    enroll(&pool, group, rostered).await;
    let term = seed_term(&pool, group, room, minutes_ago(5), minutes_from_now(85)).await;
    let holding_id = seed_holding(&pool, term, room, None).await;

    let entry_a = swipe_in(&pool, terminal, rostered, room).await;
    let entry_b = swipe_in(&pool, terminal, walk_in, room).await;

    let started = holding::start(&pool, &cfg, &notifier, holding_id).await.unwrap();
    assert_eq!(started.state, "running");
    assert!(started.initiated_at.is_some());
    assert_eq!(room_entry_state(&pool, entry_a).await, "assigned");
    assert_eq!(room_entry_state(&pool, entry_b).await, "assigned");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_start_twice_rejected(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let notifier = Notifier::disconnected();
    let room = seed_room(&pool, "H1").await;
    let group = seed_course_group(&pool, 10, "CS-A").await;
    let term = seed_term(&pool, group, room, minutes_ago(5), minutes_from_now(85)).await;
    let holding_id = seed_holding(&pool, term, room, None).await;

    holding::start(&pool, &cfg, &notifier, holding_id).await.unwrap();
    let err = holding::start(&pool, &cfg, &notifier, holding_id).await.unwrap_err();
    assert!(err.is_invalid_transition());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_start_skips_students_of_parallel_terms(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let notifier = Notifier::disconnected();
    let room = seed_room(&pool, "H1").await;
    let terminal = seed_terminal(&pool, "term-1", &["attendance"], &[room]).await;
    let ours = seed_student(&pool, "CARD-A").await;
    let theirs = seed_student(&pool, "CARD-B").await;
    let group_a = seed_course_group(&pool, 10, "CS-A").await;
    let group_b = seed_course_group(&pool, 10, "CS-B").await;
    enroll(&pool, group_a, ours).await;
    enroll(&pool, group_b, theirs).await;
    // Two terms sharing room and window: genuine parallel sessions.
    let start = minutes_ago(5);
    let end = minutes_from_now(85);
    let term_a = seed_term(&pool, group_a, room, start, end).await;
    let term_b = seed_term(&pool, group_b, room, start, end).await;
    let holding_a = seed_holding(&pool, term_a, room, None).await;
    let holding_b = seed_holding(&pool, term_b, room, None).await;

    let entry_ours = swipe_in(&pool, terminal, ours, room).await;
    let entry_theirs = swipe_in(&pool, terminal, theirs, room).await;

    holding::start(&pool, &cfg, &notifier, holding_a).await.unwrap();

    // The parallel roster's student stays pending for holding B.
    assert_eq!(room_entry_state(&pool, entry_ours).await, "assigned");
    assert_eq!(room_entry_state(&pool, entry_theirs).await, "created");

    holding::start(&pool, &cfg, &notifier, holding_b).await.unwrap();
    assert_eq!(room_entry_state(&pool, entry_theirs).await, "assigned");
    // Starting the parallel session does not end the first one.
    assert_eq!(holding_state(&pool, holding_a).await, "running");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_start_drops_entries_with_detached_student(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let notifier = Notifier::disconnected();
    let room = seed_room(&pool, "H1").await;
    let terminal = seed_terminal(&pool, "term-1", &["attendance"], &[room]).await;
    let student = seed_student(&pool, "CARD-A").await;
    let group = seed_course_group(&pool, 10, "CS-A").await;
    let term = seed_term(&pool, group, room, minutes_ago(5), minutes_from_now(85)).await;
    let holding_id = seed_holding(&pool, term, room, None).await;

    let entry = swipe_in(&pool, terminal, student, room).await;
    sqlx::query("UPDATE entries SET student_id = NULL")
        .execute(&pool)
        .await
        .unwrap();

    holding::start(&pool, &cfg, &notifier, holding_id).await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM room_entries WHERE id = $1")
        .bind(entry)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_start_ends_conflicting_holding(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let notifier = Notifier::disconnected();
    let room = seed_room(&pool, "H1").await;
    let group_a = seed_course_group(&pool, 10, "CS-A").await;
    let group_b = seed_course_group(&pool, 20, "MA-A").await;
    // Different windows: the sessions conflict over the room.
    let term_a = seed_term(&pool, group_a, room, minutes_ago(120), minutes_ago(30)).await;
    let term_b = seed_term(&pool, group_b, room, minutes_ago(15), minutes_from_now(75)).await;
    let holding_a = seed_holding(&pool, term_a, room, None).await;
    let holding_b = seed_holding(&pool, term_b, room, None).await;

    holding::start(&pool, &cfg, &notifier, holding_a).await.unwrap();
    holding::start(&pool, &cfg, &notifier, holding_b).await.unwrap();

    assert_eq!(holding_state(&pool, holding_a).await, "finished");
    assert_eq!(holding_state(&pool, holding_b).await, "running");
    assert_eq!(session_booking_count(&pool, holding_a).await, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_end_completes_children_and_books_session(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let notifier = Notifier::disconnected();
    let room = seed_room(&pool, "H1").await;
    let terminal = seed_terminal(&pool, "term-1", &["attendance"], &[room]).await;
    let swiper = seed_student(&pool, "CARD-A").await;
    let listed = seed_student(&pool, "CARD-B").await;
    let lecturer = seed_person(&pool, "Knuth", Some("knuth@example.edu")).await;
    let group = seed_course_group(&pool, 10, "CS-A").await;
    enroll(&pool, group, swiper).await;
    enroll(&pool, group, listed).await;
    let term = seed_term(&pool, group, room, minutes_ago(30), minutes_from_now(60)).await;
    let holding_id = seed_holding(&pool, term, room, Some(lecturer)).await;

    let room_child = swipe_in(&pool, terminal, swiper, room).await;
    holding::start(&pool, &cfg, &notifier, holding_id).await.unwrap();
    let manual_child = manual_entry::create(
        &pool,
        &CreateManualEntry {
            holding_id,
            student_id: listed,
            room_id: room,
        },
    )
    .await
    .unwrap();

    let ended = holding::end(&pool, &cfg, &notifier, holding_id, None).await.unwrap();
    assert_eq!(ended.state, "finished");
    assert!(ended.finished_at.is_some());
    assert_eq!(room_entry_state(&pool, room_child).await, "complete");
    assert_eq!(manual_entry_state(&pool, manual_child.id).await, "complete");
    assert_eq!(session_booking_count(&pool, holding_id).await, 1);
    assert_eq!(
        attendance_booking_count(&pool, &format!("room-entry-{room_child}")).await,
        1
    );

    let err = holding::end(&pool, &cfg, &notifier, holding_id, None).await.unwrap_err();
    assert!(err.is_invalid_transition());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_end_backdates_when_given_finished(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let notifier = Notifier::disconnected();
    let room = seed_room(&pool, "H1").await;
    let group = seed_course_group(&pool, 10, "CS-A").await;
    let term = seed_term(&pool, group, room, minutes_ago(120), minutes_ago(30)).await;
    let holding_id = seed_holding(&pool, term, room, None).await;

    holding::start(&pool, &cfg, &notifier, holding_id).await.unwrap();
    let backdate = minutes_ago(30);
    let ended = holding::end(&pool, &cfg, &notifier, holding_id, Some(backdate)).await.unwrap();

    let finished = ended.finished_at.unwrap();
    assert!((finished - backdate).num_seconds().abs() < 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_cancel_discards_children_without_booking(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let notifier = Notifier::disconnected();
    let room = seed_room(&pool, "H1").await;
    let terminal = seed_terminal(&pool, "term-1", &["attendance"], &[room]).await;
    let swiper = seed_student(&pool, "CARD-A").await;
    let listed = seed_student(&pool, "CARD-B").await;
    let group = seed_course_group(&pool, 10, "CS-A").await;
    let term = seed_term(&pool, group, room, minutes_ago(5), minutes_from_now(85)).await;
    let holding_id = seed_holding(&pool, term, room, None).await;

    let room_child = swipe_in(&pool, terminal, swiper, room).await;
    holding::start(&pool, &cfg, &notifier, holding_id).await.unwrap();
    let manual_child = manual_entry::create(
        &pool,
        &CreateManualEntry {
            holding_id,
            student_id: listed,
            room_id: room,
        },
    )
    .await
    .unwrap();

    let canceled = holding::cancel(&pool, holding_id).await.unwrap();
    assert_eq!(canceled.state, "canceled");
    assert_eq!(room_entry_state(&pool, room_child).await, "canceled");
    assert_eq!(manual_entry_state(&pool, manual_child.id).await, "canceled");
    assert_eq!(session_booking_count(&pool, holding_id).await, 0);
    assert_eq!(
        attendance_booking_count(&pool, &format!("room-entry-{room_child}")).await,
        0
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_cancel_finished_holding_rejected(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let notifier = Notifier::disconnected();
    let room = seed_room(&pool, "H1").await;
    let group = seed_course_group(&pool, 10, "CS-A").await;
    let term = seed_term(&pool, group, room, minutes_ago(30), minutes_from_now(60)).await;
    let holding_id = seed_holding(&pool, term, room, None).await;

    holding::start(&pool, &cfg, &notifier, holding_id).await.unwrap();
    holding::end(&pool, &cfg, &notifier, holding_id, None).await.unwrap();

    let err = holding::cancel(&pool, holding_id).await.unwrap_err();
    assert!(err.is_invalid_transition());
}
