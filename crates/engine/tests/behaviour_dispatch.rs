//! Behaviour dispatch against a real database: the swipe-in/swipe-out
//! protocol, room selection, eligibility gating and statistics tallies.

mod common;

use attend_core::config::ReconcileConfig;
use attend_engine::behaviour::Dispatcher;
use attend_engine::holding;
use attend_engine::notify::Notifier;
use attend_db::repositories::{EntryRepo, RoomEntryRepo, ScheduleRepo, TerminalRepo};
use sqlx::PgPool;

use common::*;

async fn clock_once(
    pool: &PgPool,
    terminal_id: i64,
    card_id: &str,
    payload: serde_json::Value,
) -> Result<Vec<String>, attend_engine::EngineError> {
    let cfg = ReconcileConfig::default();
    let terminal = TerminalRepo::find_by_id(pool, terminal_id).await.unwrap().unwrap();
    let student = ScheduleRepo::find_student_by_card(pool, card_id).await.unwrap().unwrap();
    let dispatcher = Dispatcher::for_terminal(&terminal);

    let prompts = dispatcher.preflight(pool, &terminal, &student).await?;
    assert!(prompts.is_empty(), "unexpected preflight prompt");

    let entry = EntryRepo::create(pool, terminal.id, student.id).await.unwrap();
    dispatcher.clock(pool, &cfg, &entry, &student, &payload).await
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_arrival_then_departure_without_holding(pool: PgPool) {
    let room = seed_room(&pool, "H1").await;
    let terminal = seed_terminal(&pool, "term-1", &["attendance"], &[room]).await;
    let student = seed_student(&pool, "CARD-A").await;

    let messages = clock_once(&pool, terminal, "CARD-A", serde_json::json!({})).await.unwrap();
    assert!(messages[0].starts_with("Welcome"));

    let open = RoomEntryRepo::find_open_by_student(&pool, student).await.unwrap().unwrap();
    assert_eq!(open.state, "created");
    assert_eq!(open.room_id, room);

    // The second swipe is a departure; the never-assigned entry cancels.
    let messages = clock_once(&pool, terminal, "CARD-A", serde_json::json!({})).await.unwrap();
    assert_eq!(messages[0], "Goodbye");
    assert_eq!(room_entry_state(&pool, open.id).await, "canceled");
    assert!(RoomEntryRepo::find_open_by_student(&pool, student).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_arrival_attaches_to_running_holding(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let notifier = Notifier::disconnected();
    let room = seed_room(&pool, "H1").await;
    let terminal = seed_terminal(&pool, "term-1", &["attendance"], &[room]).await;
    let student = seed_student(&pool, "CARD-A").await;
    let group = seed_course_group(&pool, 10, "CS-A").await;
    enroll(&pool, group, student).await;
    let term = seed_term(&pool, group, room, minutes_ago(5), minutes_from_now(85)).await;
    let holding_id = seed_holding(&pool, term, room, None).await;
    holding::start(&pool, &cfg, &notifier, holding_id).await.unwrap();

    let messages = clock_once(&pool, terminal, "CARD-A", serde_json::json!({})).await.unwrap();
    assert!(messages[0].contains("CS-A"), "message was {:?}", messages[0]);

    let open = RoomEntryRepo::find_open_by_student(&pool, student).await.unwrap().unwrap();
    assert_eq!(open.state, "assigned");
    assert_eq!(open.holding_id, Some(holding_id));
    assert!(open.accredited);

    // Departure during the running session leaves it.
    let messages = clock_once(&pool, terminal, "CARD-A", serde_json::json!({})).await.unwrap();
    assert!(messages[0].starts_with("Thank you"));
    assert_eq!(room_entry_state(&pool, open.id).await, "left");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_double_tap_opens_single_entry(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let room = seed_room(&pool, "H1").await;
    let terminal_id = seed_terminal(&pool, "term-1", &["attendance"], &[room]).await;
    let student_id = seed_student(&pool, "CARD-A").await;

    let terminal = TerminalRepo::find_by_id(&pool, terminal_id).await.unwrap().unwrap();
    let student = ScheduleRepo::find_student(&pool, student_id).await.unwrap().unwrap();
    let dispatcher = Dispatcher::for_terminal(&terminal);

    let entry_a = EntryRepo::create(&pool, terminal.id, student.id).await.unwrap();
    let entry_b = EntryRepo::create(&pool, terminal.id, student.id).await.unwrap();

    // Both swipes race the open-entry check; the per-student lock
    // serializes them, so one opens the entry and the other closes it.
    let payload = serde_json::json!({});
    let (first, second) = tokio::join!(
        dispatcher.clock(&pool, &cfg, &entry_a, &student, &payload),
        dispatcher.clock(&pool, &cfg, &entry_b, &student, &payload),
    );
    first.unwrap();
    second.unwrap();

    let (total, open): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE ended_at IS NULL) FROM room_entries",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(total, 1, "a double tap must not open a second entry");
    assert_eq!(open, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_multi_room_terminal_requires_selection(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let room_a = seed_room(&pool, "H1").await;
    let room_b = seed_room(&pool, "H2").await;
    let terminal_id = seed_terminal(&pool, "hall", &["attendance"], &[room_a, room_b]).await;
    let student_id = seed_student(&pool, "CARD-A").await;

    let terminal = TerminalRepo::find_by_id(&pool, terminal_id).await.unwrap().unwrap();
    let student = ScheduleRepo::find_student(&pool, student_id).await.unwrap().unwrap();
    let dispatcher = Dispatcher::for_terminal(&terminal);

    let prompts = dispatcher.preflight(&pool, &terminal, &student).await.unwrap();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].id, "attendance:room");
    assert_eq!(prompts[0].options.len(), 2);

    // Clocking without an answer aborts.
    let entry = EntryRepo::create(&pool, terminal.id, student.id).await.unwrap();
    let err = dispatcher
        .clock(&pool, &cfg, &entry, &student, &serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(err.aborts_clock());

    // With the room answered, the arrival lands in the chosen room.
    let entry = EntryRepo::create(&pool, terminal.id, student.id).await.unwrap();
    dispatcher
        .clock(
            &pool,
            &cfg,
            &entry,
            &student,
            &serde_json::json!({ "attendance:room": room_b }),
        )
        .await
        .unwrap();
    let open = RoomEntryRepo::find_open_by_student(&pool, student.id).await.unwrap().unwrap();
    assert_eq!(open.room_id, room_b);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_eligibility_gate_blocks_swipe(pool: PgPool) {
    let cfg = ReconcileConfig::default();
    let room = seed_room(&pool, "H1").await;
    let terminal_id =
        seed_terminal(&pool, "term-1", &["eligibility", "attendance"], &[room]).await;
    let student_id = seed_student_with(&pool, "CARD-X", false).await;

    let terminal = TerminalRepo::find_by_id(&pool, terminal_id).await.unwrap().unwrap();
    let student = ScheduleRepo::find_student(&pool, student_id).await.unwrap().unwrap();
    let dispatcher = Dispatcher::for_terminal(&terminal);

    let err = dispatcher.preflight(&pool, &terminal, &student).await.unwrap_err();
    assert!(err.aborts_clock());

    // The gate also fires on clock, ahead of the attendance behaviour.
    let entry = EntryRepo::create(&pool, terminal.id, student.id).await.unwrap();
    let err = dispatcher
        .clock(&pool, &cfg, &entry, &student, &serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(err.aborts_clock());
    assert!(RoomEntryRepo::find_open_by_student(&pool, student.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_statistics_tally_checks_in_and_out(pool: PgPool) {
    let room = seed_room(&pool, "H1").await;
    let terminal = seed_terminal(&pool, "gym", &["statistics"], &[room]).await;
    seed_student(&pool, "CARD-A").await;

    let (set_id,): (i64,) =
        sqlx::query_as("INSERT INTO statistics (name) VALUES ('Gym') RETURNING id")
            .fetch_one(&pool)
            .await
            .unwrap();
    sqlx::query("INSERT INTO statistics_terminals (statistics_id, terminal_id) VALUES ($1, $2)")
        .bind(set_id)
        .bind(terminal)
        .execute(&pool)
        .await
        .unwrap();

    let messages = clock_once(&pool, terminal, "CARD-A", serde_json::json!({})).await.unwrap();
    assert_eq!(messages, vec!["Checked in: Gym".to_string()]);

    let messages = clock_once(&pool, terminal, "CARD-A", serde_json::json!({})).await.unwrap();
    assert_eq!(messages, vec!["Checked out: Gym".to_string()]);

    let (open, completed): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*) FILTER (WHERE state = 'created'),
                COUNT(*) FILTER (WHERE state = 'completed')
         FROM statistics_entries WHERE statistics_id = $1",
    )
    .bind(set_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(open, 0);
    assert_eq!(completed, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_unknown_behaviour_skipped(pool: PgPool) {
    let room = seed_room(&pool, "H1").await;
    let terminal_id = seed_terminal(&pool, "term-1", &["bogus"], &[room]).await;
    let terminal = TerminalRepo::find_by_id(&pool, terminal_id).await.unwrap().unwrap();

    let dispatcher = Dispatcher::for_terminal(&terminal);
    assert!(dispatcher.is_empty());
}
