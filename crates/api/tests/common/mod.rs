//! Shared helpers for API integration tests: router construction, request
//! plumbing, and campus seed data.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use attend_api::config::ServerConfig;
use attend_api::routes;
use attend_api::state::AppState;
use attend_core::config::ReconcileConfig;
use attend_core::types::{DbId, Timestamp};
use attend_engine::notify::Notifier;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses. The notifier is disconnected;
/// notification delivery has its own tests.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();

    let state = AppState {
        pool,
        config: Arc::new(config),
        reconcile: Arc::new(ReconcileConfig::from_env()),
        notifier: Notifier::disconnected(),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .merge(routes::clock::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// POST without a body, for transition endpoints.
pub async fn post_empty(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Campus seed helpers
// ---------------------------------------------------------------------------

pub fn minutes_ago(n: i64) -> Timestamp {
    Utc::now() - chrono::Duration::minutes(n)
}

pub fn minutes_from_now(n: i64) -> Timestamp {
    Utc::now() + chrono::Duration::minutes(n)
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
    start_at: Timestamp,
    end_at: Timestamp,
) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO campus.course_group_terms (course_group_id, room_id, term_no, start_at, end_at)
         VALUES ($1, $2, 1, $3, $4) RETURNING id",
    )
    .bind(course_group_id)
    .bind(room_id)
    .bind(start_at)
    .bind(end_at)
    .fetch_one(pool)
    .await
    .unwrap();
    id
}

pub async fn seed_terminal(
    pool: &PgPool,
    hostname: &str,
    behaviour: &[&str],
    room_ids: &[DbId],
) -> DbId {
    let behaviour: Vec<String> = behaviour.iter().map(|s| s.to_string()).collect();
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO terminals (hostname, behaviour, online, enabled)
         VALUES ($1, $2, TRUE, TRUE) RETURNING id",
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

pub async fn seed_holding(
    pool: &PgPool,
    term_id: DbId,
    room_id: DbId,
    lecturer_id: Option<DbId>,
) -> DbId {
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
