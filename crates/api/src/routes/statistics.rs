//! Route definitions for the `/statistics` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::statistics;
use crate::state::AppState;

/// Routes mounted at `/statistics`.
///
/// ```text
/// GET  /               -> list
/// POST /               -> create
/// GET  /{id}           -> get_by_id
/// GET  /{id}/entries   -> entries
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(statistics::list).post(statistics::create))
        .route("/{id}", get(statistics::get_by_id))
        .route("/{id}/entries", get(statistics::entries))
}
