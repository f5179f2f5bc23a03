//! Route definitions for the `/holdings` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::holdings;
use crate::state::AppState;

/// Routes mounted at `/holdings`.
///
/// ```text
/// GET  /                      -> list
/// POST /                      -> create
/// GET  /{id}                  -> get_by_id
/// POST /{id}/start            -> start
/// POST /{id}/end              -> end
/// POST /{id}/cancel           -> cancel
/// GET  /{id}/accredited       -> accredited
/// GET  /{id}/room-entries     -> room_entries
/// GET  /{id}/manual-entries   -> manual_entries
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(holdings::list).post(holdings::create))
        .route("/{id}", get(holdings::get_by_id))
        .route("/{id}/start", post(holdings::start))
        .route("/{id}/end", post(holdings::end))
        .route("/{id}/cancel", post(holdings::cancel))
        .route("/{id}/accredited", get(holdings::accredited))
        .route("/{id}/room-entries", get(holdings::room_entries))
        .route("/{id}/manual-entries", get(holdings::manual_entries))
}
