//! Route definitions for the `/room-entries` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::room_entries;
use crate::state::AppState;

/// Routes mounted at `/room-entries`.
///
/// ```text
/// GET  /{id}          -> get_by_id
/// POST /{id}/discard  -> discard
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(room_entries::get_by_id))
        .route("/{id}/discard", post(room_entries::discard))
}
