//! Route definitions for the `/manual-entries` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::manual_entries;
use crate::state::AppState;

/// Routes mounted at `/manual-entries`.
///
/// ```text
/// POST /               -> create
/// GET  /{id}           -> get_by_id
/// POST /{id}/leave     -> leave
/// POST /{id}/discard   -> discard
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(manual_entries::create))
        .route("/{id}", get(manual_entries::get_by_id))
        .route("/{id}/leave", post(manual_entries::leave))
        .route("/{id}/discard", post(manual_entries::discard))
}
