//! Route definitions for the `/terminals` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::terminals;
use crate::state::AppState;

/// Routes mounted at `/terminals`.
///
/// ```text
/// GET    /       -> list
/// POST   /       -> create
/// GET    /{id}   -> get_by_id (with rooms)
/// PUT    /{id}   -> update
/// DELETE /{id}   -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(terminals::list).post(terminals::create))
        .route(
            "/{id}",
            get(terminals::get_by_id)
                .put(terminals::update)
                .delete(terminals::delete),
        )
}
