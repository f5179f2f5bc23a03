//! Route definitions for the device-facing clock protocol.
//!
//! Mounted at the root rather than under `/api/v1`; the terminal
//! firmware predates the versioned API.

use axum::routing::get;
use axum::Router;

use crate::handlers::clock;
use crate::state::AppState;

/// Routes mounted at the application root.
///
/// ```text
/// GET  /terminal/clock/{terminal_id}/{card_id}  -> preflight
/// POST /terminal/clock/{terminal_id}/{card_id}  -> clock
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/terminal/clock/{terminal_id}/{card_id}",
        get(clock::preflight).post(clock::clock),
    )
}
