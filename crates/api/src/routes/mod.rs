pub mod clock;
pub mod health;
pub mod holdings;
pub mod manual_entries;
pub mod room_entries;
pub mod statistics;
pub mod terminals;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /terminals                        list, create
/// /terminals/{id}                   get, update, delete
///
/// /holdings                         list (?state, ?room_id, ?lecturer_id), create
/// /holdings/{id}                    get
/// /holdings/{id}/start              start (POST)
/// /holdings/{id}/end                end, optionally backdated (POST)
/// /holdings/{id}/cancel             cancel (POST)
/// /holdings/{id}/accredited         derived roster (GET)
/// /holdings/{id}/room-entries       attached room entries (GET)
/// /holdings/{id}/manual-entries     attached manual entries (GET)
///
/// /room-entries/{id}                get
/// /room-entries/{id}/discard        withdraw from holding (POST)
///
/// /manual-entries                   create
/// /manual-entries/{id}              get
/// /manual-entries/{id}/leave        swipe-out equivalent (POST)
/// /manual-entries/{id}/discard      withdraw from holding (POST)
///
/// /statistics                       list, create
/// /statistics/{id}                  get
/// /statistics/{id}/entries          tally entries (GET)
/// ```
///
/// The device-facing clock protocol lives at the root, not under
/// `/api/v1`; see [`clock::router`].
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/terminals", terminals::router())
        .nest("/holdings", holdings::router())
        .nest("/room-entries", room_entries::router())
        .nest("/manual-entries", manual_entries::router())
        .nest("/statistics", statistics::router())
}
