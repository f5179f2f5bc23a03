use std::sync::Arc;

use attend_core::config::ReconcileConfig;
use attend_engine::notify::Notifier;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`. Cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: attend_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Reconciliation timing knobs shared with the background sweeps.
    pub reconcile: Arc<ReconcileConfig>,
    /// Handle to the notification worker.
    pub notifier: Notifier,
}
