use std::sync::Arc;

use reelq_pipeline::{AdminGate, Dispatcher};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: reelq_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Request admission (allowlist, locator grammar, rate limit).
    pub dispatcher: Arc<Dispatcher>,
    /// Admin identity check for statistics.
    pub admin: Arc<AdminGate>,
}
