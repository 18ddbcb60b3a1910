//! Liveness of the intake server and a glance at the queue behind it.
//!
//! Mounted at the root, outside `/api/v1`, and open to any caller: no
//! requester header is needed.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use reelq_db::repositories::JobRepo;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the job store answers, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub store_reachable: bool,
    /// Jobs waiting for a worker; absent when the store is unreachable.
    pub pending_jobs: Option<i64>,
    /// Jobs currently held by a worker; absent when the store is unreachable.
    pub in_progress_jobs: Option<i64>,
    /// Requesters inside their submission cooldown on this server.
    pub rate_limited_requesters: usize,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let counts = match reelq_db::health_check(&state.pool).await {
        Ok(()) => match JobRepo::status_counts(&state.pool).await {
            Ok(counts) => Some(counts),
            Err(e) => {
                tracing::warn!(error = %e, "Health check could not read queue depth");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, "Job store unreachable");
            None
        }
    };

    Json(HealthResponse {
        status: if counts.is_some() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        store_reachable: counts.is_some(),
        pending_jobs: counts.as_ref().map(|c| c.pending),
        in_progress_jobs: counts.as_ref().map(|c| c.in_progress),
        rate_limited_requesters: state.dispatcher.limiter().tracked(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
