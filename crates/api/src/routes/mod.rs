pub mod admin;
pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /jobs                 list own jobs (GET), submit link (POST)
/// /jobs/{id}            get one job (owner or admin)
///
/// /admin/stats          completed total and per-status counts (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/jobs", jobs::router())
        .nest("/admin", admin::router())
}
