//! Handlers for admin-only statistics.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use reelq_core::messages;
use reelq_db::models::job::StatusCounts;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::identity::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Total downloads processed.
    pub completed: i64,
    pub by_status: StatusCounts,
    pub message: String,
}

/// GET /api/v1/admin/stats
pub async fn get_stats(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let completed = state.admin.count_completed(&state.pool, &admin.id).await?;
    let by_status = state.admin.status_counts(&state.pool, &admin.id).await?;

    tracing::debug!(requester_id = %admin.id, completed, "Stats served");

    Ok(Json(DataResponse {
        data: StatsResponse {
            completed,
            by_status,
            message: messages::stats(completed),
        },
    }))
}
