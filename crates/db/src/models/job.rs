//! Job entity model and query DTOs.

use reelq_core::types::{DbId, RequesterId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{JobStatus, StatusId};

/// A row from the `jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Job {
    pub id: DbId,
    pub requester_id: RequesterId,
    /// Link exactly as submitted (trimmed).
    pub link: String,
    /// Canonical id extracted from `link`.
    pub locator: String,
    pub status: StatusId,
    pub error_message: Option<String>,
    /// Worker that claimed the job, if any.
    pub claimed_by: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    /// Typed view of the `status` column.
    pub fn job_status(&self) -> Option<JobStatus> {
        JobStatus::from_id(self.status)
    }
}

/// Per-status job counts for the admin statistics view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub failed: i64,
}

/// Query parameters for listing a requester's jobs.
#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    /// Maximum number of results. Defaults to 20, capped at 100.
    pub limit: Option<i64>,
}
