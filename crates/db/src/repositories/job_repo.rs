//! Repository for the `jobs` table.
//!
//! Uses [`JobStatus`] for every status literal. Each state transition is a
//! single conditional `UPDATE` guarded by the expected prior status, which
//! is what makes claims exclusive and terminal marks idempotent.

use chrono::Utc;
use reelq_core::types::{DbId, Timestamp};

use crate::models::job::{Job, JobListQuery, StatusCounts};
use crate::models::status::{JobStatus, StatusId};
use crate::DbPool;

/// Column list for `jobs` queries.
const COLUMNS: &str = "\
    id, requester_id, link, locator, status, error_message, claimed_by, \
    created_at, updated_at";

/// Maximum page size for job listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for job listing.
const DEFAULT_LIMIT: i64 = 20;

/// Provides queue operations for fetch jobs.
pub struct JobRepo;

impl JobRepo {
    /// Insert a new pending job and return the stored row.
    ///
    /// Ids come from `AUTOINCREMENT`, so they are unique, strictly increasing
    /// and never reused even after rows are pruned.
    pub async fn enqueue(
        pool: &DbPool,
        requester_id: &str,
        link: &str,
        locator: &str,
    ) -> Result<Job, sqlx::Error> {
        let now = Utc::now();
        let query = format!(
            "INSERT INTO jobs (requester_id, link, locator, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(requester_id)
            .bind(link)
            .bind(locator)
            .bind(JobStatus::Pending.id())
            .bind(now)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim the oldest pending job for a worker.
    ///
    /// The sub-select picks the lowest pending id and the outer `UPDATE`
    /// re-checks `status` in the same statement, so under any number of
    /// concurrent callers each job is handed out at most once.
    pub async fn claim_next(pool: &DbPool, worker_id: &str) -> Result<Option<Job>, sqlx::Error> {
        let query = format!(
            "UPDATE jobs \
             SET status = $1, claimed_by = $2, updated_at = $3 \
             WHERE id = ( \
                 SELECT id FROM jobs \
                 WHERE status = $4 \
                 ORDER BY id ASC \
                 LIMIT 1 \
             ) \
             AND status = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(JobStatus::InProgress.id())
            .bind(worker_id)
            .bind(Utc::now())
            .bind(JobStatus::Pending.id())
            .bind(JobStatus::Pending.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a job completed on behalf of the worker holding its claim.
    ///
    /// Returns `false` without error when the job is not `InProgress` under
    /// `worker_id` (already terminal, never claimed, unknown, or requeued
    /// and claimed by someone else).
    pub async fn mark_completed(
        pool: &DbPool,
        job_id: DbId,
        worker_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $2, updated_at = $3 \
             WHERE id = $1 AND status = $4 AND claimed_by = $5",
        )
        .bind(job_id)
        .bind(JobStatus::Completed.id())
        .bind(Utc::now())
        .bind(JobStatus::InProgress.id())
        .bind(worker_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark a job failed with a reason on behalf of the claim holder.
    ///
    /// Same no-op semantics as [`mark_completed`](Self::mark_completed). No
    /// automatic retry is performed; a failed job stays failed.
    pub async fn mark_failed(
        pool: &DbPool,
        job_id: DbId,
        worker_id: &str,
        reason: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $2, error_message = $3, updated_at = $4 \
             WHERE id = $1 AND status = $5 AND claimed_by = $6",
        )
        .bind(job_id)
        .bind(JobStatus::Failed.id())
        .bind(reason)
        .bind(Utc::now())
        .bind(JobStatus::InProgress.id())
        .bind(worker_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Refresh the heartbeat (`updated_at`) of a job `worker_id` still holds.
    ///
    /// Workers call this on every progress tick until the job is terminal,
    /// so a long fetch or delivery is not mistaken for an orphan. `false`
    /// means the claim is gone.
    pub async fn touch(pool: &DbPool, job_id: DbId, worker_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs SET updated_at = $2 \
             WHERE id = $1 AND status = $3 AND claimed_by = $4",
        )
        .bind(job_id)
        .bind(Utc::now())
        .bind(JobStatus::InProgress.id())
        .bind(worker_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Return orphaned jobs to the queue.
    ///
    /// Every `InProgress` job whose `updated_at` is older than `cutoff` goes
    /// back to `Pending` with its claim cleared. Returns the number of jobs
    /// requeued.
    ///
    /// Timestamps are stored as RFC 3339 text with a variable number of
    /// fractional digits, so they are compared through `julianday` rather
    /// than as strings.
    pub async fn requeue_stale(pool: &DbPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE jobs SET status = $1, claimed_by = NULL, updated_at = $2 \
             WHERE status = $3 AND julianday(updated_at) < julianday($4)",
        )
        .bind(JobStatus::Pending.id())
        .bind(Utc::now())
        .bind(JobStatus::InProgress.id())
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Job>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a requester's jobs, newest first.
    pub async fn list_by_requester(
        pool: &DbPool,
        requester_id: &str,
        params: &JobListQuery,
    ) -> Result<Vec<Job>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM jobs \
             WHERE requester_id = $1 \
             ORDER BY id DESC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Job>(&query)
            .bind(requester_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Total number of jobs ever stored.
    pub async fn count_all(pool: &DbPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs")
            .fetch_one(pool)
            .await
    }

    /// Number of completed jobs (the "total downloads processed" figure).
    pub async fn count_completed(pool: &DbPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs WHERE status = $1")
            .bind(JobStatus::Completed.id())
            .fetch_one(pool)
            .await
    }

    /// Job counts broken down by status.
    pub async fn status_counts(pool: &DbPool) -> Result<StatusCounts, sqlx::Error> {
        let rows: Vec<(StatusId, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM jobs GROUP BY status")
                .fetch_all(pool)
                .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            match JobStatus::from_id(status) {
                Some(JobStatus::Pending) => counts.pending = count,
                Some(JobStatus::InProgress) => counts.in_progress = count,
                Some(JobStatus::Completed) => counts.completed = count,
                Some(JobStatus::Failed) => counts.failed = count,
                None => tracing::warn!(status, count, "Unknown job status in jobs table"),
            }
        }
        Ok(counts)
    }
}
