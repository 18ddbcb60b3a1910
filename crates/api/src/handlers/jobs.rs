//! Handlers for the `/jobs` resource.
//!
//! Every endpoint requires a [`Requester`]. Requesters see only their own
//! jobs; admins may fetch any single job by id.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use reelq_core::error::CoreError;
use reelq_core::messages;
use reelq_core::types::DbId;
use reelq_db::models::job::{Job, JobListQuery};
use reelq_db::models::status::JobStatus;
use reelq_db::repositories::JobRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::identity::Requester;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/jobs`.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitJobRequest {
    #[validate(length(min = 1, max = 2048, message = "link must be 1-2048 characters"))]
    pub link: String,
}

/// Acknowledgement for an accepted submission.
#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: DbId,
    pub status: &'static str,
    pub message: &'static str,
}

/// A job as returned by the API, with its status name alongside the id.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: Job,
    pub status_name: &'static str,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let status_name = job.job_status().map_or("unknown", JobStatus::as_str);
        Self { job, status_name }
    }
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Admit a link into the queue. Returns 201 with the new job id, or a 4xx
/// describing why the dispatcher refused it.
pub async fn submit_job(
    requester: Requester,
    State(state): State<AppState>,
    Json(input): Json<SubmitJobRequest>,
) -> AppResult<impl IntoResponse> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;

    let job_id = state
        .dispatcher
        .submit(&requester.id, &input.link, Utc::now())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SubmitJobResponse {
                job_id,
                status: JobStatus::Pending.as_str(),
                message: messages::MSG_QUEUED,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
///
/// The caller's jobs, newest first. Supports an optional `limit`.
pub async fn list_jobs(
    requester: Requester,
    State(state): State<AppState>,
    Query(params): Query<JobListQuery>,
) -> AppResult<impl IntoResponse> {
    let jobs = JobRepo::list_by_requester(&state.pool, &requester.id, &params).await?;
    let data: Vec<JobResponse> = jobs.into_iter().map(JobResponse::from).collect();
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{id}
///
/// Returns 404 if the job does not exist, 403 if it belongs to someone else
/// and the caller is not an admin.
pub async fn get_job(
    requester: Requester,
    State(state): State<AppState>,
    Path(job_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let job = JobRepo::find_by_id(&state.pool, job_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;

    if job.requester_id != requester.id && !requester.is_admin {
        return Err(AppError::Core(CoreError::Forbidden(
            "Cannot view another requester's job".into(),
        )));
    }

    Ok(Json(DataResponse {
        data: JobResponse::from(job),
    }))
}
