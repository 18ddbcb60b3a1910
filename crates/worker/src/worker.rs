//! A single consumer loop over the job store.
//!
//! Per iteration: claim the oldest pending job, send an initial progress
//! tick, then fetch and deliver while a ticker keeps the job's heartbeat
//! fresh, mark completed and notify. Any failure, including a panic, ends
//! in `mark_failed` plus a best-effort failure notice; the loop itself never
//! stops on a job's account.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use reelq_core::collaborators::Notifier;
use reelq_core::messages;
use reelq_core::types::DbId;
use reelq_db::models::job::Job;
use reelq_db::repositories::JobRepo;
use reelq_db::DbPool;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::Instrument;

use crate::config::WorkerSettings;
use crate::failure::JobFailure;
use crate::Collaborators;

/// Cosmetic progress never claims more than this before the job ends.
const MAX_TICK_PERCENT: u8 = 90;

/// Progress added per tick.
const TICK_STEP: u8 = 10;

/// How one claimed job ended.
#[derive(Debug)]
pub enum JobOutcome {
    Completed { job_id: DbId },
    Failed { job_id: DbId, failure: JobFailure },
    /// The job was requeued and claimed elsewhere before this worker could
    /// finish it. Nothing was recorded and the requester was not told.
    ClaimLost { job_id: DbId },
}

impl JobOutcome {
    pub fn job_id(&self) -> DbId {
        match self {
            JobOutcome::Completed { job_id }
            | JobOutcome::Failed { job_id, .. }
            | JobOutcome::ClaimLost { job_id } => *job_id,
        }
    }
}

/// One long-lived consumer.
pub struct WorkerLoop {
    id: String,
    pool: DbPool,
    collaborators: Collaborators,
    settings: WorkerSettings,
}

impl WorkerLoop {
    pub fn new(
        id: impl Into<String>,
        pool: DbPool,
        collaborators: Collaborators,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            id: id.into(),
            pool,
            collaborators,
            settings,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation is observed between jobs: a job already claimed is
    /// always driven to a terminal state first.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            worker_id = %self.id,
            poll_interval_ms = self.settings.poll_interval.as_millis() as u64,
            "Worker started",
        );

        while !cancel.is_cancelled() {
            let pause = match self.run_once().await {
                Ok(Some(_)) => self.settings.job_pause,
                Ok(None) => self.settings.poll_interval,
                Err(e) => {
                    tracing::error!(worker_id = %self.id, error = %e, "Failed to claim next job");
                    self.settings.poll_interval
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!(worker_id = %self.id, "Worker stopped");
    }

    /// Claim and process at most one job.
    ///
    /// Returns `Ok(None)` when the queue is empty. Only a failed claim is an
    /// error; everything after the claim is folded into the outcome.
    pub async fn run_once(&self) -> Result<Option<JobOutcome>, sqlx::Error> {
        let Some(job) = JobRepo::claim_next(&self.pool, &self.id).await? else {
            return Ok(None);
        };

        let span = tracing::info_span!("job", job_id = job.id, worker_id = %self.id);
        Ok(Some(self.process(job).instrument(span).await))
    }

    async fn process(&self, job: Job) -> JobOutcome {
        tracing::info!(
            requester_id = %job.requester_id,
            locator = %job.locator,
            "Job claimed",
        );

        let result = AssertUnwindSafe(self.execute(&job))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(JobFailure::Internal(panic_message(panic.as_ref()))));

        match result {
            Ok(true) => {
                tracing::info!("Job completed");
                JobOutcome::Completed { job_id: job.id }
            }
            Ok(false) => JobOutcome::ClaimLost { job_id: job.id },
            Err(failure) => {
                self.fail(&job, &failure).await;
                JobOutcome::Failed {
                    job_id: job.id,
                    failure,
                }
            }
        }
    }

    /// Happy path of one job. The fetched artifact is dropped (and any
    /// scratch file removed) on every return path.
    ///
    /// Returns `Ok(false)` when the claim was lost before completion could
    /// be recorded.
    async fn execute(&self, job: &Job) -> Result<bool, JobFailure> {
        send_progress(
            self.collaborators.notifier.as_ref(),
            &self.pool,
            &self.id,
            &job.requester_id,
            job.id,
            0,
        )
        .await;

        let ticker = self.start_ticker(job);

        let media = self.collaborators.fetcher.fetch(&job.locator).await?;
        tracing::info!(kind = %media.kind, "Media fetched");

        self.collaborators
            .delivery
            .deliver(&job.requester_id, &media, media.kind.caption())
            .await?;
        drop(media);

        let completed = JobRepo::mark_completed(&self.pool, job.id, &self.id).await?;
        drop(ticker);

        if !completed {
            tracing::warn!("Job claim lost before completion, leaving it to its new holder");
            return Ok(false);
        }

        self.notify(&job.requester_id, messages::MSG_COMPLETED).await;
        Ok(true)
    }

    /// Spawn the progress ticker for `job`.
    ///
    /// Every tick sends a progress update and refreshes the heartbeat. The
    /// ticker is aborted when the returned handle is dropped, which
    /// `execute` does only once the job is terminal or has failed.
    fn start_ticker(&self, job: &Job) -> AbortOnDropHandle<()> {
        let notifier = Arc::clone(&self.collaborators.notifier);
        let pool = self.pool.clone();
        let worker_id = self.id.clone();
        let requester_id = job.requester_id.clone();
        let job_id = job.id;
        let tick = self.settings.progress_tick;

        let ticker = tokio::spawn(
            async move {
                let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                let mut percent = 0u8;
                loop {
                    interval.tick().await;
                    percent = next_percent(percent);
                    send_progress(
                        notifier.as_ref(),
                        &pool,
                        &worker_id,
                        &requester_id,
                        job_id,
                        percent,
                    )
                    .await;
                }
            }
            .in_current_span(),
        );
        AbortOnDropHandle::new(ticker)
    }

    /// Record the failure and tell the requester. Never fails itself.
    async fn fail(&self, job: &Job, failure: &JobFailure) {
        if failure.is_internal() {
            tracing::error!(error = %failure, "Job failed");
        } else {
            tracing::warn!(error = %failure, "Job failed");
        }

        match JobRepo::mark_failed(&self.pool, job.id, &self.id, &failure.to_string()).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Job claim lost before the failure could be recorded"),
            Err(e) => tracing::error!(error = %e, "Failed to mark job as failed"),
        }

        self.notify(&job.requester_id, failure.user_message()).await;

        if failure.is_internal() {
            for admin in &self.settings.admin_alert_ids {
                self.notify(admin, messages::MSG_ADMIN_ALERT).await;
            }
        }
    }

    /// Best-effort text notification.
    async fn notify(&self, requester_id: &str, message: &str) {
        if let Err(e) = self.collaborators.notifier.notify(requester_id, message).await {
            tracing::warn!(requester_id, error = %e, "Failed to send notification");
        }
    }
}

/// Best-effort progress tick: notify the requester and refresh the job's
/// heartbeat. Failures are logged and swallowed.
async fn send_progress(
    notifier: &dyn Notifier,
    pool: &DbPool,
    worker_id: &str,
    requester_id: &str,
    job_id: DbId,
    percent: u8,
) {
    if let Err(e) = notifier.progress(requester_id, job_id, percent).await {
        tracing::debug!(percent, error = %e, "Progress update failed");
    }
    match JobRepo::touch(pool, job_id, worker_id).await {
        Ok(true) => {}
        Ok(false) => tracing::debug!("Heartbeat skipped, job no longer held by this worker"),
        Err(e) => tracing::warn!(error = %e, "Failed to refresh job heartbeat"),
    }
}

fn next_percent(current: u8) -> u8 {
    current.saturating_add(TICK_STEP).min(MAX_TICK_PERCENT)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_string()
    }
}
