use std::path::PathBuf;
use std::time::Duration;

use reelq_core::env;
use reelq_core::error::CoreError;

/// Default database location.
const DEFAULT_DATABASE_URL: &str = "sqlite://reelq.db";

/// Timing and alerting knobs used by each [`WorkerLoop`](crate::WorkerLoop).
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Sleep between polls when the queue is empty.
    pub poll_interval: Duration,
    /// Pause after finishing a job before claiming the next.
    pub job_pause: Duration,
    /// Cadence of progress ticks (and heartbeats) while a job runs.
    pub progress_tick: Duration,
    /// Identities alerted when a job fails for an internal reason.
    pub admin_alert_ids: Vec<String>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            job_pause: Duration::from_secs(2),
            progress_tick: Duration::from_secs(1),
            admin_alert_ids: Vec::new(),
        }
    }
}

/// Worker process configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// SQLite URL of the job store.
    pub database_url: String,
    /// Number of concurrent worker loops.
    pub worker_count: usize,
    /// `InProgress` jobs untouched for longer than this are requeued, at
    /// startup and by the periodic sweep.
    pub orphan_grace: Duration,
    /// Cadence of the orphan sweep; zero disables it.
    pub orphan_sweep_interval: Duration,
    /// How long shutdown waits for in-flight jobs.
    pub shutdown_timeout: Duration,
    /// Base URL of the media gateway.
    pub fetch_endpoint: String,
    /// Directory for transient media files.
    pub scratch_dir: PathBuf,
    /// Base URL of the chat gateway; `None` logs notifications instead.
    pub notify_webhook_url: Option<String>,
    /// Per-loop settings.
    pub settings: WorkerSettings,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default              |
    /// |-------------------------|----------------------|
    /// | `DATABASE_URL`          | `sqlite://reelq.db`  |
    /// | `WORKER_COUNT`          | `1`                  |
    /// | `POLL_INTERVAL_MS`      | `5000`               |
    /// | `JOB_PAUSE_MS`          | `2000`               |
    /// | `PROGRESS_TICK_MS`      | `1000`               |
    /// | `ORPHAN_GRACE_SECS`     | `300`                |
    /// | `ORPHAN_SWEEP_SECS`     | `60`                 |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `60`                 |
    /// | `FETCH_ENDPOINT`        | required             |
    /// | `SCRATCH_DIR`           | `downloads`          |
    /// | `NOTIFY_WEBHOOK_URL`    | unset (log only)     |
    /// | `ADMIN_ALERT_IDS`       | empty                |
    pub fn from_env() -> Result<Self, CoreError> {
        let worker_count: usize = env::parse_or("WORKER_COUNT", 1)?;
        if worker_count == 0 {
            return Err(CoreError::Config("WORKER_COUNT must be at least 1".into()));
        }

        let fetch_endpoint = std::env::var("FETCH_ENDPOINT")
            .map_err(|_| CoreError::Config("FETCH_ENDPOINT must be set".into()))?;

        let settings = WorkerSettings {
            poll_interval: Duration::from_millis(env::parse_or("POLL_INTERVAL_MS", 5_000)?),
            job_pause: Duration::from_millis(env::parse_or("JOB_PAUSE_MS", 2_000)?),
            progress_tick: Duration::from_millis(env::parse_or("PROGRESS_TICK_MS", 1_000)?),
            admin_alert_ids: env::list_or("ADMIN_ALERT_IDS", &[]),
        };
        if settings.progress_tick.is_zero() {
            return Err(CoreError::Config("PROGRESS_TICK_MS must be positive".into()));
        }

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.into()),
            worker_count,
            orphan_grace: Duration::from_secs(env::parse_or("ORPHAN_GRACE_SECS", 300)?),
            orphan_sweep_interval: Duration::from_secs(env::parse_or("ORPHAN_SWEEP_SECS", 60)?),
            shutdown_timeout: Duration::from_secs(env::parse_or("SHUTDOWN_TIMEOUT_SECS", 60)?),
            fetch_endpoint,
            scratch_dir: PathBuf::from(
                std::env::var("SCRATCH_DIR").unwrap_or_else(|_| "downloads".into()),
            ),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            settings,
        })
    }
}
