//! Orphan recovery and the set of concurrently running worker loops.

use std::time::Duration;

use chrono::Utc;
use reelq_db::repositories::JobRepo;
use reelq_db::DbPool;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::config::WorkerSettings;
use crate::worker::WorkerLoop;
use crate::Collaborators;

/// Return `InProgress` jobs whose last heartbeat is older than `grace` to
/// `Pending`.
///
/// Run at startup before any loop claims work, then periodically by the
/// pool's sweep (see [`WorkerPool::with_orphan_sweep`]). Live jobs keep
/// their heartbeat fresh until they are terminal, so only jobs whose holder
/// has died go back to the queue.
pub async fn recover_orphans(pool: &DbPool, grace: Duration) -> Result<u64, sqlx::Error> {
    let grace = chrono::Duration::from_std(grace).unwrap_or(chrono::Duration::MAX);
    let cutoff = Utc::now()
        .checked_sub_signed(grace)
        .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

    let requeued = JobRepo::requeue_stale(pool, cutoff).await?;
    if requeued > 0 {
        tracing::warn!(requeued, "Requeued orphaned in-progress jobs");
    } else {
        tracing::debug!("No orphaned jobs found");
    }
    Ok(requeued)
}

/// How often the pool looks for orphans and how old a heartbeat must be.
#[derive(Debug, Clone, Copy)]
struct OrphanSweep {
    grace: Duration,
    every: Duration,
}

/// A fixed number of [`WorkerLoop`]s sharing one store and one set of
/// collaborators, plus an optional periodic orphan sweep.
pub struct WorkerPool {
    pool: DbPool,
    loops: Vec<WorkerLoop>,
    sweep: Option<OrphanSweep>,
}

impl WorkerPool {
    /// Build `worker_count` loops with ids `{instance}-{n}`, where
    /// `instance` is a fresh UUID per process.
    pub fn new(
        pool: DbPool,
        collaborators: Collaborators,
        settings: WorkerSettings,
        worker_count: usize,
    ) -> Self {
        let instance = uuid::Uuid::now_v7();
        let loops = (1..=worker_count)
            .map(|n| {
                WorkerLoop::new(
                    format!("{instance}-{n}"),
                    pool.clone(),
                    collaborators.clone(),
                    settings.clone(),
                )
            })
            .collect();
        Self {
            pool,
            loops,
            sweep: None,
        }
    }

    /// Also requeue jobs whose heartbeat is older than `grace`, checking
    /// every `every` while the pool runs. A zero `every` disables the sweep.
    pub fn with_orphan_sweep(mut self, grace: Duration, every: Duration) -> Self {
        self.sweep = (!every.is_zero()).then_some(OrphanSweep { grace, every });
        self
    }

    /// Number of worker loops in the pool.
    pub fn worker_count(&self) -> usize {
        self.loops.len()
    }

    /// Run every loop until `cancel` fires and all of them have returned.
    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(workers = self.loops.len(), "Worker pool starting");

        let mut set = JoinSet::new();
        for worker in self.loops {
            let cancel = cancel.clone();
            set.spawn(async move { worker.run(cancel).await });
        }
        if let Some(sweep) = self.sweep {
            set.spawn(sweep_orphans(self.pool, sweep, cancel));
        }

        while let Some(result) = set.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "Worker task ended abnormally");
            }
        }

        tracing::info!("Worker pool stopped");
    }
}

/// Periodically requeue orphaned jobs until `cancel` fires.
async fn sweep_orphans(pool: DbPool, sweep: OrphanSweep, cancel: CancellationToken) {
    tracing::info!(
        grace_secs = sweep.grace.as_secs(),
        interval_ms = sweep.every.as_millis() as u64,
        "Orphan sweep started",
    );

    let mut interval = tokio::time::interval(sweep.every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately; startup recovery already covered it.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Orphan sweep stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = recover_orphans(&pool, sweep.grace).await {
                    tracing::error!(error = %e, "Orphan sweep failed");
                }
            }
        }
    }
}
