//! The consumer side of the job queue.
//!
//! A [`WorkerPool`] runs a configurable number of [`WorkerLoop`]s. Each loop
//! claims one job at a time from the store, fetches its media while sending
//! cosmetic progress, delivers the artifact and records a terminal status.
//! Claims are exclusive at the store level, so loops never coordinate with
//! each other directly.

pub mod config;
pub mod failure;
pub mod pool;
pub mod worker;

use std::sync::Arc;

use reelq_core::collaborators::{MediaDelivery, MediaFetcher, Notifier};

pub use config::{WorkerConfig, WorkerSettings};
pub use failure::JobFailure;
pub use pool::{recover_orphans, WorkerPool};
pub use worker::{JobOutcome, WorkerLoop};

/// External collaborators shared by every worker loop.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn MediaFetcher>,
    pub notifier: Arc<dyn Notifier>,
    pub delivery: Arc<dyn MediaDelivery>,
}
