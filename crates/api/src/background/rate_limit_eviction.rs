//! Periodic eviction of idle identities from the admission rate limiter.
//!
//! Without it the limiter keeps one record per requester ever seen.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reelq_pipeline::Dispatcher;
use tokio_util::sync::CancellationToken;

/// Run the eviction loop every `interval` until `cancel` is triggered.
pub async fn run(dispatcher: Arc<Dispatcher>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Rate limiter eviction started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Rate limiter eviction stopping");
                break;
            }
            _ = ticker.tick() => {
                let evicted = dispatcher.limiter().forget_expired(Utc::now());
                if evicted > 0 {
                    tracing::debug!(
                        evicted,
                        tracked = dispatcher.limiter().tracked(),
                        "Evicted idle rate-limit records",
                    );
                }
            }
        }
    }
}
