use std::sync::Arc;

use anyhow::Context;
use reelq_core::collaborators::{MediaDelivery, Notifier};
use reelq_fetch::HttpFetcher;
use reelq_notify::{LogNotifier, WebhookNotifier};
use reelq_worker::{recover_orphans, Collaborators, WorkerConfig, WorkerPool};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelq_worker=debug,reelq_fetch=debug,reelq_notify=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env().context("Invalid worker configuration")?;
    tracing::info!(
        workers = config.worker_count,
        fetch_endpoint = %config.fetch_endpoint,
        scratch_dir = %config.scratch_dir.display(),
        "Loaded worker configuration",
    );

    // --- Database ---
    let pool = reelq_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    reelq_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    reelq_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    recover_orphans(&pool, config.orphan_grace)
        .await
        .context("Failed to requeue orphaned jobs")?;

    // --- Collaborators ---
    let fetcher = HttpFetcher::new(&config.fetch_endpoint, &config.scratch_dir)
        .context("Failed to build media fetcher")?;

    let (notifier, delivery): (Arc<dyn Notifier>, Arc<dyn MediaDelivery>) =
        match &config.notify_webhook_url {
            Some(url) => {
                let webhook = Arc::new(
                    WebhookNotifier::new(url.as_str()).context("Failed to build notifier")?,
                );
                tracing::info!(%url, "Delivering through chat gateway");
                let notifier: Arc<dyn Notifier> = webhook.clone();
                let delivery: Arc<dyn MediaDelivery> = webhook;
                (notifier, delivery)
            }
            None => {
                tracing::warn!("NOTIFY_WEBHOOK_URL not set, notifications are only logged");
                let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);
                let delivery: Arc<dyn MediaDelivery> = Arc::new(LogNotifier);
                (notifier, delivery)
            }
        };

    let collaborators = Collaborators {
        fetcher: Arc::new(fetcher),
        notifier,
        delivery,
    };

    // --- Worker pool ---
    let cancel = CancellationToken::new();
    let workers = WorkerPool::new(
        pool.clone(),
        collaborators,
        config.settings.clone(),
        config.worker_count,
    )
    .with_orphan_sweep(config.orphan_grace, config.orphan_sweep_interval);
    let mut handle = tokio::spawn(workers.run(cancel.clone()));

    tokio::select! {
        () = shutdown_signal() => {}
        result = &mut handle => {
            tracing::error!(?result, "Worker pool exited unexpectedly");
            pool.close().await;
            anyhow::bail!("worker pool exited before shutdown was requested");
        }
    }

    // --- Post-shutdown cleanup ---
    cancel.cancel();
    tracing::info!(
        timeout_secs = config.shutdown_timeout.as_secs(),
        "Waiting for in-flight jobs",
    );
    if tokio::time::timeout(config.shutdown_timeout, handle).await.is_err() {
        tracing::warn!("Shutdown timed out, in-flight jobs will be requeued once their heartbeat expires");
    }

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
