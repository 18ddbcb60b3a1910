//! Tracing-only delivery channel.

use async_trait::async_trait;
use reelq_core::collaborators::{DeliveryError, MediaDelivery, Notifier};
use reelq_core::media::MediaFile;
use reelq_core::types::DbId;

/// Writes every message and delivery to the log instead of a transport.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, requester_id: &str, message: &str) -> Result<(), DeliveryError> {
        tracing::info!(requester_id, message, "Notify");
        Ok(())
    }

    async fn progress(
        &self,
        requester_id: &str,
        job_id: DbId,
        percent: u8,
    ) -> Result<(), DeliveryError> {
        tracing::debug!(requester_id, job_id, percent, "Progress");
        Ok(())
    }
}

#[async_trait]
impl MediaDelivery for LogNotifier {
    async fn deliver(
        &self,
        requester_id: &str,
        media: &MediaFile,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        let bytes = media.source.read().await?;
        tracing::info!(
            requester_id,
            kind = %media.kind,
            size = bytes.len(),
            caption,
            "Deliver media",
        );
        Ok(())
    }
}
