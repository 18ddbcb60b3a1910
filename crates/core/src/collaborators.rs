//! Seams to the outside world consumed by the worker loop.
//!
//! The core never knows how media is fetched or how a requester is reached;
//! it only sees these traits. Implementations live in `reelq-fetch` and
//! `reelq-notify`, and tests substitute recording stubs.

use async_trait::async_trait;

use crate::media::MediaFile;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a fetch produced no artifact.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The remote resource is private, deleted, or otherwise not served.
    #[error("Media unavailable: {0}")]
    Unavailable(String),

    /// Any other failure (network, protocol, local I/O).
    #[error("Fetch failed: {0}")]
    Other(String),
}

/// Why a message or artifact could not be delivered to a requester.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The transport could not be reached.
    #[error("Delivery transport error: {0}")]
    Transport(String),

    /// The transport answered but refused the delivery.
    #[error("Delivery rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The artifact bytes could not be read.
    #[error("Failed to read media: {0}")]
    Io(#[from] std::io::Error),
}

impl DeliveryError {
    /// Whether another attempt could succeed: transport failures and 5xx
    /// answers. A 4xx refusal or unreadable media will fail the same way.
    pub fn is_transient(&self) -> bool {
        match self {
            DeliveryError::Transport(_) => true,
            DeliveryError::Rejected { status, .. } => *status >= 500,
            DeliveryError::Io(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Resolves a locator to a media artifact.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, locator: &str) -> Result<MediaFile, FetchError>;
}

/// Sends text updates to a requester.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a standalone text message.
    async fn notify(&self, requester_id: &str, message: &str) -> Result<(), DeliveryError>;

    /// Report cosmetic progress for a job. Callers treat failures as
    /// non-fatal.
    async fn progress(
        &self,
        requester_id: &str,
        job_id: DbId,
        percent: u8,
    ) -> Result<(), DeliveryError>;
}

/// Delivers the final artifact to a requester.
#[async_trait]
pub trait MediaDelivery: Send + Sync {
    async fn deliver(
        &self,
        requester_id: &str,
        media: &MediaFile,
        caption: &str,
    ) -> Result<(), DeliveryError>;
}
