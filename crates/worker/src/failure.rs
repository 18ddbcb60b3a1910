//! Why a job ended in `Failed`.

use reelq_core::collaborators::{DeliveryError, FetchError};
use reelq_core::messages;

/// Terminal failure of one job.
///
/// The `Display` form is what gets stored in `jobs.error_message`; its
/// leading word identifies the category.
#[derive(Debug, thiserror::Error)]
pub enum JobFailure {
    /// The source is private or missing.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The fetch failed for any other reason.
    #[error("fetch: {0}")]
    Fetch(String),

    /// The artifact could not be delivered to the requester.
    #[error("delivery: {0}")]
    Delivery(#[from] DeliveryError),

    /// The store rejected a transition mid-job.
    #[error("store: {0}")]
    Store(#[from] sqlx::Error),

    /// Anything unanticipated, including panics inside the job.
    #[error("internal: {0}")]
    Internal(String),
}

impl From<FetchError> for JobFailure {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Unavailable(detail) => JobFailure::Unavailable(detail),
            FetchError::Other(detail) => JobFailure::Fetch(detail),
        }
    }
}

impl JobFailure {
    /// Text sent to the requester.
    pub fn user_message(&self) -> &'static str {
        match self {
            JobFailure::Unavailable(_) => messages::MSG_UNAVAILABLE,
            _ => messages::MSG_FAILED,
        }
    }

    /// Whether the failure points at a bug or infrastructure problem rather
    /// than at the media itself. Admins are alerted for these.
    pub fn is_internal(&self) -> bool {
        matches!(self, JobFailure::Store(_) | JobFailure::Internal(_))
    }
}
