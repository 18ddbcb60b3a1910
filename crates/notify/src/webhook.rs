//! HTTP gateway delivery with exponential-backoff retry.
//!
//! [`WebhookNotifier`] talks to a chat gateway exposing three endpoints
//! under a base URL:
//!
//! | Endpoint         | Body                                                   |
//! |------------------|--------------------------------------------------------|
//! | `POST /messages` | JSON `{ requester_id, text }`                          |
//! | `POST /progress` | JSON `{ requester_id, job_id, percent, text }`         |
//! | `POST /media`    | multipart: `requester_id`, `kind`, `caption`, `file`   |
//!
//! Messages and media are retried with backoff (1 s, 2 s, 4 s by default)
//! when the gateway is unreachable or answers 5xx. A 4xx answer is final.
//! Progress is sent once; a lost tick is not worth delaying the job.

use std::time::Duration;

use async_trait::async_trait;
use reelq_core::collaborators::{DeliveryError, MediaDelivery, Notifier};
use reelq_core::media::{MediaFile, MediaKind};
use reelq_core::messages;
use reelq_core::types::DbId;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

/// Default retry delays (exponential backoff: 1s, 2s, 4s).
const DEFAULT_RETRY_DELAYS: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    requester_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct ProgressPayload<'a> {
    requester_id: &'a str,
    job_id: DbId,
    percent: u8,
    text: String,
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// Delivers notifications and media to an HTTP chat gateway.
pub struct WebhookNotifier {
    client: reqwest::Client,
    base_url: String,
    retry_delays: Vec<Duration>,
}

impl WebhookNotifier {
    /// Create a notifier for the gateway at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a notifier reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry_delays: DEFAULT_RETRY_DELAYS.to_vec(),
        }
    }

    /// Override the backoff schedule. An empty schedule means a single
    /// attempt.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }

    /// Run `attempt` until it succeeds, fails permanently, or the backoff
    /// schedule is exhausted.
    async fn with_retry<F, Fut>(&self, what: &str, mut attempt: F) -> Result<(), DeliveryError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<(), DeliveryError>>,
    {
        let mut delays = self.retry_delays.iter();
        let mut attempt_no = 1u32;
        loop {
            match attempt().await {
                Ok(()) => return Ok(()),
                Err(e) if !e.is_transient() => {
                    tracing::error!(attempts = attempt_no, error = %e, "{what} delivery refused");
                    return Err(e);
                }
                Err(e) => match delays.next() {
                    Some(delay) => {
                        tracing::warn!(
                            attempt = attempt_no,
                            retry_in_ms = delay.as_millis() as u64,
                            error = %e,
                            "{what} delivery failed, retrying",
                        );
                        tokio::time::sleep(*delay).await;
                        attempt_no += 1;
                    }
                    None => {
                        tracing::error!(attempts = attempt_no, error = %e, "{what} delivery failed");
                        return Err(e);
                    }
                },
            }
        }
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url(path))
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        check_status(response).await
    }

    async fn post_media(
        &self,
        requester_id: &str,
        kind: MediaKind,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        let mime = match kind {
            MediaKind::Video => "video/mp4",
            MediaKind::Image => "image/jpeg",
        };
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let form = Form::new()
            .text("requester_id", requester_id.to_string())
            .text("kind", kind.as_str())
            .text("caption", caption.to_string())
            .part("file", part);

        let response = self
            .client
            .post(self.url("media"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        check_status(response).await
    }
}

/// Map a non-2xx response to [`DeliveryError::Rejected`].
async fn check_status(response: reqwest::Response) -> Result<(), DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(DeliveryError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, requester_id: &str, message: &str) -> Result<(), DeliveryError> {
        let payload = MessagePayload {
            requester_id,
            text: message,
        };
        self.with_retry("Message", || self.post_json("messages", &payload))
            .await
    }

    async fn progress(
        &self,
        requester_id: &str,
        job_id: DbId,
        percent: u8,
    ) -> Result<(), DeliveryError> {
        let payload = ProgressPayload {
            requester_id,
            job_id,
            percent,
            text: messages::progress(percent),
        };
        self.post_json("progress", &payload).await
    }
}

#[async_trait]
impl MediaDelivery for WebhookNotifier {
    async fn deliver(
        &self,
        requester_id: &str,
        media: &MediaFile,
        caption: &str,
    ) -> Result<(), DeliveryError> {
        let bytes = media.source.read().await?;
        let file_name = media.source.file_name(media.kind);
        self.with_retry("Media", || {
            self.post_media(requester_id, media.kind, &file_name, bytes.clone(), caption)
        })
        .await
    }
}
