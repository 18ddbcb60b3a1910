//! HTTP client for a media gateway.
//!
//! `GET {endpoint}/{locator}` is expected to answer with the media bytes and
//! a `video/*` or `image/*` content type. Access-denied and not-found style
//! statuses mean the media is private or gone.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reelq_core::collaborators::{FetchError, MediaFetcher};
use reelq_core::media::{MediaFile, MediaKind, MediaSource, ScratchFile};
use reqwest::StatusCode;

/// HTTP request timeout for one fetch (media can be large).
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Statuses that mean "private, deleted or never existed".
const UNAVAILABLE_STATUSES: [StatusCode; 5] = [
    StatusCode::UNAUTHORIZED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::GONE,
    StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS,
];

/// Fetches media from an HTTP gateway into scratch files.
pub struct HttpFetcher {
    client: reqwest::Client,
    endpoint: String,
    scratch_dir: PathBuf,
    sequence: AtomicU64,
}

impl HttpFetcher {
    /// Create a fetcher for the gateway at `endpoint`, staging files under
    /// `scratch_dir`.
    pub fn new(
        endpoint: impl Into<String>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FetchError::Other(format!("HTTP client setup failed: {e}")))?;
        Ok(Self::with_client(client, endpoint, scratch_dir))
    }

    /// Create a fetcher reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            scratch_dir: scratch_dir.into(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Scratch path for one fetch. The sequence number keeps two concurrent
    /// fetches of the same locator apart.
    fn scratch_path(&self, locator: &str, kind: MediaKind) -> PathBuf {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        self.scratch_dir
            .join(format!("{}-{seq}.{}", file_stem(locator), kind.extension()))
    }
}

/// Reduce a locator to characters that are safe in a file name.
fn file_stem(locator: &str) -> String {
    locator
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl MediaFetcher for HttpFetcher {
    async fn fetch(&self, locator: &str) -> Result<MediaFile, FetchError> {
        let url = format!("{}/{locator}", self.endpoint);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Other(format!("Request to {url} failed: {e}")))?;

        let status = response.status();
        if UNAVAILABLE_STATUSES.contains(&status) {
            return Err(FetchError::Unavailable(format!("{locator}: gateway returned {status}")));
        }
        if !status.is_success() {
            return Err(FetchError::Other(format!("{locator}: gateway returned {status}")));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let kind = MediaKind::from_content_type(&content_type).ok_or_else(|| {
            FetchError::Other(format!("{locator}: unsupported content type '{content_type}'"))
        })?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Other(format!("{locator}: reading body failed: {e}")))?;

        let path = self.scratch_path(locator, kind);
        let file = ScratchFile::create(&path, &bytes).await.map_err(|e| {
            FetchError::Other(format!("{locator}: staging to {} failed: {e}", path.display()))
        })?;

        tracing::debug!(
            locator,
            kind = %kind,
            size = bytes.len(),
            path = %path.display(),
            "Media fetched",
        );

        Ok(MediaFile::new(kind, MediaSource::Scratch(file)))
    }
}
