//! Request intake: authorize, validate, rate-limit, enqueue.
//!
//! Everything before the final insert is in-memory and synchronous; a
//! rejected request never creates a job.

use std::collections::HashSet;
use std::time::Duration;

use reelq_core::env;
use reelq_core::error::CoreError;
use reelq_core::locator::{LocatorGrammar, LocatorMatcher};
use reelq_core::messages;
use reelq_core::rate_limit::{RateLimiter, DEFAULT_COOLDOWN};
use reelq_core::types::{DbId, Timestamp};
use reelq_db::repositories::JobRepo;
use reelq_db::DbPool;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a submission was refused.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The requester is not on the configured allowlist.
    #[error("Requester '{0}' is not allowed to submit jobs")]
    NotAuthorized(String),

    /// The link does not match the locator grammar.
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// The requester is still inside its cooldown window.
    #[error("Rate limited: requester '{0}' must wait before submitting again")]
    RateLimited(String),

    /// The store could not record the job.
    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
}

impl SubmitError {
    /// Text to show the requester.
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmitError::NotAuthorized(_) => messages::MSG_NOT_AUTHORIZED,
            SubmitError::InvalidLocator(_) => messages::MSG_INVALID_LINK,
            SubmitError::RateLimited(_) => messages::MSG_RATE_LIMITED,
            SubmitError::Store(_) => messages::MSG_FAILED,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Settings for the [`Dispatcher`].
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Which links are accepted.
    pub grammar: LocatorGrammar,
    /// Minimum spacing between two admitted submissions of one requester.
    pub cooldown: Duration,
    /// When set, only these requesters may submit.
    pub allowed_requesters: Option<HashSet<String>>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            grammar: LocatorGrammar::default(),
            cooldown: DEFAULT_COOLDOWN,
            allowed_requesters: None,
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default          |
    /// |----------------------------|------------------|
    /// | `RATE_LIMIT_COOLDOWN_SECS` | `5`              |
    /// | `ALLOWED_REQUESTERS`       | unset (everyone) |
    ///
    /// Grammar variables are documented on [`LocatorGrammar::from_env`].
    pub fn from_env() -> Result<Self, CoreError> {
        let cooldown_secs = env::parse_or("RATE_LIMIT_COOLDOWN_SECS", DEFAULT_COOLDOWN.as_secs())?;
        let allowed_requesters = std::env::var("ALLOWED_REQUESTERS")
            .ok()
            .map(|raw| env::split_list(&raw).into_iter().collect::<HashSet<_>>())
            .filter(|set| !set.is_empty());

        Ok(Self {
            grammar: LocatorGrammar::from_env(),
            cooldown: Duration::from_secs(cooldown_secs),
            allowed_requesters,
        })
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Admits requests into the job store.
pub struct Dispatcher {
    pool: DbPool,
    matcher: LocatorMatcher,
    limiter: RateLimiter,
    allowed_requesters: Option<HashSet<String>>,
}

impl Dispatcher {
    /// Build a dispatcher, compiling the locator grammar up front.
    pub fn new(pool: DbPool, config: DispatcherConfig) -> Result<Self, CoreError> {
        Ok(Self {
            pool,
            matcher: config.grammar.compile()?,
            limiter: RateLimiter::new(config.cooldown),
            allowed_requesters: config.allowed_requesters,
        })
    }

    /// Submit `raw_link` on behalf of `requester_id` at time `now`.
    ///
    /// Order: allowlist, locator validation, rate-limit admission, enqueue.
    /// Validation runs before admission so a malformed link does not start
    /// the requester's cooldown, and an admission whose enqueue fails is
    /// revoked so the requester can retry at once.
    pub async fn submit(
        &self,
        requester_id: &str,
        raw_link: &str,
        now: Timestamp,
    ) -> Result<DbId, SubmitError> {
        if let Some(allowed) = &self.allowed_requesters {
            if !allowed.contains(requester_id) {
                tracing::info!(requester_id, "Submission from unauthorized requester");
                return Err(SubmitError::NotAuthorized(requester_id.to_string()));
            }
        }

        let link = raw_link.trim();
        let locator = self
            .matcher
            .extract(link)
            .ok_or_else(|| SubmitError::InvalidLocator(link.to_string()))?;

        if !self.limiter.admit(requester_id, now) {
            tracing::debug!(requester_id, "Submission rate limited");
            return Err(SubmitError::RateLimited(requester_id.to_string()));
        }

        let job = match JobRepo::enqueue(&self.pool, requester_id, link, &locator).await {
            Ok(job) => job,
            Err(e) => {
                self.limiter.revoke(requester_id, now);
                tracing::error!(requester_id, error = %e, "Failed to enqueue job");
                return Err(SubmitError::Store(e));
            }
        };

        tracing::info!(
            job_id = job.id,
            requester_id,
            locator = %job.locator,
            "Job enqueued",
        );

        Ok(job.id)
    }

    /// The rate limiter backing admission, for periodic eviction.
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}
