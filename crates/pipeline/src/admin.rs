//! Admin-only statistics over the job store.
//!
//! The completed-download total is derived from the `jobs` table on every
//! call; there is no separate counter to drift out of sync.

use std::collections::HashSet;

use reelq_db::models::job::StatusCounts;
use reelq_db::repositories::JobRepo;
use reelq_db::DbPool;

/// Why an admin query was refused or failed.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("Requester '{0}' is not an admin")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),
}

/// Identity check in front of the statistics queries.
#[derive(Debug, Clone, Default)]
pub struct AdminGate {
    admins: HashSet<String>,
}

impl AdminGate {
    pub fn new(admins: impl IntoIterator<Item = String>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn is_admin(&self, identity: &str) -> bool {
        self.admins.contains(identity)
    }

    /// Number of completed jobs, for admins only.
    pub async fn count_completed(&self, pool: &DbPool, identity: &str) -> Result<i64, AdminError> {
        self.authorize(identity)?;
        Ok(JobRepo::count_completed(pool).await?)
    }

    /// Per-status job counts, for admins only.
    pub async fn status_counts(
        &self,
        pool: &DbPool,
        identity: &str,
    ) -> Result<StatusCounts, AdminError> {
        self.authorize(identity)?;
        Ok(JobRepo::status_counts(pool).await?)
    }

    fn authorize(&self, identity: &str) -> Result<(), AdminError> {
        if self.is_admin(identity) {
            Ok(())
        } else {
            tracing::info!(identity, "Admin query refused");
            Err(AdminError::Forbidden(identity.to_string()))
        }
    }
}
