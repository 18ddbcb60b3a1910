//! Status helper enum mapping to the `jobs.status` INTEGER column.
//!
//! Discriminants are the stored values; the column's CHECK constraint pins
//! the domain to exactly these four.

/// Status ID type matching the INTEGER column.
pub type StatusId = i16;

/// Job lifecycle status.
///
/// Transitions are monotone: `Pending -> InProgress -> {Completed, Failed}`.
/// The only way back to `Pending` is orphan recovery by a worker process.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending = 1,
    InProgress = 2,
    Completed = 3,
    Failed = 4,
}

impl JobStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Look up a status by its database ID.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(JobStatus::Pending),
            2 => Some(JobStatus::InProgress),
            3 => Some(JobStatus::Completed),
            4 => Some(JobStatus::Failed),
            _ => None,
        }
    }

    /// Stable snake_case name used in API payloads and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl From<JobStatus> for StatusId {
    fn from(value: JobStatus) -> Self {
        value as StatusId
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for status in [
            JobStatus::Pending,
            JobStatus::InProgress,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert_eq!(JobStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(JobStatus::from_id(0), None);
        assert_eq!(JobStatus::from_id(5), None);
    }
}
