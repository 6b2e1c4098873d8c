//! Store errors for rejected updates and retries.

use crate::job::{JobId, JobStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("job {0} not found")]
    NotFound(JobId),
    /// Terminal jobs only change through `retry`.
    #[error("job {id} is {status} and cannot change without a retry")]
    Terminal { id: JobId, status: JobStatus },
    #[error("job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
    #[error("job {id} is {status}; only failed jobs can be retried")]
    NotRetryable { id: JobId, status: JobStatus },
    /// The claim was handed out for an earlier admission or run of this job.
    #[error("job {0}: claim no longer held")]
    Stale(JobId),
}
