//! Status updates and the rules for applying them to a job record.

use crate::job::{Job, JobPhase, JobResult, JobStatus};
use crate::report::JobError;

use super::error::StoreError;

/// A requested change to one job's status.
#[derive(Debug, Clone, PartialEq)]
pub enum JobUpdate {
    /// Selected for a run. Only valid from `Idle`.
    Queued,
    /// Upload begins: `Queued` to `Uploading(0)`.
    Start,
    Uploading(u8),
    Processing(u8),
    Completed(JobResult),
    Failed(JobError),
}

impl JobUpdate {
    fn target(&self) -> JobStatus {
        match self {
            JobUpdate::Queued => JobStatus::Queued,
            JobUpdate::Start | JobUpdate::Uploading(_) => JobStatus::Uploading,
            JobUpdate::Processing(_) => JobStatus::Processing,
            JobUpdate::Completed(_) => JobStatus::Completed,
            JobUpdate::Failed(_) => JobStatus::Failed,
        }
    }
}

/// Applies `change` to `job`.
///
/// - Terminal jobs reject every update (only `retry` leaves a terminal state).
/// - `Queued` only from `Idle`; `Start` only from `Queued`.
/// - Progress and `Completed` only once started. In-flight progress never
///   decreases and is capped at 100; a late `Uploading` on a job already
///   `Processing` only raises progress.
/// - `Failed` is accepted from any live state and keeps the last progress.
pub(super) fn apply(job: &mut Job, change: JobUpdate) -> Result<(), StoreError> {
    let current = job.status();
    if current.is_terminal() {
        return Err(StoreError::Terminal {
            id: job.id.clone(),
            status: current,
        });
    }
    let started = matches!(current, JobStatus::Uploading | JobStatus::Processing);
    let allowed = match change {
        JobUpdate::Queued => current == JobStatus::Idle,
        JobUpdate::Start => current == JobStatus::Queued,
        JobUpdate::Uploading(_) | JobUpdate::Processing(_) | JobUpdate::Completed(_) => started,
        JobUpdate::Failed(_) => true,
    };
    if !allowed {
        return Err(StoreError::InvalidTransition {
            id: job.id.clone(),
            from: current,
            to: change.target(),
        });
    }

    let prev = job.phase.progress();
    let next = match change {
        JobUpdate::Queued => JobPhase::Queued,
        JobUpdate::Start => JobPhase::Uploading { progress: 0 },
        JobUpdate::Uploading(p) => {
            let progress = p.min(100).max(prev);
            if current == JobStatus::Processing {
                JobPhase::Processing { progress }
            } else {
                JobPhase::Uploading { progress }
            }
        }
        JobUpdate::Processing(p) => JobPhase::Processing {
            progress: p.min(100).max(prev),
        },
        JobUpdate::Completed(result) => JobPhase::Completed(result),
        JobUpdate::Failed(error) => JobPhase::Failed {
            error,
            progress: prev,
        },
    };
    if current != next.status() {
        tracing::debug!(
            job = %job.id,
            from = current.as_str(),
            to = next.status().as_str(),
            "job status change"
        );
    }
    job.phase = next;
    Ok(())
}
