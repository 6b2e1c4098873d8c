//! Job lifecycle phase (tagged union) and its flat status view.

use std::fmt;

use crate::report::JobError;

/// Flat job status, derived from `JobPhase`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Idle,
    Queued,
    Uploading,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Queued => "queued",
            JobStatus::Uploading => "uploading",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// `Completed` or `Failed`: the job will not change again without an explicit retry.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Output of one successfully processed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    /// Input size in bytes as reported by the server.
    pub original_size: u64,
    /// Output size in bytes.
    pub output_size: u64,
    /// Human-readable reduction ratio, e.g. `"42.10%"`.
    pub reduction_ratio: String,
    /// URL or path of the produced artifact.
    pub locator: String,
    /// File name for the artifact when saved or bundled: `<source stem>-compressed.pdf`.
    pub output_name: String,
    /// Name the server stored the artifact under, if it reported one.
    pub stored_name: Option<String>,
}

/// Job lifecycle. Progress lives only in the phases where it means something.
#[derive(Debug, Clone, PartialEq)]
pub enum JobPhase {
    Idle,
    Queued,
    Uploading { progress: u8 },
    Processing { progress: u8 },
    Completed(JobResult),
    /// `progress` is the last value observed before the failure.
    Failed { error: JobError, progress: u8 },
}

impl JobPhase {
    pub fn status(&self) -> JobStatus {
        match self {
            JobPhase::Idle => JobStatus::Idle,
            JobPhase::Queued => JobStatus::Queued,
            JobPhase::Uploading { .. } => JobStatus::Uploading,
            JobPhase::Processing { .. } => JobStatus::Processing,
            JobPhase::Completed(_) => JobStatus::Completed,
            JobPhase::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn progress(&self) -> u8 {
        match self {
            JobPhase::Idle | JobPhase::Queued => 0,
            JobPhase::Uploading { progress } | JobPhase::Processing { progress } => *progress,
            JobPhase::Completed(_) => 100,
            JobPhase::Failed { progress, .. } => *progress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    pub fn result(&self) -> Option<&JobResult> {
        match self {
            JobPhase::Completed(r) => Some(r),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&JobError> {
        match self {
            JobPhase::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}
