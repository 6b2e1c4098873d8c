use std::fmt;

use crate::job::JobId;

/// Per-job error kind. Batch-level validation failures are `ValidationError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failed before any response was received.
    Network,
    /// Server answered with a non-success status not otherwise classified.
    Remote,
    /// Server answered with the reserved quota / balance status.
    Quota,
    /// Response received but not in the expected shape.
    Decode,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Network => "NetworkError",
            ErrorKind::Remote => "RemoteError",
            ErrorKind::Quota => "QuotaError",
            ErrorKind::Decode => "DecodeError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error recorded on a failed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobError {
    pub kind: ErrorKind,
    pub message: String,
}

impl JobError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// True when the UI should route to the balance / top-up flow instead of a generic retry.
    pub fn needs_top_up(&self) -> bool {
        self.kind == ErrorKind::Quota
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for JobError {}

/// Batch-level admission failure. Raised synchronously at submission; no job is created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no files submitted")]
    Empty,
    #[error("duplicate file in batch: {0}")]
    Duplicate(JobId),
    #[error("cannot derive a file name from {0}")]
    InvalidName(String),
}
