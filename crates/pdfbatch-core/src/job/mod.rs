//! Job model: one file's remote-processing lifecycle within a batch.
//!
//! A job's terminal payload is a tagged variant (`JobPhase`), so a job can
//! never carry both a result and an error.

mod params;
mod payload;
mod phase;

pub use params::{Quality, SubmitParams};
pub use payload::Payload;
pub use phase::{JobPhase, JobResult, JobStatus};

use std::fmt;

use crate::report::ValidationError;

/// Stable job identifier: the source file's name, unique within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One job record as held by the store. Cloning is cheap (payload is shared).
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub payload: Payload,
    pub phase: JobPhase,
}

impl Job {
    /// Create an idle job whose id is the payload's file name.
    pub fn new(payload: Payload) -> Result<Self, ValidationError> {
        let name = payload
            .file_name()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ValidationError::InvalidName(payload.describe()))?;
        Ok(Self {
            id: JobId::new(name),
            payload,
            phase: JobPhase::Idle,
        })
    }

    pub fn status(&self) -> JobStatus {
        self.phase.status()
    }

    pub fn progress(&self) -> u8 {
        self.phase.progress()
    }
}
