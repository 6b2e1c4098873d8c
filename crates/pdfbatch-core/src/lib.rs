pub mod config;
pub mod logging;

pub mod bundle;
pub mod checksum;
pub mod job;
pub mod naming;
pub mod report;
pub mod retry;
pub mod runner;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod summary;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use job::{Job, JobId, JobPhase, JobResult, JobStatus, Payload, Quality, SubmitParams};
pub use report::{ErrorKind, JobError, ValidationError};
pub use scheduler::{JobEvent, Policy, RunOutcome};
pub use session::{BatchHandle, Orchestrator};
pub use summary::BatchSummary;
