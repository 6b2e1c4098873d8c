//! Batch scheduler: runs the runnable jobs of a batch under one policy.
//!
//! `execute` resolves only after every job it started is terminal. A
//! failed job never aborts the batch under either policy.

mod parallel;
mod progress;
mod sequential;

pub use parallel::run_parallel;
pub use progress::{overall_progress, JobEvent};
pub use sequential::run_sequential;

use std::str::FromStr;

use crate::job::JobStatus;
use crate::report::{ErrorKind, JobError};
use crate::runner::RunContext;
use crate::store::{Claim, JobUpdate};

/// Execution policy, chosen per `execute` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Up to `max_parallel` jobs in flight at once.
    #[default]
    Parallel,
    /// One job at a time, in batch order.
    Sequential,
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parallel" => Ok(Policy::Parallel),
            "sequential" => Ok(Policy::Sequential),
            other => Err(format!("invalid policy '{other}' (expected parallel or sequential)")),
        }
    }
}

/// Counts for one `execute` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Jobs selected and started.
    pub ran: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Claim every idle job for this run, in batch order. Jobs queued or in
/// flight under another run are theirs; completed and failed jobs are left
/// alone.
fn select(ctx: &RunContext) -> Vec<Claim> {
    ctx.store
        .all()
        .into_iter()
        .filter(|job| job.status() == JobStatus::Idle)
        .filter_map(|job| ctx.claim(&job.id))
        .collect()
}

/// Any selected job still in flight after its task ended died with its
/// task; settle it so the batch is never left hanging. Jobs removed or
/// re-admitted meanwhile are no longer ours and are left alone.
fn sweep(ctx: &RunContext, selected: &[Claim]) {
    for claim in selected {
        let Some(job) = ctx.store.get(claim.id()) else {
            continue;
        };
        if job.phase.is_terminal() {
            continue;
        }
        let aborted = JobError::new(ErrorKind::Network, "job task aborted");
        if ctx.record(claim, JobUpdate::Failed(aborted)).is_some() {
            tracing::warn!(job = %claim.id(), status = %job.status(), "job task ended early");
        }
    }
}

/// Run every idle job under `policy` and wait until all of them settle.
/// Jobs another concurrent `execute` already claimed are skipped.
pub async fn execute(ctx: RunContext, policy: Policy, max_parallel: usize) -> RunOutcome {
    let selected = select(&ctx);
    if selected.is_empty() {
        tracing::info!("nothing to run");
        return RunOutcome::default();
    }
    tracing::info!(jobs = selected.len(), ?policy, "batch run started");

    match policy {
        Policy::Parallel => run_parallel(&ctx, &selected, max_parallel).await,
        Policy::Sequential => run_sequential(&ctx, &selected).await,
    }
    sweep(&ctx, &selected);

    let mut outcome = RunOutcome {
        ran: selected.len(),
        ..RunOutcome::default()
    };
    for claim in &selected {
        match ctx.store.get(claim.id()).map(|j| j.status()) {
            Some(JobStatus::Completed) => outcome.completed += 1,
            Some(JobStatus::Failed) => outcome.failed += 1,
            _ => {}
        }
    }
    tracing::info!(
        ran = outcome.ran,
        completed = outcome.completed,
        failed = outcome.failed,
        "batch run finished"
    );
    outcome
}
