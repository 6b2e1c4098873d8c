//! Bounded concurrent execution.
//!
//! Keeps up to `max_parallel` jobs running at once; when one finishes, the
//! next selected job is started until none are left.

use crate::runner::{run_job, RunContext};
use crate::store::Claim;

pub async fn run_parallel(ctx: &RunContext, selected: &[Claim], max_parallel: usize) {
    let max_parallel = max_parallel.max(1);
    let mut pending = selected.iter();
    let mut join_set = tokio::task::JoinSet::new();

    loop {
        while join_set.len() < max_parallel {
            let Some(claim) = pending.next() else {
                break;
            };
            join_set.spawn(run_job(ctx.clone(), claim.clone()));
        }

        let Some(res) = join_set.join_next().await else {
            break;
        };
        if let Err(e) = res {
            // The job itself is settled by the post-run sweep.
            tracing::warn!("job task join: {}", e);
        }
    }
}
