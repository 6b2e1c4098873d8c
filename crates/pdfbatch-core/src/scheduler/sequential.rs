//! One job at a time, in batch order.

use crate::runner::{run_job, RunContext};
use crate::store::Claim;

pub async fn run_sequential(ctx: &RunContext, selected: &[Claim]) {
    for claim in selected {
        // Run on its own task so a panic is contained like under the parallel policy.
        let res = tokio::spawn(run_job(ctx.clone(), claim.clone())).await;
        if let Err(e) = res {
            tracing::warn!(job = %claim.id(), "job task join: {}", e);
        }
    }
}
