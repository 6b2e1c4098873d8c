//! Runs one job end to end: upload, wait for the response, record the outcome.
//!
//! `run_job` never returns an error. Every job-specific failure ends up as
//! a `Failed` status on the job itself.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::job::{Job, JobId, JobResult, SubmitParams};
use crate::report::{self, RawFailure};
use crate::scheduler::JobEvent;
use crate::store::{BatchStore, Claim, JobUpdate};
use crate::transport::{response, JobTransport, RawResponse};

/// Upload share of a job's progress; the rest is server-side processing.
pub const UPLOAD_SHARE: u8 = 50;

/// Everything a job needs while it runs. Cloned into each task.
#[derive(Clone)]
pub struct RunContext {
    pub store: Arc<BatchStore>,
    pub transport: Arc<dyn JobTransport>,
    /// Form fields for every job of this run.
    pub params: SubmitParams,
    pub quota_status: u32,
    /// Optional sink for status and progress changes.
    pub events: Option<mpsc::Sender<JobEvent>>,
}

impl RunContext {
    /// Claim an idle job for this run and publish its `Queued` status.
    pub fn claim(&self, id: &JobId) -> Option<Claim> {
        match self.store.claim(id) {
            Ok(claim) => {
                if let (Some(tx), Some(job)) = (&self.events, self.store.get(id)) {
                    let _ = tx.try_send(JobEvent::from_job(&job));
                }
                Some(claim)
            }
            Err(e) => {
                tracing::debug!("not claimed: {}", e);
                None
            }
        }
    }

    /// Apply `change` and publish it. Rejected updates (job removed, claim
    /// stale, or job already terminal) are logged and dropped.
    pub fn record(&self, claim: &Claim, change: JobUpdate) -> Option<Job> {
        match self.store.update(claim, change) {
            Ok(job) => {
                if let Some(tx) = &self.events {
                    // A slow or closed consumer never stalls a job.
                    let _ = tx.try_send(JobEvent::from_job(&job));
                }
                Some(job)
            }
            Err(e) => {
                tracing::debug!("update dropped: {}", e);
                None
            }
        }
    }
}

/// Maps upload byte counts to job progress in `[0, UPLOAD_SHARE]` and moves
/// the job to `Processing` once the last byte is sent.
struct UploadProgress<'a> {
    ctx: &'a RunContext,
    claim: &'a Claim,
    last: Option<u8>,
    processing: bool,
}

impl<'a> UploadProgress<'a> {
    fn new(ctx: &'a RunContext, claim: &'a Claim) -> Self {
        Self {
            ctx,
            claim,
            last: None,
            processing: false,
        }
    }

    fn observe(&mut self, sent: u64, total: u64) {
        if total == 0 || self.processing {
            return;
        }
        if sent >= total {
            self.processing = true;
            self.ctx.record(self.claim, JobUpdate::Processing(UPLOAD_SHARE));
            return;
        }
        let p = (sent as u128 * UPLOAD_SHARE as u128 / total as u128) as u8;
        if self.last != Some(p) {
            self.last = Some(p);
            self.ctx.record(self.claim, JobUpdate::Uploading(p));
        }
    }
}

/// Turn a received response into a result or a raw failure.
fn interpret(resp: &RawResponse, source_name: &str) -> Result<JobResult, RawFailure> {
    if !resp.is_success() {
        return Err(RawFailure::Status {
            code: resp.status,
            body: resp.body.clone(),
        });
    }
    response::decode_result(&resp.body, source_name).map_err(|e| RawFailure::Decode(e.to_string()))
}

/// Run one claimed job to a terminal state. Returns without uploading if
/// the job cannot be started: removed, re-admitted, or no longer `Queued`.
pub async fn run_job(ctx: RunContext, claim: Claim) {
    let Some(job) = ctx.record(&claim, JobUpdate::Start) else {
        return;
    };
    let id = claim.id().clone();
    tracing::info!(job = %id, bytes = job.payload.len(), "job started");

    let payload = job.payload.clone();
    let worker_ctx = ctx.clone();
    let worker_claim = claim.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let mut progress = UploadProgress::new(&worker_ctx, &worker_claim);
        worker_ctx
            .transport
            .submit(&payload, &worker_ctx.params, &mut |sent, total| {
                progress.observe(sent, total)
            })
    })
    .await;

    let outcome = match joined {
        Ok(Ok(resp)) => interpret(&resp, id.as_str()),
        Ok(Err(e)) => Err(RawFailure::Transport(e.to_string())),
        Err(e) => Err(RawFailure::Transport(format!("upload task failed: {}", e))),
    };

    match outcome {
        Ok(result) => {
            tracing::info!(
                job = %id,
                original = result.original_size,
                output = result.output_size,
                ratio = %result.reduction_ratio,
                "job completed"
            );
            ctx.record(&claim, JobUpdate::Completed(result));
        }
        Err(raw) => {
            let error = report::report(&raw, ctx.quota_status);
            tracing::warn!(job = %id, kind = %error.kind, "job failed: {}", error.message);
            ctx.record(&claim, JobUpdate::Failed(error));
        }
    }
}
