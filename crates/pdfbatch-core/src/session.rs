//! Public entry point: admit files, run batches, and collect results.
//!
//! A `BatchHandle` owns one batch's store plus the client-local handles
//! (saved output files) derived from it. Removing, retrying, or clearing
//! a job releases those handles.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;

use crate::bundle::{self, ArchiveHandle, BundleError, SavedOutputs};
use crate::config::BatchConfig;
use crate::job::{Job, JobId, Payload, SubmitParams};
use crate::report::{ErrorKind, ValidationError};
use crate::retry::RetryPolicy;
use crate::runner::RunContext;
use crate::scheduler::{self, JobEvent, Policy, RunOutcome};
use crate::store::{BatchStore, StoreError};
use crate::summary::{self, BatchSummary};
use crate::transport::{ArtifactFetcher, CurlTransport, JobTransport};

struct BatchInner {
    store: Arc<BatchStore>,
    saved: Mutex<HashMap<JobId, PathBuf>>,
}

/// Handle to one batch. Clones refer to the same batch.
#[derive(Clone)]
pub struct BatchHandle {
    inner: Arc<BatchInner>,
}

impl BatchHandle {
    fn new() -> Self {
        Self {
            inner: Arc::new(BatchInner {
                store: Arc::new(BatchStore::new()),
                saved: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn store(&self) -> &Arc<BatchStore> {
        &self.inner.store
    }

    /// Snapshot of every job in batch order.
    pub fn jobs(&self) -> Vec<Job> {
        self.inner.store.all()
    }

    pub fn overall_progress(&self) -> u8 {
        scheduler::overall_progress(&self.jobs())
    }

    /// Saved output file for a job, if `save_outputs` wrote one.
    pub fn saved_path(&self, id: &JobId) -> Option<PathBuf> {
        self.saved().get(id).cloned()
    }

    fn saved(&self) -> std::sync::MutexGuard<'_, HashMap<JobId, PathBuf>> {
        self.inner.saved.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drop the local handle for `id`, deleting the saved file if any.
    fn release(&self, id: &JobId) {
        let path = self.saved().remove(id);
        if let Some(path) = path {
            delete_saved(&path);
        }
    }

    /// Record freshly saved files. A job saved before to a different path
    /// has that older file released.
    fn track(&self, saved: &[(JobId, PathBuf)]) {
        let replaced: Vec<PathBuf> = {
            let mut map = self.saved();
            saved
                .iter()
                .filter_map(|(id, path)| map.insert(id.clone(), path.clone()).filter(|old| old != path))
                .collect()
        };
        for path in &replaced {
            delete_saved(path);
        }
    }
}

fn delete_saved(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "deleted saved output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "could not delete saved output: {}", e),
    }
}

/// Batch orchestrator bound to one processing API.
pub struct Orchestrator {
    config: BatchConfig,
    transport: Arc<dyn JobTransport>,
    fetcher: Arc<dyn ArtifactFetcher>,
    retry: RetryPolicy,
}

impl Orchestrator {
    /// Use one value as both the upload transport and the artifact fetcher.
    pub fn new<T>(config: BatchConfig, transport: T) -> Self
    where
        T: JobTransport + ArtifactFetcher + 'static,
    {
        let shared = Arc::new(transport);
        Self::with_parts(config, shared.clone(), shared)
    }

    pub fn with_parts(
        config: BatchConfig,
        transport: Arc<dyn JobTransport>,
        fetcher: Arc<dyn ArtifactFetcher>,
    ) -> Self {
        let retry = config
            .retry
            .as_ref()
            .map(RetryPolicy::from_config)
            .unwrap_or_default();
        Self {
            config,
            transport,
            fetcher,
            retry,
        }
    }

    /// Orchestrator talking to the configured API over libcurl.
    pub fn from_config(config: BatchConfig) -> anyhow::Result<Self> {
        let transport = CurlTransport::from_config(&config)?;
        Ok(Self::new(config, transport))
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    fn jobs_for(files: Vec<Payload>) -> Result<Vec<Job>, ValidationError> {
        files.into_iter().map(Job::new).collect()
    }

    /// Create a batch from `files`. Rejects an empty set and duplicate names;
    /// on rejection no job is created.
    pub fn submit(&self, files: Vec<Payload>) -> Result<BatchHandle, ValidationError> {
        let handle = BatchHandle::new();
        self.add_files(&handle, files)?;
        Ok(handle)
    }

    /// Admit more files into an existing batch, all or nothing.
    pub fn add_files(&self, handle: &BatchHandle, files: Vec<Payload>) -> Result<(), ValidationError> {
        let jobs = Self::jobs_for(files)?;
        let count = jobs.len();
        handle.store().add_all(jobs)?;
        tracing::debug!(count, total = handle.store().len(), "files admitted");
        Ok(())
    }

    /// Run every runnable job under `policy`; resolves once they all settle.
    pub async fn execute(
        &self,
        handle: &BatchHandle,
        policy: Policy,
        params: SubmitParams,
        events: Option<mpsc::Sender<JobEvent>>,
    ) -> RunOutcome {
        let ctx = RunContext {
            store: Arc::clone(handle.store()),
            transport: Arc::clone(&self.transport),
            params,
            quota_status: self.config.quota_status,
            events,
        };
        scheduler::execute(ctx, policy, self.config.max_parallel).await
    }

    /// Form fields for a run at the configured default quality.
    pub fn default_params(&self) -> SubmitParams {
        SubmitParams::new(self.config.default_quality)
    }

    pub fn progress(&self, handle: &BatchHandle) -> u8 {
        handle.overall_progress()
    }

    pub fn summary(&self, handle: &BatchHandle) -> Option<BatchSummary> {
        summary::summarize(&handle.jobs())
    }

    /// Archive every completed job's artifact into `out_dir`, named with today's UTC date.
    pub async fn bundle(&self, handle: &BatchHandle, out_dir: &Path) -> Result<ArchiveHandle, BundleError> {
        let today = chrono::Utc::now().date_naive();
        bundle::bundle(
            &handle.jobs(),
            Arc::clone(&self.fetcher),
            self.retry,
            out_dir,
            today,
        )
        .await
    }

    /// Save every completed job's artifact as its own file in `out_dir`.
    /// Files from an earlier save of the same job elsewhere are released.
    pub async fn save_outputs(&self, handle: &BatchHandle, out_dir: &Path) -> Result<SavedOutputs, BundleError> {
        let saved = bundle::save_outputs(&handle.jobs(), Arc::clone(&self.fetcher), self.retry, out_dir).await?;
        handle.track(&saved.saved);
        Ok(saved)
    }

    /// Remove a job and release its local handles.
    pub fn remove(&self, handle: &BatchHandle, id: &JobId) -> Option<Job> {
        let job = handle.store().remove(id)?;
        handle.release(id);
        Some(job)
    }

    /// Reset a failed job to `Idle` so the next `execute` runs it again.
    pub fn retry(&self, handle: &BatchHandle, id: &JobId) -> Result<Job, StoreError> {
        let job = handle.store().retry(id)?;
        handle.release(id);
        Ok(job)
    }

    /// Reset every failed job except quota failures, which need a top-up
    /// before another attempt can succeed. Returns the reset ids.
    pub fn retry_failed(&self, handle: &BatchHandle) -> Vec<JobId> {
        handle
            .jobs()
            .into_iter()
            .filter(|j| j.phase.error().is_some_and(|e| e.kind != ErrorKind::Quota))
            .filter_map(|j| self.retry(handle, &j.id).ok().map(|j| j.id))
            .collect()
    }

    /// Remove every job and release every handle.
    pub fn clear(&self, handle: &BatchHandle) -> Vec<Job> {
        let jobs = handle.store().clear();
        for job in &jobs {
            handle.release(&job.id);
        }
        jobs
    }

    pub fn jobs(&self, handle: &BatchHandle) -> Vec<Job> {
        handle.jobs()
    }
}
