//! Downloadable outputs: one zip archive for the whole batch, or one file
//! per completed job.
//!
//! Artifacts are fetched through `ArtifactFetcher` with the configured retry
//! policy. An artifact that still cannot be fetched is logged and skipped;
//! it never fails the whole bundle.

mod archive;
mod save;

pub use save::{save_outputs, SavedOutputs};

use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::job::{Job, JobId};
use crate::retry::RetryPolicy;
use crate::transport::ArtifactFetcher;

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("no completed jobs to bundle")]
    NothingToBundle,
    #[error("archive I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("archive write: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("archive checksum: {0:#}")]
    Checksum(anyhow::Error),
    #[error("bundle task failed: {0}")]
    Join(String),
}

/// A finished archive on disk.
#[derive(Debug, Clone)]
pub struct ArchiveHandle {
    pub path: PathBuf,
    /// Entry names, in batch order.
    pub entries: Vec<String>,
    /// Completed jobs whose artifact could not be fetched.
    pub skipped: Vec<JobId>,
    /// SHA-256 of the archive file (lowercase hex).
    pub sha256: String,
}

/// One completed job's artifact, ready to fetch.
#[derive(Debug, Clone)]
pub(crate) struct Artifact {
    pub id: JobId,
    pub locator: String,
    pub output_name: String,
}

pub(crate) fn artifacts(jobs: &[Job]) -> Vec<Artifact> {
    jobs.iter()
        .filter_map(|j| {
            j.phase.result().map(|r| Artifact {
                id: j.id.clone(),
                locator: r.locator.clone(),
                output_name: r.output_name.clone(),
            })
        })
        .collect()
}

/// `compressed-pdfs-2024-03-09.zip`
pub fn archive_name(date: NaiveDate) -> String {
    format!("compressed-pdfs-{}.zip", date.format("%Y-%m-%d"))
}

/// In-progress path for `dest` (e.g. `bundle.zip.part`).
pub(crate) fn temp_path(dest: &Path) -> PathBuf {
    let mut s = dest.as_os_str().to_owned();
    s.push(".part");
    PathBuf::from(s)
}

/// Remove a `.part` file left by a failed write.
pub(crate) fn discard_part(part: &Path) {
    match std::fs::remove_file(part) {
        Ok(()) => tracing::debug!(path = %part.display(), "removed partial file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %part.display(), "could not remove partial file: {}", e),
    }
}

/// Fetch every completed job's artifact and write them into
/// `out_dir/compressed-pdfs-<date>.zip`.
pub async fn bundle(
    jobs: &[Job],
    fetcher: Arc<dyn ArtifactFetcher>,
    retry: RetryPolicy,
    out_dir: &Path,
    date: NaiveDate,
) -> Result<ArchiveHandle, BundleError> {
    let items = artifacts(jobs);
    if items.is_empty() {
        return Err(BundleError::NothingToBundle);
    }
    let dest = out_dir.join(archive_name(date));
    tracing::info!(items = items.len(), path = %dest.display(), "bundling outputs");
    tokio::task::spawn_blocking(move || archive::write_archive(&items, fetcher.as_ref(), &retry, &dest))
        .await
        .map_err(|e| BundleError::Join(e.to_string()))?
}
