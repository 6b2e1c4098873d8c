//! Save each completed artifact as its own file.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::archive::entry_name;
use super::{artifacts, discard_part, temp_path, BundleError};
use crate::job::{Job, JobId};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::transport::ArtifactFetcher;

/// Files written by `save_outputs`.
#[derive(Debug, Clone, Default)]
pub struct SavedOutputs {
    pub saved: Vec<(JobId, PathBuf)>,
    pub skipped: Vec<JobId>,
}

/// Fetch every completed job's artifact into `out_dir/<output name>`.
/// Each file is written to `<name>.part` first and renamed when complete;
/// a part file whose write or rename fails is removed.
pub async fn save_outputs(
    jobs: &[Job],
    fetcher: Arc<dyn ArtifactFetcher>,
    retry: RetryPolicy,
    out_dir: &Path,
) -> Result<SavedOutputs, BundleError> {
    let items = artifacts(jobs);
    if items.is_empty() {
        return Err(BundleError::NothingToBundle);
    }
    let out_dir = out_dir.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<SavedOutputs, BundleError> {
        fs::create_dir_all(&out_dir)?;
        let mut taken = HashSet::new();
        let mut out = SavedOutputs::default();
        for item in &items {
            let bytes = match run_with_retry(&retry, || fetcher.fetch(&item.locator)) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!(job = %item.id, "skipping artifact: {}", e);
                    out.skipped.push(item.id.clone());
                    continue;
                }
            };
            let dest = out_dir.join(entry_name(item, &mut taken));
            let part = temp_path(&dest);
            if let Err(e) = fs::write(&part, &bytes).and_then(|()| fs::rename(&part, &dest)) {
                discard_part(&part);
                return Err(e.into());
            }
            tracing::debug!(job = %item.id, path = %dest.display(), "saved output");
            out.saved.push((item.id.clone(), dest));
        }
        Ok(out)
    })
    .await
    .map_err(|e| BundleError::Join(e.to_string()))?
}
