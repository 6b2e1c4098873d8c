//! Blocking archive writer.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{discard_part, temp_path, Artifact, ArchiveHandle, BundleError};
use crate::checksum;
use crate::job::JobId;
use crate::naming;
use crate::retry::{run_with_retry, RetryPolicy};
use crate::transport::ArtifactFetcher;

/// Entry name for an artifact: sanitized, with the derived output name as
/// fallback, and unique within the archive.
pub(super) fn entry_name(item: &Artifact, taken: &mut HashSet<String>) -> String {
    let name = naming::sanitize_file_name(&item.output_name);
    let name = if name.is_empty() {
        naming::output_name_for(item.id.as_str())
    } else {
        name
    };
    naming::unique_name_among(&name, taken)
}

/// Fetch `items` into a zip at `part`. Returns entry names and skipped ids.
fn fill_part(
    items: &[Artifact],
    fetcher: &dyn ArtifactFetcher,
    retry: &RetryPolicy,
    part: &Path,
) -> Result<(Vec<String>, Vec<JobId>), BundleError> {
    let mut zip = ZipWriter::new(File::create(part)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut taken = HashSet::new();
    let mut entries = Vec::with_capacity(items.len());
    let mut skipped = Vec::new();

    for item in items {
        let bytes = match run_with_retry(retry, || fetcher.fetch(&item.locator)) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(job = %item.id, locator = %item.locator, "skipping artifact: {}", e);
                skipped.push(item.id.clone());
                continue;
            }
        };
        let name = entry_name(item, &mut taken);
        zip.start_file(name.as_str(), options)?;
        zip.write_all(&bytes)?;
        entries.push(name);
    }

    let mut file = zip.finish()?;
    file.flush()?;
    Ok((entries, skipped))
}

/// Write the archive to `<dest>.part` and rename it into place. The part
/// file is removed if any step fails.
pub(super) fn write_archive(
    items: &[Artifact],
    fetcher: &dyn ArtifactFetcher,
    retry: &RetryPolicy,
    dest: &Path,
) -> Result<ArchiveHandle, BundleError> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let part = temp_path(dest);
    let written = fill_part(items, fetcher, retry, &part)
        .and_then(|done| fs::rename(&part, dest).map(|()| done).map_err(BundleError::from));
    let (entries, skipped) = match written {
        Ok(done) => done,
        Err(e) => {
            discard_part(&part);
            return Err(e);
        }
    };

    let sha256 = checksum::sha256_path(dest).map_err(BundleError::Checksum)?;
    tracing::info!(
        path = %dest.display(),
        entries = entries.len(),
        skipped = skipped.len(),
        "archive written"
    );
    Ok(ArchiveHandle {
        path: dest.to_path_buf(),
        entries,
        skipped,
        sha256,
    })
}
