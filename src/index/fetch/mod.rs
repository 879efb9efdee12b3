#[cfg(test)]
mod tests;

use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::AskError;

const DOWNLOAD_TIMEOUT_SECONDS: u64 = 300;

/// Layout of an extracted index archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// Index files sit directly at the archive root.
    Root,
    /// Index files sit one level down, under a directory named like the
    /// index directory itself.
    Nested,
}

/// Whether a local index already exists and is non-empty.
#[inline]
pub fn index_is_present(index_dir: &Path) -> bool {
    fs::read_dir(index_dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

/// Make sure a local index exists, downloading and installing the prebuilt
/// archive when none is present.
///
/// A present, non-empty index short-circuits without any network access.
/// Otherwise the archive is streamed to a temporary file, extracted into a
/// temporary directory next to the target, normalized for layout, and moved
/// into place. Both temporaries are deleted on every path out of this
/// function, including errors, so a failed fetch leaves nothing behind.
#[inline]
pub fn ensure_index_available(index_dir: &Path, archive_url: Option<&str>) -> Result<(), AskError> {
    if index_is_present(index_dir) {
        debug!("Local index present at {}", index_dir.display());
        return Ok(());
    }

    let url = archive_url.ok_or_else(|| {
        AskError::Fetch("No local index found and no archive URL is configured".to_string())
    })?;

    info!(
        "No local index at {}, fetching prebuilt archive",
        index_dir.display()
    );

    // A stale or partial target directory would otherwise be merged with
    // the extracted archive; start from a clean slate instead.
    if index_dir.exists() {
        fs::remove_dir_all(index_dir)
            .map_err(|e| AskError::Fetch(format!("Failed to remove stale index: {}", e)))?;
    }

    let index_name = index_dir
        .file_name()
        .ok_or_else(|| AskError::Fetch("Index directory has no name".to_string()))?
        .to_os_string();
    let parent = index_dir
        .parent()
        .ok_or_else(|| AskError::Fetch("Index directory has no parent".to_string()))?;
    fs::create_dir_all(parent)?;

    // Keeping both temporaries next to the target puts them on the same
    // filesystem, so the final rename is atomic.
    let mut archive_file = NamedTempFile::new_in(parent)
        .map_err(|e| AskError::Fetch(format!("Failed to create temporary archive file: {}", e)))?;
    download_archive(url, archive_file.as_file_mut())?;

    let staging = TempDir::new_in(parent)
        .map_err(|e| AskError::Fetch(format!("Failed to create staging directory: {}", e)))?;
    extract_archive(archive_file.path(), staging.path())?;

    let layout = detect_layout(staging.path(), &index_name)?;
    debug!("Archive layout: {:?}", layout);
    install_index(staging.path(), layout, &index_name, index_dir)?;

    info!("Prebuilt index installed at {}", index_dir.display());
    Ok(())
}

fn download_archive(url: &str, dest: &mut File) -> Result<(), AskError> {
    debug!("Downloading index archive from {}", url);

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(DOWNLOAD_TIMEOUT_SECONDS)))
        .build()
        .into();

    let mut response = agent.get(url).call().map_err(|error| match error {
        ureq::Error::StatusCode(status) => {
            AskError::Fetch(format!("Archive download failed with HTTP {}", status))
        }
        other => AskError::Fetch(format!("Archive download failed: {}", other)),
    })?;

    let mut reader = response.body_mut().as_reader();
    let bytes = io::copy(&mut reader, dest)
        .map_err(|e| AskError::Fetch(format!("Failed to stream archive to disk: {}", e)))?;

    debug!("Downloaded {} bytes", bytes);
    Ok(())
}

fn extract_archive(archive_path: &Path, dest: &Path) -> Result<(), AskError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| AskError::Fetch(format!("Corrupted index archive: {}", e)))?;

    archive
        .extract(dest)
        .map_err(|e| AskError::Fetch(format!("Failed to extract index archive: {}", e)))?;

    debug!("Extracted {} archive entries", archive.len());
    Ok(())
}

/// Classify how an extracted archive laid out its contents.
///
/// Nested means the archive held a single directory carrying the index
/// directory's own name; anything else with at least one entry is treated
/// as contents at the root. An empty archive is an error.
pub(crate) fn detect_layout(
    extracted_dir: &Path,
    index_name: &OsStr,
) -> Result<ArchiveLayout, AskError> {
    let entries: Vec<_> = fs::read_dir(extracted_dir)?
        .collect::<Result<_, _>>()
        .map_err(|e: io::Error| {
            AskError::Fetch(format!("Failed to inspect extracted archive: {}", e))
        })?;

    match entries.as_slice() {
        [] => Err(AskError::Fetch(
            "Index archive contained no entries".to_string(),
        )),
        [only] if only.path().is_dir() && only.file_name().as_os_str() == index_name => {
            Ok(ArchiveLayout::Nested)
        }
        _ => Ok(ArchiveLayout::Root),
    }
}

fn install_index(
    staging: &Path,
    layout: ArchiveLayout,
    index_name: &OsStr,
    index_dir: &Path,
) -> Result<(), AskError> {
    let source = match layout {
        ArchiveLayout::Root => staging.to_path_buf(),
        ArchiveLayout::Nested => staging.join(index_name),
    };

    fs::rename(&source, index_dir)
        .map_err(|e| AskError::Fetch(format!("Failed to move index into place: {}", e)))
}
