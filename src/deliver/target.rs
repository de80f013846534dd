use std::path::{Path, PathBuf};

use crate::deliver::artifact::ExportArtifact;
use crate::foundation::error::{ScanError, ScanResult};

/// What a share attempt came back with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShareResult {
    /// The user completed the share.
    Shared,
    /// The user dismissed the share sheet.
    Canceled,
    /// No share facility, or it refused these files.
    Unsupported,
    /// The share facility errored for another reason.
    Failed(String),
}

/// Terminal outcome of a delivery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handed to the share target.
    Shared,
    /// Saved through the download target.
    Downloaded,
    /// The user canceled the share.
    Canceled,
}

/// Native share facility.
pub trait ShareTarget {
    /// Offer `files` under `title`.
    fn share(&mut self, files: &[ExportArtifact], title: &str) -> ShareResult;
}

/// Fallback save facility.
pub trait DownloadTarget {
    /// Save one file.
    fn download(&mut self, file: &ExportArtifact) -> ScanResult<()>;
}

/// A platform without a share facility.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShare;

impl ShareTarget for NoShare {
    fn share(&mut self, _files: &[ExportArtifact], _title: &str) -> ShareResult {
        ShareResult::Unsupported
    }
}

/// Writes downloads into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryDownload {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectoryDownload {
    /// Save into `dir`, created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: Vec::new(),
        }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Every path written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl DownloadTarget for DirectoryDownload {
    fn download(&mut self, file: &ExportArtifact) -> ScanResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            ScanError::delivery(format!("create output dir '{}': {e}", self.dir.display()))
        })?;
        let path = self.dir.join(&file.filename);
        std::fs::write(&path, &file.bytes)
            .map_err(|e| ScanError::delivery(format!("write '{}': {e}", path.display())))?;
        tracing::debug!(path = %path.display(), bytes = file.bytes.len(), "artifact saved");
        self.written.push(path);
        Ok(())
    }
}

/// Share when possible; otherwise download every file.
pub fn deliver_files(
    files: &[ExportArtifact],
    title: &str,
    share: &mut dyn ShareTarget,
    download: &mut dyn DownloadTarget,
) -> ScanResult<DeliveryOutcome> {
    match share.share(files, title) {
        ShareResult::Shared => return Ok(DeliveryOutcome::Shared),
        ShareResult::Canceled => return Ok(DeliveryOutcome::Canceled),
        ShareResult::Failed(reason) => {
            tracing::warn!(%reason, "share failed; downloading instead");
        }
        ShareResult::Unsupported => {}
    }
    for f in files {
        download.download(f)?;
    }
    Ok(DeliveryOutcome::Downloaded)
}

#[cfg(test)]
#[path = "../../tests/unit/deliver/target.rs"]
mod tests;
