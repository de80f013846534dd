use std::str::FromStr;

use crate::deliver::artifact::{ExportArtifact, bundle_zip};
use crate::deliver::target::{DeliveryOutcome, DownloadTarget, ShareTarget, deliver_files};
use crate::encode::gif::encode_gif;
use crate::encode::video::{CodecBackend, SystemFfmpeg, VideoEngine};
use crate::export::capture::{CaptureInputs, ExportConfig, capture_frames};
use crate::export::progress::{ProgressRange, ProgressSink};
use crate::foundation::error::{ScanError, ScanResult};
use crate::render::frame::RenderMode;

/// Title handed to the share target.
pub const EXPORT_TITLE: &str = "scanfield export";

/// Output container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    /// Animated GIF.
    Gif,
    /// H.264 (or MPEG-4) in MP4.
    Mp4,
}

impl ExportFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Mp4 => "mp4",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gif" => Ok(Self::Gif),
            "mp4" => Ok(Self::Mp4),
            other => Err(ScanError::validation(format!("unknown export format '{other}'"))),
        }
    }
}

/// What the clip shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExportType {
    /// Point field on black.
    Overlay,
    /// Point field over the darkened source.
    Render,
}

impl ExportType {
    /// Render mode used for capture.
    pub fn mode(self) -> RenderMode {
        match self {
            Self::Overlay => RenderMode::Overlay,
            Self::Render => RenderMode::Composite,
        }
    }

    /// Name used in file names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Overlay => "overlay",
            Self::Render => "render",
        }
    }
}

impl FromStr for ExportType {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overlay" => Ok(Self::Overlay),
            "render" => Ok(Self::Render),
            other => Err(ScanError::validation(format!("unknown export type '{other}'"))),
        }
    }
}

/// Artifact file name for one task.
pub fn artifact_name(format: ExportFormat, ty: ExportType) -> String {
    format!("scanfield-{}.{}", ty.label(), format.extension())
}

/// Requested formats and types; every combination is exported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportRequest {
    /// Containers to produce.
    pub formats: Vec<ExportFormat>,
    /// Clip kinds to produce.
    pub types: Vec<ExportType>,
}

impl ExportRequest {
    /// Format-major task list with duplicates dropped.
    pub fn tasks(&self) -> Vec<(ExportFormat, ExportType)> {
        let mut out = Vec::with_capacity(self.formats.len() * self.types.len());
        for &f in &self.formats {
            for &t in &self.types {
                if !out.contains(&(f, t)) {
                    out.push((f, t));
                }
            }
        }
        out
    }

    fn check(&self) -> Result<(), String> {
        if self.formats.is_empty() {
            return Err("select at least one format".to_string());
        }
        if self.types.is_empty() {
            return Err("select at least one type".to_string());
        }
        Ok(())
    }
}

/// Terminal state of one export run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The request was empty; nothing was attempted.
    Invalid(String),
    /// Every task came back empty (no source or scene).
    NothingToExport,
    /// Delivered through the share target.
    Shared,
    /// Saved through the download target.
    Downloaded,
    /// The user canceled the share.
    Canceled,
    /// Something failed along the way.
    Failed(String),
}

impl ExportOutcome {
    /// Short status line for the user.
    pub fn note(&self, bundled: bool) -> String {
        match self {
            Self::Invalid(msg) => format!("{msg}."),
            Self::NothingToExport => "nothing to export.".to_string(),
            Self::Shared => "export shared.".to_string(),
            Self::Downloaded if bundled => "export zip ready.".to_string(),
            Self::Downloaded => "export file ready.".to_string(),
            Self::Canceled => "export canceled.".to_string(),
            Self::Failed(_) => "export failed. please try again.".to_string(),
        }
    }
}

/// Runs export requests: capture, encode, bundle, deliver.
#[derive(Debug)]
pub struct Exporter<B: CodecBackend = SystemFfmpeg> {
    config: ExportConfig,
    engine: VideoEngine<B>,
}

impl Exporter<SystemFfmpeg> {
    /// Exporter using the system `ffmpeg` for MP4.
    pub fn system(config: ExportConfig) -> Self {
        Self::new(config, VideoEngine::system())
    }
}

impl<B: CodecBackend> Exporter<B> {
    /// Exporter with an explicit video engine.
    pub fn new(config: ExportConfig, engine: VideoEngine<B>) -> Self {
        Self { config, engine }
    }

    /// Export tunables.
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Video engine (loaded lazily by the first MP4 task).
    pub fn engine(&self) -> &VideoEngine<B> {
        &self.engine
    }

    /// Capture and encode every task in `request`, in order.
    ///
    /// Tasks whose capture has nothing to draw are skipped.
    #[tracing::instrument(skip(self, inputs, progress))]
    pub fn render_artifacts(
        &mut self,
        inputs: CaptureInputs<'_>,
        request: &ExportRequest,
        progress: &mut dyn ProgressSink,
    ) -> ScanResult<Vec<ExportArtifact>> {
        let tasks = request.tasks();
        let mut out = Vec::with_capacity(tasks.len());
        for (i, &(format, ty)) in tasks.iter().enumerate() {
            let range = ProgressRange::FULL.task(i, tasks.len());
            let Some(set) = capture_frames(inputs, ty.mode(), &self.config, range, progress)? else {
                tracing::debug!(?format, ?ty, "nothing captured");
                continue;
            };
            let name = artifact_name(format, ty);
            let bytes = match format {
                ExportFormat::Gif => encode_gif(&set, progress)?,
                ExportFormat::Mp4 => self.engine.encode_mp4(&set, &name, progress)?,
            };
            tracing::debug!(%name, bytes = bytes.len(), "artifact ready");
            out.push(ExportArtifact::new(name, bytes));
        }
        Ok(out)
    }

    /// Run a full export and deliver the result. Never returns an error; failures become
    /// [`ExportOutcome::Failed`].
    pub fn run(
        &mut self,
        inputs: CaptureInputs<'_>,
        request: &ExportRequest,
        share: &mut dyn ShareTarget,
        download: &mut dyn DownloadTarget,
        progress: &mut dyn ProgressSink,
    ) -> ExportOutcome {
        if let Err(msg) = request.check() {
            return ExportOutcome::Invalid(msg);
        }
        progress.progress(0);
        progress.capture_preview(None);

        let outcome = self.run_inner(inputs, request, share, download, progress);
        progress.capture_preview(None);
        match outcome {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                ExportOutcome::Failed(e.to_string())
            }
        }
    }

    fn run_inner(
        &mut self,
        inputs: CaptureInputs<'_>,
        request: &ExportRequest,
        share: &mut dyn ShareTarget,
        download: &mut dyn DownloadTarget,
        progress: &mut dyn ProgressSink,
    ) -> ScanResult<ExportOutcome> {
        let mut artifacts = self.render_artifacts(inputs, request, progress)?;
        let deliverable = match artifacts.len() {
            0 => return Ok(ExportOutcome::NothingToExport),
            1 => artifacts.remove(0),
            _ => bundle_zip(&artifacts)?,
        };

        let delivered = deliver_files(
            std::slice::from_ref(&deliverable),
            EXPORT_TITLE,
            share,
            download,
        )?;
        progress.progress(100);
        Ok(match delivered {
            DeliveryOutcome::Shared => ExportOutcome::Shared,
            DeliveryOutcome::Downloaded => ExportOutcome::Downloaded,
            DeliveryOutcome::Canceled => ExportOutcome::Canceled,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
