use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context as _;

use crate::export::capture::BuiltFrameSet;
use crate::export::progress::ProgressSink;
use crate::foundation::core::Fps;
use crate::foundation::error::{ScanError, ScanResult};
use crate::render::frame::encode_png_rgba8;

/// Input pattern the codec reads frames from.
pub const FRAME_PATTERN: &str = "frame_%05d.png";

static NEXT_WORKDIR: AtomicU64 = AtomicU64::new(0);

/// Share of the encode slice spent writing frames into the work directory.
const WRITE_SHARE: f64 = 0.7;

/// Returns `true` if an `ffmpeg` binary can be spawned.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Something that runs codec command lines inside a work directory.
pub trait CodecBackend {
    /// Check the backend is usable. Called once per engine load.
    fn probe(&mut self) -> ScanResult<()>;

    /// Run one command line with `workdir` as the current directory.
    fn exec(&mut self, workdir: &Path, args: &[String]) -> ScanResult<()>;
}

/// Runs the system `ffmpeg` binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFfmpeg;

impl CodecBackend for SystemFfmpeg {
    fn probe(&mut self) -> ScanResult<()> {
        if is_ffmpeg_on_path() {
            Ok(())
        } else {
            Err(ScanError::encode(
                "ffmpeg is required for MP4 encoding, but was not found on PATH",
            ))
        }
    }

    fn exec(&mut self, workdir: &Path, args: &[String]) -> ScanResult<()> {
        let output = Command::new("ffmpeg")
            .current_dir(workdir)
            .args(["-hide_banner", "-loglevel", "error"])
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                ScanError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScanError::encode(format!(
                "ffmpeg exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// `-framerate` value: exact `num/den`, or just `num` for whole rates.
fn framerate_arg(fps: Fps) -> String {
    if fps.den == 1 {
        fps.num.to_string()
    } else {
        format!("{}/{}", fps.num, fps.den)
    }
}

/// H.264 command line, the preferred encode.
pub fn h264_args(fps: Fps, out_name: &str) -> Vec<String> {
    [
        "-y",
        "-framerate",
        framerate_arg(fps).as_str(),
        "-i",
        FRAME_PATTERN,
        "-c:v",
        "libx264",
        "-crf",
        "14",
        "-preset",
        "slow",
        "-pix_fmt",
        "yuv420p",
        out_name,
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// MPEG-4 Part 2 command line, used when the H.264 attempt produced nothing.
pub fn mpeg4_args(fps: Fps, out_name: &str) -> Vec<String> {
    [
        "-y",
        "-framerate",
        framerate_arg(fps).as_str(),
        "-i",
        FRAME_PATTERN,
        "-c:v",
        "mpeg4",
        "-q:v",
        "2",
        out_name,
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Removes the listed files when dropped.
struct ScratchFiles(Vec<PathBuf>);

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        for p in &self.0 {
            let _ = std::fs::remove_file(p);
        }
    }
}

/// Owned codec session: a backend plus a private scratch directory.
///
/// `load` is idempotent; jobs take `&mut self`, so they never overlap. The scratch directory is
/// removed by [`VideoEngine::teardown`] or on drop.
#[derive(Debug)]
pub struct VideoEngine<B: CodecBackend = SystemFfmpeg> {
    backend: B,
    workdir: Option<PathBuf>,
}

impl VideoEngine<SystemFfmpeg> {
    /// Engine over the system `ffmpeg`.
    pub fn system() -> Self {
        Self::new(SystemFfmpeg)
    }
}

impl<B: CodecBackend> VideoEngine<B> {
    /// Wrap a backend; nothing is touched until [`VideoEngine::load`].
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            workdir: None,
        }
    }

    /// Borrow the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether the scratch directory exists.
    pub fn is_loaded(&self) -> bool {
        self.workdir.is_some()
    }

    /// Scratch directory, once loaded.
    pub fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    /// Probe the backend and create the scratch directory. No-op when already loaded.
    pub fn load(&mut self) -> ScanResult<&Path> {
        if self.workdir.is_none() {
            self.backend.probe()?;
            let dir = std::env::temp_dir().join(format!(
                "scanfield_codec_{}_{}_{}",
                std::process::id(),
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos())
                    .unwrap_or(0),
                NEXT_WORKDIR.fetch_add(1, Ordering::Relaxed)
            ));
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("create codec work dir '{}'", dir.display()))?;
            tracing::debug!(dir = %dir.display(), "video engine loaded");
            self.workdir = Some(dir);
        }
        self.workdir
            .as_deref()
            .ok_or_else(|| ScanError::surface("codec work dir missing after load"))
    }

    /// Remove the scratch directory. The engine can be loaded again afterwards.
    pub fn teardown(&mut self) -> ScanResult<()> {
        if let Some(dir) = self.workdir.take() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("remove codec work dir '{}'", dir.display()))?;
        }
        Ok(())
    }

    /// Encode a frame set to MP4 bytes.
    ///
    /// Tries H.264 first and MPEG-4 once if that yields no output. Frame files and the output
    /// file are deleted whether or not the job succeeds.
    #[tracing::instrument(skip(self, set, progress), fields(frames = set.frames.len()))]
    pub fn encode_mp4(
        &mut self,
        set: &BuiltFrameSet,
        out_name: &str,
        progress: &mut dyn ProgressSink,
    ) -> ScanResult<Vec<u8>> {
        if set.frames.is_empty() {
            return Err(ScanError::validation("mp4 needs at least one frame"));
        }
        let dir = self.load()?.to_path_buf();
        let out_path = dir.join(out_name);
        let mut scratch = ScratchFiles(Vec::with_capacity(set.frames.len() + 1));
        scratch.0.push(out_path.clone());

        let range = set.encode_range;
        let write_end = range.start + (f64::from(range.span()) * WRITE_SHARE).round() as u32;
        let write_span = f64::from((write_end - range.start).max(1));
        let total = set.frames.len() as f64;

        for (i, rgba) in set.frames.iter().enumerate() {
            let png = encode_png_rgba8(rgba, set.width, set.height)?;
            let path = dir.join(format!("frame_{i:05}.png"));
            std::fs::write(&path, png)
                .with_context(|| format!("write frame '{}'", path.display()))?;
            scratch.0.push(path);

            if i % 2 == 0 {
                progress.progress(range.start + (i as f64 / total * write_span).round() as u32);
                progress.yield_now();
            }
        }
        progress.progress(write_end);

        let fps = set.fps;
        let bytes = match self.attempt(&dir, &out_path, &h264_args(fps, out_name))? {
            Some(b) => b,
            None => {
                tracing::warn!("h264 encode produced no output; retrying with mpeg4");
                self.attempt(&dir, &out_path, &mpeg4_args(fps, out_name))?
                    .ok_or_else(|| ScanError::encode("empty mp4 output"))?
            }
        };

        progress.progress(range.end);
        tracing::debug!(bytes = bytes.len(), "mp4 encoded");
        Ok(bytes)
    }

    fn attempt(&mut self, dir: &Path, out_path: &Path, args: &[String]) -> ScanResult<Option<Vec<u8>>> {
        let _ = std::fs::remove_file(out_path);
        if let Err(e) = self.backend.exec(dir, args) {
            tracing::warn!(error = %e, "codec run failed");
            return Ok(None);
        }
        match std::fs::read(out_path) {
            Ok(bytes) if !bytes.is_empty() => Ok(Some(bytes)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("read codec output '{}'", out_path.display()))
                .into()),
        }
    }
}

impl<B: CodecBackend> Drop for VideoEngine<B> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            tracing::warn!(error = %e, "video engine teardown failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/video.rs"]
mod tests;
