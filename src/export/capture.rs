use crate::animation::loop_search::{find_best_start_ms, wave_cycle_ms};
use crate::export::progress::{ProgressRange, ProgressSink};
use crate::foundation::core::{Canvas, Fps, Rgb8};
use crate::foundation::error::{ScanError, ScanResult};
use crate::render::frame::{FrameInputs, FrameRenderer, RenderMode};
use crate::render::session::PreviewSession;
use crate::scene::build::Scene;
use crate::scene::layout::Placement;
use crate::scene::source::SourceImage;
use crate::settings::normalize::Settings;

/// Shortest clip ever captured.
pub const MIN_EXPORT_SECONDS: f64 = 0.5;

/// Share of a task's progress slice spent on capture; encoding gets the rest.
const CAPTURE_SHARE: f64 = 0.45;

/// Export tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportConfig {
    /// Requested clip length in seconds.
    pub seconds: f64,
    /// Optional hard cap on the clip length.
    pub max_seconds: Option<f64>,
    /// Capture and playback rate.
    pub fps: Fps,
    /// Longest allowed output side in pixels.
    pub max_side: u32,
    /// Wave sweeps packed into an overlay clip.
    pub overlay_cycles: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            seconds: 3.0,
            max_seconds: None,
            fps: Fps { num: 20, den: 1 },
            max_side: 1920,
            overlay_cycles: 3,
        }
    }
}

impl ExportConfig {
    /// Effective clip length: both the request and the cap are floored at half a second.
    pub fn duration_secs(&self) -> f64 {
        let base = floor_secs(self.seconds);
        match self.max_seconds {
            Some(cap) => base.min(floor_secs(cap)),
            None => base,
        }
    }

    /// Reject a zero frame rate and a `max_side` too small for an even frame.
    pub fn validate(&self) -> ScanResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        if self.max_side < 2 {
            return Err(ScanError::validation(format!(
                "export max side must be >= 2, got {}",
                self.max_side
            )));
        }
        Ok(())
    }
}

fn floor_secs(v: f64) -> f64 {
    if v.is_finite() {
        v.max(MIN_EXPORT_SECONDS)
    } else {
        MIN_EXPORT_SECONDS
    }
}

/// Captured frames ready for an encoder.
#[derive(Clone, Debug)]
pub struct BuiltFrameSet {
    /// Opaque RGBA8 frames, each `width*height*4` bytes.
    pub frames: Vec<Vec<u8>>,
    /// Frame width.
    pub width: u32,
    /// Frame height.
    pub height: u32,
    /// Playback rate.
    pub fps: Fps,
    /// Per-frame delay in milliseconds.
    pub delay_ms: u32,
    /// Clip length in seconds.
    pub duration_secs: f64,
    /// Progress slice left for the encoder.
    pub encode_range: ProgressRange,
}

/// What a capture reads. Either the source or the scene may be missing; the capture then yields
/// nothing.
#[derive(Clone, Copy, Debug)]
pub struct CaptureInputs<'a> {
    /// Full-resolution source image.
    pub source: Option<&'a SourceImage>,
    /// Scene built at preview resolution.
    pub scene: Option<&'a Scene>,
    /// Settings snapshot.
    pub settings: &'a Settings,
    /// Tint.
    pub theme: Rgb8,
    /// Reference time for the loop search.
    pub now_ms: f64,
}

impl<'a> CaptureInputs<'a> {
    /// Snapshot a preview session. `fallback_now_ms` is used when the session never ticked.
    pub fn from_session(session: &'a PreviewSession, fallback_now_ms: f64) -> Self {
        Self {
            source: session.source(),
            scene: session.scene(),
            settings: session.settings(),
            theme: session.theme().rgb(),
            now_ms: session.last_frame_ms().unwrap_or(fallback_now_ms),
        }
    }
}

/// Output size for a source of `src_w`x`src_h`: scaled down to fit `max_side`, then each side
/// made even (never below 2). A `max_side` below 2 is treated as 2.
pub fn export_dimensions(src_w: u32, src_h: u32, max_side: u32) -> (u32, u32) {
    let (mut w, mut h) = (f64::from(src_w), f64::from(src_h));
    let max = f64::from(max_side.max(2));
    if w > max || h > max {
        let scale = (max / w).min(max / h);
        w = (w * scale).round();
        h = (h * scale).round();
    }
    (make_even(w as u32), make_even(h as u32))
}

fn make_even(v: u32) -> u32 {
    let v = if v % 2 == 0 { v } else { v - 1 };
    v.max(2)
}

/// Playback speed-up applied to a capture.
///
/// Overlay clips are sped up so at least `cycles` full sweeps fit; composite clips play in real
/// time. A degenerate cycle yields 1.
pub fn motion_scale(mode: RenderMode, cycles: u32, cycle_ms: f64, duration_ms: f64) -> f64 {
    if mode == RenderMode::Composite || !cycle_ms.is_finite() || cycle_ms <= 0.0 {
        return 1.0;
    }
    (f64::from(cycles) * cycle_ms / duration_ms.max(1.0)).max(1.0)
}

/// Render every frame of an export clip.
///
/// Returns `Ok(None)` when there is no source or no scene, and a validation error when `config`
/// is unusable.
#[tracing::instrument(skip(inputs, config, progress))]
pub fn capture_frames(
    inputs: CaptureInputs<'_>,
    mode: RenderMode,
    config: &ExportConfig,
    range: ProgressRange,
    progress: &mut dyn ProgressSink,
) -> ScanResult<Option<BuiltFrameSet>> {
    config.validate()?;
    let (Some(source), Some(scene)) = (inputs.source, inputs.scene) else {
        return Ok(None);
    };
    if scene.img_w == 0 || scene.img_h == 0 {
        return Ok(None);
    }

    let duration_secs = config.duration_secs();
    let span = f64::from(range.span().max(1));
    let (width, height) = export_dimensions(source.width, source.height, config.max_side);
    let scene_scale = f64::from(width) / f64::from(scene.img_w);
    let fps = config.fps;
    let total = fps.frames_for_secs(duration_secs);

    let cycle_ms = wave_cycle_ms(inputs.settings, scene_scale, scene.img_h);
    let motion = motion_scale(mode, config.overlay_cycles, cycle_ms, duration_secs * 1000.0);
    let start_ms = find_best_start_ms(inputs.now_ms, duration_secs, scene, inputs.settings, scene_scale);
    tracing::debug!(width, height, total, start_ms, motion, "capture started");

    let canvas = Canvas { width, height };
    let renderer = FrameRenderer::new(FrameInputs {
        source,
        scene,
        settings: inputs.settings,
        theme: inputs.theme,
        mode,
        canvas,
        placement: Placement {
            img_w: width,
            img_h: height,
            offset_x: 0,
            offset_y: 0,
        },
    })?;

    progress.capture_preview(Some(0));
    let frame_ms = fps.frame_duration_ms();
    let mut surface = vec![0u8; canvas.rgba_len()];
    let mut frames = Vec::with_capacity(total);
    for i in 0..total {
        let t = start_ms + i as f64 * frame_ms * motion;
        renderer.render_into(t, &mut surface);
        frames.push(surface.clone());

        if i % 2 == 0 {
            let ratio = (i + 1) as f64 / total as f64;
            progress.capture_preview(Some((ratio * 100.0).round().clamp(0.0, 100.0) as u32));
            let stage = i as f64 / total as f64 * CAPTURE_SHARE;
            progress.progress(range.start + (span * stage).round() as u32);
            progress.yield_now();
        }
    }
    progress.capture_preview(Some(100));

    Ok(Some(BuiltFrameSet {
        frames,
        width,
        height,
        fps,
        delay_ms: fps.delay_ms(),
        duration_secs,
        encode_range: ProgressRange::new(range.start + (span * CAPTURE_SHARE).round() as u32, range.end),
    }))
}

#[cfg(test)]
#[path = "../../tests/unit/export/capture.rs"]
mod tests;
