//! scanfield turns a still image into an animated "depth scanner" point field.
//!
//! The image is sampled on a coarse grid; a horizontal band sweeps through the samples, lifting
//! them by brightness and wobbling them with a low-frequency wave. Everything is a pure function
//! of `(scene, settings, time)`, which is what makes loop-aware export possible:
//!
//! - Build a [`Scene`] from a [`SourceImage`] (usually via [`scene_for_viewport`])
//! - Drive a live [`PreviewSession`] or render single frames with [`FrameRenderer`]
//! - Export GIF/MP4 clips with an [`Exporter`], delivered through a [`ShareTarget`] or
//!   [`DownloadTarget`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod animation;
mod deliver;
mod encode;
mod export;
mod foundation;
mod render;
mod scene;
mod settings;

pub use crate::foundation::core::{Canvas, Fps, Rgb8};
pub use crate::foundation::error::{ScanError, ScanResult};

pub use crate::settings::normalize::{Settings, normalize_settings};
pub use crate::settings::store::{
    FileStore, KeyValueStore, MemoryStore, SETTINGS_KEY, SettingsManager,
};
pub use crate::settings::theme::Theme;

pub use crate::scene::build::{
    ALPHA_THRESHOLD, MIN_SPACING, NoiseFn, Sample, Scene, build_samples, build_samples_with,
    noise_from_coords, spacing_for_block_size,
};
pub use crate::scene::layout::{Placement, fit_to_viewport, scene_for_viewport};
pub use crate::scene::source::SourceImage;

pub use crate::animation::loop_search::{
    ACTIVITY_SAMPLE_BUDGET, CANDIDATES, SAMPLE_STEPS, StartCandidate, aligned_start_ms,
    estimate_activity, find_best_start_ms, score_candidates, wave_cycle_ms,
};
pub use crate::animation::wave::{
    CYCLE_PADDING, Lit, PIXELS_PER_SECOND, VISIBILITY_FLOOR, WaveFrame, cycle_px, tint,
};

pub use crate::render::frame::{
    FrameInputs, FrameRGBA, FrameRenderer, RenderMode, encode_png_rgba8, render_frame,
};
pub use crate::render::session::{PreviewSession, PreviewStatus};

pub use crate::export::capture::{
    BuiltFrameSet, CaptureInputs, ExportConfig, MIN_EXPORT_SECONDS, capture_frames,
    export_dimensions, motion_scale,
};
pub use crate::export::pipeline::{
    EXPORT_TITLE, ExportFormat, ExportOutcome, ExportRequest, ExportType, Exporter,
    artifact_name,
};
pub use crate::export::progress::{NoProgress, ProgressRange, ProgressSink, RecordingProgress};

pub use crate::encode::gif::{PALETTE_COLORS, encode_gif, palette_frame_index};
pub use crate::encode::video::{
    CodecBackend, FRAME_PATTERN, SystemFfmpeg, VideoEngine, h264_args, is_ffmpeg_on_path,
    mpeg4_args,
};

pub use crate::deliver::artifact::{BUNDLE_NAME, ExportArtifact, bundle_zip, infer_media_type};
pub use crate::deliver::target::{
    DeliveryOutcome, DirectoryDownload, DownloadTarget, NoShare, ShareResult, ShareTarget,
    deliver_files,
};
