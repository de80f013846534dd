use crate::foundation::core::Canvas;
use crate::foundation::error::ScanResult;
use crate::render::frame::{FrameInputs, FrameRGBA, FrameRenderer, RenderMode};
use crate::scene::build::{Scene, spacing_for_block_size};
use crate::scene::layout::{Placement, fit_to_viewport};
use crate::scene::source::SourceImage;
use crate::settings::normalize::Settings;
use crate::settings::theme::Theme;

/// What the preview surface should show right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PreviewStatus {
    /// No source yet.
    Loading,
    /// The last source failed to load.
    Failed(String),
    /// A scene is available.
    Ready,
}

/// Owned live-preview loop.
///
/// The host drives [`PreviewSession::tick`] from its refresh callback. Any change to the source,
/// viewport, settings or theme stops the loop; the host calls [`PreviewSession::start`] again
/// once it has applied its changes, so a stale loop never keeps drawing old inputs.
#[derive(Debug)]
pub struct PreviewSession {
    viewport: Canvas,
    settings: Settings,
    theme: Theme,

    source: Option<SourceImage>,
    fitted: Option<(SourceImage, Placement)>,
    scene: Option<Scene>,
    error: Option<String>,

    running: bool,
    generation: u64,
    started_ms: Option<f64>,
    last_frame_ms: Option<f64>,
}

impl PreviewSession {
    /// Create an idle session with no source.
    pub fn new(viewport: Canvas, settings: Settings, theme: Theme) -> Self {
        Self {
            viewport,
            settings,
            theme,
            source: None,
            fitted: None,
            scene: None,
            error: None,
            running: false,
            generation: 0,
            started_ms: None,
            last_frame_ms: None,
        }
    }

    /// Decode and install a new source. On failure the previous scene is dropped and the error
    /// is kept for [`PreviewSession::status`].
    pub fn load_source(&mut self, bytes: &[u8]) -> ScanResult<()> {
        self.stop();
        match SourceImage::decode(bytes) {
            Ok(src) => self.set_source(src),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load scene");
                self.source = None;
                self.fitted = None;
                self.scene = None;
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Install an already decoded source and rebuild the scene.
    pub fn set_source(&mut self, source: SourceImage) -> ScanResult<()> {
        self.stop();
        self.source = Some(source);
        self.error = None;
        self.rebuild()
    }

    /// Resize the preview surface; rebuilds the scene.
    pub fn set_viewport(&mut self, viewport: Canvas) -> ScanResult<()> {
        self.stop();
        if viewport == self.viewport {
            return Ok(());
        }
        self.viewport = viewport;
        self.rebuild()
    }

    /// Replace the settings snapshot; the scene is rebuilt only if the grid spacing changed.
    pub fn set_settings(&mut self, settings: Settings) -> ScanResult<()> {
        self.stop();
        let respace =
            spacing_for_block_size(settings.block_size) != spacing_for_block_size(self.settings.block_size);
        self.settings = settings;
        if respace {
            self.rebuild()?;
        }
        Ok(())
    }

    /// Replace the tint.
    pub fn set_theme(&mut self, theme: Theme) {
        self.stop();
        self.theme = theme;
    }

    /// Start (or restart) the loop at `now_ms`. Returns `false` when there is nothing to draw.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.scene.is_none() {
            return false;
        }
        self.running = true;
        self.generation += 1;
        self.started_ms = Some(now_ms);
        true
    }

    /// When the current (or last) loop was started.
    pub fn started_ms(&self) -> Option<f64> {
        self.started_ms
    }

    /// Cancel the loop. Idempotent.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether ticks currently produce frames.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Incremented on every successful start; lets hosts drop callbacks from older loops.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Timestamp of the last rendered tick.
    pub fn last_frame_ms(&self) -> Option<f64> {
        self.last_frame_ms
    }

    /// Current status for the host UI.
    pub fn status(&self) -> PreviewStatus {
        match (&self.scene, &self.error) {
            (_, Some(e)) => PreviewStatus::Failed(e.clone()),
            (Some(_), None) => PreviewStatus::Ready,
            (None, None) => PreviewStatus::Loading,
        }
    }

    /// Original, full-resolution source.
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// Current scene.
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Current tint.
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Render one composite frame for `now_ms`, or `None` while stopped.
    pub fn tick(&mut self, now_ms: f64) -> ScanResult<Option<FrameRGBA>> {
        if !self.running {
            return Ok(None);
        }
        let (Some(scene), Some((fitted, placement))) = (&self.scene, &self.fitted) else {
            self.running = false;
            return Ok(None);
        };
        let renderer = FrameRenderer::new(FrameInputs {
            source: fitted,
            scene,
            settings: &self.settings,
            theme: self.theme.rgb(),
            mode: RenderMode::Composite,
            canvas: self.viewport,
            placement: *placement,
        })?;
        self.last_frame_ms = Some(now_ms);
        Ok(Some(renderer.render(now_ms)))
    }

    fn rebuild(&mut self) -> ScanResult<()> {
        self.scene = None;
        self.fitted = None;
        let Some(src) = &self.source else {
            return Ok(());
        };
        let Some(p) = fit_to_viewport(src.width, src.height, self.viewport) else {
            return Ok(());
        };
        let fitted = src.resized(p.img_w, p.img_h)?;
        let scene = Scene::build(
            &fitted.rgba8,
            p.img_w,
            p.img_h,
            p.offset_x,
            p.offset_y,
            self.settings.block_size,
        )?;
        self.scene = Some(scene);
        self.fitted = Some((fitted, p));
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/session.rs"]
mod tests;
