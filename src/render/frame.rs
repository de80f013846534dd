use std::io::Cursor;
use std::path::Path;

use anyhow::Context as _;

use crate::animation::wave::WaveFrame;
use crate::foundation::core::{Canvas, Rgb8};
use crate::foundation::error::{ScanError, ScanResult};
use crate::foundation::math::mul_div255_u16;
use crate::scene::build::Scene;
use crate::scene::layout::Placement;
use crate::scene::source::SourceImage;
use crate::settings::normalize::Settings;

/// Visible share of each block; the rest is left as grid gap.
const BLOCK_FILL: f64 = 0.8;

/// How the background is painted under the point field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderMode {
    /// Black background only, for additive layering onto other footage.
    Overlay,
    /// Source image under a dark scrim, as a self-contained render.
    Composite,
}

/// A rendered frame as opaque RGBA8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Encode as PNG bytes.
    pub fn encode_png(&self) -> ScanResult<Vec<u8>> {
        encode_png_rgba8(&self.data, self.width, self.height)
    }

    /// Write as a PNG file, creating parent directories.
    pub fn save_png(&self, path: &Path) -> ScanResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

/// Encode a raw RGBA8 buffer as PNG.
pub fn encode_png_rgba8(data: &[u8], width: u32, height: u32) -> ScanResult<Vec<u8>> {
    use image::ImageEncoder as _;
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(Cursor::new(&mut out))
        .write_image(data, width, height, image::ExtendedColorType::Rgba8)
        .map_err(|e| ScanError::encode(format!("png encode failed: {e}")))?;
    Ok(out)
}

/// Everything a frame depends on except time.
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs<'a> {
    /// Original image (drawn under the field in composite mode).
    pub source: &'a SourceImage,
    /// Sample field.
    pub scene: &'a Scene,
    /// Settings snapshot.
    pub settings: &'a Settings,
    /// Tint color.
    pub theme: Rgb8,
    /// Background treatment.
    pub mode: RenderMode,
    /// Output frame size.
    pub canvas: Canvas,
    /// Where the image lands inside the canvas.
    pub placement: Placement,
}

/// Renders frames for fixed inputs, caching the static backdrop between timestamps.
pub struct FrameRenderer<'a> {
    inputs: FrameInputs<'a>,
    backdrop: Vec<u8>,
    scale_x: f64,
    scale_y: f64,
    block_side: f64,
}

impl<'a> FrameRenderer<'a> {
    /// Validate inputs and paint the time-invariant background once.
    pub fn new(inputs: FrameInputs<'a>) -> ScanResult<Self> {
        let FrameInputs {
            canvas,
            placement,
            scene,
            ..
        } = inputs;
        if canvas.width == 0 || canvas.height == 0 {
            return Err(ScanError::surface("drawing surface must be non-empty"));
        }
        if scene.img_w == 0 || scene.img_h == 0 || placement.img_w == 0 || placement.img_h == 0 {
            return Err(ScanError::surface("scene and draw rect must be non-empty"));
        }

        let scale_x = f64::from(placement.img_w) / f64::from(scene.img_w);
        let scale_y = f64::from(placement.img_h) / f64::from(scene.img_h);
        let avg_scale = (scale_x + scale_y) * 0.5;
        let block_px = (inputs.settings.block_size * avg_scale).floor().max(2.0);

        let backdrop = paint_backdrop(&inputs)?;
        Ok(Self {
            inputs,
            backdrop,
            scale_x,
            scale_y,
            block_side: block_px * BLOCK_FILL,
        })
    }

    /// Output frame size.
    pub fn canvas(&self) -> Canvas {
        self.inputs.canvas
    }

    /// Render a fresh frame at `time_ms`.
    pub fn render(&self, time_ms: f64) -> FrameRGBA {
        let mut data = vec![0u8; self.inputs.canvas.rgba_len()];
        self.render_into(time_ms, &mut data);
        FrameRGBA {
            width: self.inputs.canvas.width,
            height: self.inputs.canvas.height,
            data,
        }
    }

    /// Render into a reusable surface of `width*height*4` bytes.
    pub fn render_into(&self, time_ms: f64, surface: &mut [u8]) {
        surface.copy_from_slice(&self.backdrop);

        let FrameInputs {
            scene,
            settings,
            theme,
            canvas,
            placement,
            ..
        } = self.inputs;
        let wave = WaveFrame::new(
            settings,
            self.scale_x,
            self.scale_y,
            f64::from(placement.img_h),
            time_ms,
        );
        let ox = f64::from(placement.offset_x);
        let oy = f64::from(placement.offset_y);

        for s in &scene.samples {
            let Some(lit) = wave.shade(s, theme) else {
                continue;
            };
            let (x, y) = wave.position(s);
            fill_rect_additive(surface, canvas, ox + x, oy + y, self.block_side, lit.color);
        }
    }
}

/// One-shot pure render: `(inputs, time) -> pixels`.
pub fn render_frame(inputs: FrameInputs<'_>, time_ms: f64) -> ScanResult<FrameRGBA> {
    Ok(FrameRenderer::new(inputs)?.render(time_ms))
}

fn paint_backdrop(inputs: &FrameInputs<'_>) -> ScanResult<Vec<u8>> {
    let canvas = inputs.canvas;
    let mut out = [0u8, 0, 0, 255].repeat(canvas.width as usize * canvas.height as usize);
    if inputs.mode == RenderMode::Overlay {
        return Ok(out);
    }

    let p = inputs.placement;
    let fitted = inputs.source.resized(p.img_w, p.img_h)?;
    let keep = ((1.0 - inputs.settings.bg_darken).clamp(0.0, 1.0) * 255.0).round() as u16;
    let (cw, ch) = (canvas.width as i64, canvas.height as i64);

    for sy in 0..i64::from(p.img_h) {
        let dy = sy + i64::from(p.offset_y);
        if dy < 0 || dy >= ch {
            continue;
        }
        for sx in 0..i64::from(p.img_w) {
            let dx = sx + i64::from(p.offset_x);
            if dx < 0 || dx >= cw {
                continue;
            }
            let si = ((sy * i64::from(p.img_w) + sx) * 4) as usize;
            let di = ((dy * cw + dx) * 4) as usize;
            let a = u16::from(fitted.rgba8[si + 3]);
            for c in 0..3 {
                // Source-over onto black, then the scrim.
                let over_black = mul_div255_u16(u16::from(fitted.rgba8[si + c]), a);
                out[di + c] = mul_div255_u16(over_black, keep) as u8;
            }
        }
    }
    Ok(out)
}

fn fill_rect_additive(surface: &mut [u8], canvas: Canvas, x: f64, y: f64, side: f64, color: Rgb8) {
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let x0 = x.round().clamp(0.0, cw) as usize;
    let y0 = y.round().clamp(0.0, ch) as usize;
    let mut x1 = (x + side).round().clamp(0.0, cw) as usize;
    let mut y1 = (y + side).round().clamp(0.0, ch) as usize;
    if x1 == x0 && x0 < canvas.width as usize && x + side > 0.0 {
        x1 = x0 + 1;
    }
    if y1 == y0 && y0 < canvas.height as usize && y + side > 0.0 {
        y1 = y0 + 1;
    }

    let stride = canvas.width as usize * 4;
    for row in y0..y1 {
        let line = &mut surface[row * stride..(row + 1) * stride];
        for px in line[x0 * 4..x1 * 4].chunks_exact_mut(4) {
            px[0] = px[0].saturating_add(color.r);
            px[1] = px[1].saturating_add(color.g);
            px[2] = px[2].saturating_add(color.b);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
