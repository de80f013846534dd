use crate::foundation::error::{ScanError, ScanResult};
use crate::foundation::math::{fract, luma};

/// Alpha values below this are treated as "no data".
pub const ALPHA_THRESHOLD: u8 = 8;

/// Smallest usable grid spacing in pixels.
pub const MIN_SPACING: u32 = 2;

/// Coordinate hash signature: `(x, y, width, height) -> [0, 1)`.
pub type NoiseFn = fn(f64, f64, f64, f64) -> f64;

/// One grid-aligned point of the field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Grid origin x, in scene image pixels.
    pub x: f64,
    /// Grid origin y, in scene image pixels.
    pub y: f64,
    /// Source red.
    pub r: u8,
    /// Source green.
    pub g: u8,
    /// Source blue.
    pub b: u8,
    /// Luma in `[0, 1]`.
    pub brightness: f64,
    /// Sum of absolute luma differences to the right/below neighbors (0 on the boundary).
    pub edge: f64,
    /// Stable per-position pseudo-random value in `[0, 1)`.
    pub noise: f64,
}

/// Quantized sample field built from one image at one viewport layout.
#[derive(Clone, Debug)]
pub struct Scene {
    /// Samples in row-major grid order.
    pub samples: Vec<Sample>,
    /// Width of the image the samples were taken from.
    pub img_w: u32,
    /// Height of the image the samples were taken from.
    pub img_h: u32,
    /// Horizontal draw offset of the image inside its viewport.
    pub offset_x: i32,
    /// Vertical draw offset of the image inside its viewport.
    pub offset_y: i32,
    /// Grid spacing the samples were built with.
    pub spacing: u32,
}

/// Sine-based spatial hash. Same inputs always give bit-identical output.
pub fn noise_from_coords(x: f64, y: f64, width: f64, height: f64) -> f64 {
    let nx = x / width.max(1.0);
    let ny = y / height.max(1.0);
    let seed = (nx * 91.345 + ny * 47.123 + (x + y) * 0.013).sin() * 43_758.545_312_3;
    fract(seed)
}

/// Effective grid spacing for a (possibly fractional) block size setting.
pub fn spacing_for_block_size(block_size: f64) -> u32 {
    if !block_size.is_finite() {
        return MIN_SPACING;
    }
    (block_size.floor().max(f64::from(MIN_SPACING))) as u32
}

/// Walk the grid and produce samples using [`noise_from_coords`].
pub fn build_samples(rgba8: &[u8], width: u32, height: u32, spacing: u32) -> ScanResult<Vec<Sample>> {
    build_samples_with(rgba8, width, height, spacing, noise_from_coords)
}

/// Walk the grid and produce samples, with a caller-provided noise hash.
pub fn build_samples_with(
    rgba8: &[u8],
    width: u32,
    height: u32,
    spacing: u32,
    noise: NoiseFn,
) -> ScanResult<Vec<Sample>> {
    let (w, h) = (width as usize, height as usize);
    if rgba8.len() != w * h * 4 {
        return Err(ScanError::validation(
            "scene rgba8 length must equal width*height*4",
        ));
    }
    let step = spacing.max(MIN_SPACING) as usize;
    let luma_at = |x: usize, y: usize| {
        let i = (y * w + x) * 4;
        luma(rgba8[i], rgba8[i + 1], rgba8[i + 2])
    };

    let mut out = Vec::with_capacity(w.div_ceil(step) * h.div_ceil(step));
    for y in (0..h).step_by(step) {
        for x in (0..w).step_by(step) {
            let i = (y * w + x) * 4;
            if rgba8[i + 3] < ALPHA_THRESHOLD {
                continue;
            }

            let brightness = luma_at(x, y);
            let edge = if x + step < w && y + step < h {
                (brightness - luma_at(x + step, y)).abs() + (brightness - luma_at(x, y + step)).abs()
            } else {
                0.0
            };

            let (fx, fy) = (x as f64, y as f64);
            out.push(Sample {
                x: fx,
                y: fy,
                r: rgba8[i],
                g: rgba8[i + 1],
                b: rgba8[i + 2],
                brightness,
                edge,
                noise: noise(fx, fy, w as f64, h as f64),
            });
        }
    }
    Ok(out)
}

impl Scene {
    /// Build a scene from an image already sized to its draw rect.
    pub fn build(
        rgba8: &[u8],
        img_w: u32,
        img_h: u32,
        offset_x: i32,
        offset_y: i32,
        block_size: f64,
    ) -> ScanResult<Self> {
        let spacing = spacing_for_block_size(block_size);
        let samples = build_samples(rgba8, img_w, img_h, spacing)?;
        tracing::debug!(samples = samples.len(), img_w, img_h, spacing, "scene built");
        Ok(Self {
            samples,
            img_w,
            img_h,
            offset_x,
            offset_y,
            spacing,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` when every grid origin was transparent.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/build.rs"]
mod tests;
