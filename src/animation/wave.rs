//! Time-continuous scan wave over a [`Scene`](crate::Scene).
//!
//! Everything here is pure: a [`WaveFrame`] is a snapshot of the wave at one timestamp and can be
//! queried for any number of samples.

use crate::foundation::core::Rgb8;
use crate::foundation::math::{clamp_u8, rem_trunc};
use crate::scene::build::Sample;
use crate::settings::normalize::Settings;

/// Samples whose final intensity is at or below this are not drawn.
pub const VISIBILITY_FLOOR: f64 = 0.05;

/// Scan speed in pixels per second at `speed == 1` and scale 1.
pub const PIXELS_PER_SECOND: f64 = 200.0;

/// Extra travel (in unscaled pixels) added to each cycle; half of it is spent above the image.
pub const CYCLE_PADDING: f64 = 1000.0;

const PATCH_FREQ: f64 = 0.01;
const PATCH_AMPLITUDE: f64 = 100.0;
const EDGE_GLOW: f64 = 2.0;
const SPARKLE_BOOST: f64 = 1.5;
const SPARKLE_MIN_INTENSITY: f64 = 0.5;
const SPARKLE_THRESHOLD: f64 = 0.72;

/// Length of one wave cycle in scaled pixels.
pub fn cycle_px(draw_h: f64, depth: f64, scale: f64) -> f64 {
    (draw_h + depth * scale * 2.0 + CYCLE_PADDING * scale).max(1.0)
}

/// A visible sample: its shaped intensity and final draw color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lit {
    /// Shaped intensity (edge glow may push this above 1).
    pub intensity: f64,
    /// Tinted, intensity-scaled color.
    pub color: Rgb8,
}

/// The wave evaluated at one timestamp for one output scale.
#[derive(Clone, Copy, Debug)]
pub struct WaveFrame {
    scale_x: f64,
    scale_y: f64,
    depth: f64,
    thickness: f64,
    density: f64,
    edge_focus: f64,
    t: f64,
    time_ms: f64,
    phase: f64,
}

impl WaveFrame {
    /// Snapshot the wave for a draw rect of height `draw_h` whose samples are scaled by
    /// `(scale_x, scale_y)` from scene space.
    pub fn new(settings: &Settings, scale_x: f64, scale_y: f64, draw_h: f64, time_ms: f64) -> Self {
        let depth = settings.depth * scale_y;
        let t = time_ms * 0.001 * settings.speed;
        let cycle = cycle_px(draw_h, settings.depth, scale_y);
        let phase = rem_trunc(t * PIXELS_PER_SECOND * scale_y, cycle) - CYCLE_PADDING * 0.5 * scale_y;
        Self {
            scale_x,
            scale_y,
            depth,
            thickness: (settings.thickness * scale_y).max(1.0),
            density: settings.density,
            edge_focus: settings.edge_focus,
            t,
            time_ms,
            phase,
        }
    }

    /// Same scale on both axes, for a scene of height `img_h`.
    pub fn uniform(settings: &Settings, scale: f64, img_h: u32, time_ms: f64) -> Self {
        Self::new(settings, scale, scale, f64::from(img_h) * scale, time_ms)
    }

    /// Current scan-line position in scaled pixels.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Static density gate. Independent of time.
    pub fn is_candidate(&self, s: &Sample) -> bool {
        s.noise <= self.density + s.edge * self.edge_focus
    }

    /// Sample y after depth lift and the secondary "patch" oscillation.
    pub fn effective_y(&self, s: &Sample) -> f64 {
        let x = s.x * self.scale_x;
        let y = s.y * self.scale_y;
        let patch = (x * PATCH_FREQ + self.t).sin()
            * (y * PATCH_FREQ - self.t).cos()
            * (PATCH_AMPLITUDE * self.scale_y);
        y - s.brightness * self.depth + patch
    }

    /// Linear falloff `1 - dist/thickness` for candidates inside the band.
    pub fn band_falloff(&self, s: &Sample) -> Option<f64> {
        if !self.is_candidate(s) {
            return None;
        }
        let dist = (self.effective_y(s) - self.phase).abs();
        if dist >= self.thickness {
            return None;
        }
        Some(1.0 - dist / self.thickness)
    }

    /// Fully shaped intensity, or `None` if the sample is invisible this frame.
    pub fn intensity(&self, s: &Sample) -> Option<f64> {
        let falloff = self.band_falloff(s)?;
        let mut intensity = falloff * falloff;
        intensity *= 1.0 + s.edge * self.edge_focus * EDGE_GLOW;

        let sparkle = (self.time_ms * 0.022 + s.noise * 50.0 + s.x * 0.003).sin();
        if intensity > SPARKLE_MIN_INTENSITY && sparkle > SPARKLE_THRESHOLD {
            intensity *= SPARKLE_BOOST;
        }

        (intensity > VISIBILITY_FLOOR).then_some(intensity)
    }

    /// Intensity plus tinted color for a visible sample.
    pub fn shade(&self, s: &Sample, theme: Rgb8) -> Option<Lit> {
        let intensity = self.intensity(s)?;
        Some(Lit {
            intensity,
            color: tint(s, theme, intensity),
        })
    }

    /// Scaled top-left corner of a sample in draw-rect space.
    pub fn position(&self, s: &Sample) -> (f64, f64) {
        (s.x * self.scale_x, s.y * self.scale_y)
    }
}

/// `(sample * 0.3 + theme * 0.7) * intensity`, clamped to 8 bits.
pub fn tint(s: &Sample, theme: Rgb8, intensity: f64) -> Rgb8 {
    let mix = |sc: u8, tc: u8| clamp_u8((f64::from(sc) * 0.3 + f64::from(tc) * 0.7) * intensity);
    Rgb8::new(mix(s.r, theme.r), mix(s.g, theme.g), mix(s.b, theme.b))
}

#[cfg(test)]
#[path = "../../tests/unit/animation/wave.rs"]
mod tests;
