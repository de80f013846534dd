use crate::foundation::error::{ScanError, ScanResult};

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> ScanResult<Self> {
        if den == 0 {
            return Err(ScanError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(ScanError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in milliseconds.
    pub fn frame_duration_ms(self) -> f64 {
        f64::from(self.den) / f64::from(self.num) * 1000.0
    }

    /// Number of frames covering `secs`, rounded to nearest and never below one.
    pub fn frames_for_secs(self, secs: f64) -> usize {
        (secs * self.as_f64()).round().max(1.0) as usize
    }

    /// Per-frame delay in whole milliseconds, as stored by animated image formats.
    pub fn delay_ms(self) -> u32 {
        self.frame_duration_ms().round() as u32
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize) * (self.height as usize) * 4
    }
}

/// Straight 8-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb8 {
    /// Construct from channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
