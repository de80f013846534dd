use std::path::Path;
use std::sync::Arc;

use crate::foundation::error::{ScanError, ScanResult};

/// Decoded source image as straight-alpha RGBA8.
#[derive(Clone, Debug)]
pub struct SourceImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Straight RGBA8, row-major, tightly packed.
    pub rgba8: Arc<Vec<u8>>,
}

impl SourceImage {
    /// Wrap an existing RGBA8 buffer.
    pub fn from_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> ScanResult<Self> {
        if width == 0 || height == 0 {
            return Err(ScanError::validation("source image must be non-empty"));
        }
        if rgba8.len() != (width as usize) * (height as usize) * 4 {
            return Err(ScanError::validation(
                "source rgba8 length must equal width*height*4",
            ));
        }
        Ok(Self {
            width,
            height,
            rgba8: Arc::new(rgba8),
        })
    }

    /// Decode any raster format supported by `image`.
    pub fn decode(bytes: &[u8]) -> ScanResult<Self> {
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|e| ScanError::decode(format!("decode image from memory: {e}")))?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// Read and decode an image file.
    pub fn open(path: &Path) -> ScanResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| ScanError::decode(format!("read image '{}': {e}", path.display())))?;
        Self::decode(&bytes)
    }

    /// Resample to `width`x`height` (triangle filter). Returns a cheap clone when the size is
    /// unchanged.
    pub fn resized(&self, width: u32, height: u32) -> ScanResult<Self> {
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        let img = image::RgbaImage::from_raw(self.width, self.height, self.rgba8.to_vec())
            .ok_or_else(|| ScanError::surface("source buffer does not match its dimensions"))?;
        let out = image::imageops::resize(
            &img,
            width.max(1),
            height.max(1),
            image::imageops::FilterType::Triangle,
        );
        let (w, h) = out.dimensions();
        Self::from_rgba8(w, h, out.into_raw())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/source.rs"]
mod tests;
