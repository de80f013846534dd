use std::borrow::Cow;

use color_quant::NeuQuant;

use crate::export::capture::BuiltFrameSet;
use crate::export::progress::ProgressSink;
use crate::foundation::error::{ScanError, ScanResult};

/// Palette size for every exported GIF.
pub const PALETTE_COLORS: usize = 256;

/// NeuQuant sampling factor (1 is slowest and best, 30 fastest).
const QUANT_SAMPLE_FACTOR: i32 = 10;

/// Which frame the shared palette is learned from, as a fraction of the clip.
const PALETTE_FRAME_AT: f64 = 0.6;

/// Index of the frame used to build the palette.
pub fn palette_frame_index(frame_count: usize) -> usize {
    let i = (frame_count as f64 * PALETTE_FRAME_AT).floor() as usize;
    if i < frame_count { i } else { 0 }
}

/// Encode a frame set as an infinitely looping GIF with one global palette.
#[tracing::instrument(skip(set, progress), fields(frames = set.frames.len(), width = set.width, height = set.height))]
pub fn encode_gif(set: &BuiltFrameSet, progress: &mut dyn ProgressSink) -> ScanResult<Vec<u8>> {
    let expected = set.width as usize * set.height as usize * 4;
    if set.frames.is_empty() {
        return Err(ScanError::validation("gif needs at least one frame"));
    }
    if set.frames.iter().any(|f| f.len() != expected) {
        return Err(ScanError::validation(
            "gif frame length must equal width*height*4",
        ));
    }
    let width = u16::try_from(set.width)
        .map_err(|_| ScanError::encode("gif width exceeds 65535"))?;
    let height = u16::try_from(set.height)
        .map_err(|_| ScanError::encode("gif height exceeds 65535"))?;

    let sample = &set.frames[palette_frame_index(set.frames.len())];
    let quant = NeuQuant::new(QUANT_SAMPLE_FACTOR, PALETTE_COLORS, sample);
    let palette = quant.color_map_rgb();
    let delay_cs = (f64::from(set.delay_ms) / 10.0).round() as u16;

    let range = set.encode_range;
    let span = f64::from(range.span().max(1));
    let total = set.frames.len() as f64;

    let mut out = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut out, width, height, &palette)
            .map_err(|e| ScanError::encode(format!("gif header: {e}")))?;
        enc.set_repeat(gif::Repeat::Infinite)
            .map_err(|e| ScanError::encode(format!("gif repeat: {e}")))?;

        for (i, rgba) in set.frames.iter().enumerate() {
            let indices: Vec<u8> = rgba
                .chunks_exact(4)
                .map(|px| quant.index_of(px) as u8)
                .collect();
            let frame = gif::Frame {
                width,
                height,
                delay: delay_cs,
                buffer: Cow::Owned(indices),
                ..gif::Frame::default()
            };
            enc.write_frame(&frame)
                .map_err(|e| ScanError::encode(format!("gif frame {i}: {e}")))?;

            if i % 4 == 0 {
                progress.progress(range.start + (i as f64 / total * span).round() as u32);
                progress.yield_now();
            }
        }
    }

    tracing::debug!(bytes = out.len(), "gif encoded");
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
