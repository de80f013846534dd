use crate::foundation::core::Canvas;
use crate::foundation::error::ScanResult;
use crate::scene::build::Scene;
use crate::scene::source::SourceImage;

/// Placement of the fitted image inside a viewport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Fitted image width.
    pub img_w: u32,
    /// Fitted image height.
    pub img_h: u32,
    /// Left edge inside the viewport.
    pub offset_x: i32,
    /// Top edge inside the viewport.
    pub offset_y: i32,
}

/// Fit `source` inside `viewport`, preserving aspect ratio and centering.
///
/// Returns `None` for a zero-area viewport.
pub fn fit_to_viewport(source_w: u32, source_h: u32, viewport: Canvas) -> Option<Placement> {
    if viewport.width == 0 || viewport.height == 0 || source_w == 0 || source_h == 0 {
        return None;
    }
    let (vw, vh) = (f64::from(viewport.width), f64::from(viewport.height));
    let scale = (vw / f64::from(source_w)).min(vh / f64::from(source_h));
    let img_w = ((f64::from(source_w) * scale).floor() as u32).max(1);
    let img_h = ((f64::from(source_h) * scale).floor() as u32).max(1);
    Some(Placement {
        img_w,
        img_h,
        offset_x: ((vw - f64::from(img_w)) / 2.0).floor() as i32,
        offset_y: ((vh - f64::from(img_h)) / 2.0).floor() as i32,
    })
}

/// Fit, resample and sample `source` for display inside `viewport`.
///
/// `Ok(None)` means there is nothing to draw into (zero-area viewport).
pub fn scene_for_viewport(
    source: &SourceImage,
    viewport: Canvas,
    block_size: f64,
) -> ScanResult<Option<Scene>> {
    let Some(p) = fit_to_viewport(source.width, source.height, viewport) else {
        return Ok(None);
    };
    let fitted = source.resized(p.img_w, p.img_h)?;
    Scene::build(
        &fitted.rgba8,
        p.img_w,
        p.img_h,
        p.offset_x,
        p.offset_y,
        block_size,
    )
    .map(Some)
}

#[cfg(test)]
#[path = "../../tests/unit/scene/layout.rs"]
mod tests;
