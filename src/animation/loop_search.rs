use crate::animation::wave::{PIXELS_PER_SECOND, WaveFrame, cycle_px};
use crate::foundation::math::rem_pos;
use crate::scene::build::Scene;
use crate::settings::normalize::Settings;

/// Candidate start times evaluated per search.
pub const CANDIDATES: usize = 14;
/// Activity samples taken across the clip for each candidate.
pub const SAMPLE_STEPS: usize = 10;
/// Upper bound on samples inspected per activity estimate.
pub const ACTIVITY_SAMPLE_BUDGET: usize = 5000;

const ACTIVITY_FLOOR: f64 = 0.08;

fn speed_px_per_sec(speed: f64, scale: f64) -> f64 {
    speed.max(0.0001) * PIXELS_PER_SECOND * scale
}

/// Duration of one wave cycle in milliseconds. May be non-finite for a zero scale.
pub fn wave_cycle_ms(settings: &Settings, scale: f64, img_h: u32) -> f64 {
    let draw_h = f64::from(img_h) * scale;
    cycle_px(draw_h, settings.depth, scale) / speed_px_per_sec(settings.speed, scale) * 1000.0
}

/// First timestamp at or after `now_ms` where the wave phase is at its reset point.
pub fn aligned_start_ms(now_ms: f64, settings: &Settings, scale: f64, img_h: u32) -> f64 {
    let draw_h = f64::from(img_h) * scale;
    let per_sec = speed_px_per_sec(settings.speed, scale);
    let cycle = cycle_px(draw_h, settings.depth, scale);
    let raw_now = rem_pos(now_ms * 0.001 * per_sec, cycle);
    let delta = rem_pos(cycle - raw_now, cycle);
    now_ms + delta / per_sec * 1000.0
}

/// Coarse visible-activity estimate at one timestamp.
///
/// Uses the unshaped band falloff on a strided subset of samples; cheaper than a full render.
pub fn estimate_activity(scene: &Scene, settings: &Settings, scale: f64, time_ms: f64) -> f64 {
    let wave = WaveFrame::uniform(settings, scale, scene.img_h, time_ms);
    let stride = (scene.samples.len() / ACTIVITY_SAMPLE_BUDGET).max(1);
    scene
        .samples
        .iter()
        .step_by(stride)
        .filter_map(|s| wave.band_falloff(s))
        .filter(|&v| v > ACTIVITY_FLOOR)
        .sum()
}

/// One evaluated start candidate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StartCandidate {
    /// Candidate start time.
    pub start_ms: f64,
    /// Summed activity across the clip.
    pub score: f64,
}

/// Score every candidate start for a clip of `duration_secs`.
///
/// Empty when the wave cycle is degenerate (non-finite or non-positive).
pub fn score_candidates(
    now_ms: f64,
    duration_secs: f64,
    scene: &Scene,
    settings: &Settings,
    scale: f64,
) -> Vec<StartCandidate> {
    let cycle_ms = wave_cycle_ms(settings, scale, scene.img_h);
    if !cycle_ms.is_finite() || cycle_ms <= 0.0 {
        return Vec::new();
    }

    let duration_ms = duration_secs * 1000.0;
    let aligned = aligned_start_ms(now_ms, settings, scale, scene.img_h);

    (0..CANDIDATES)
        .map(|c| {
            let start_ms = aligned + (c as f64 / CANDIDATES as f64) * cycle_ms;
            let score = (0..SAMPLE_STEPS)
                .map(|s| {
                    let ratio = if SAMPLE_STEPS <= 1 {
                        0.0
                    } else {
                        s as f64 / (SAMPLE_STEPS - 1) as f64
                    };
                    estimate_activity(scene, settings, scale, start_ms + duration_ms * ratio)
                })
                .sum();
            StartCandidate { start_ms, score }
        })
        .collect()
}

/// Pick the clip start with the highest sampled activity. Ties keep the earliest candidate.
///
/// Falls back to `now_ms` when the wave cycle is degenerate.
#[tracing::instrument(skip(scene, settings), fields(samples = scene.samples.len()))]
pub fn find_best_start_ms(
    now_ms: f64,
    duration_secs: f64,
    scene: &Scene,
    settings: &Settings,
    scale: f64,
) -> f64 {
    let candidates = score_candidates(now_ms, duration_secs, scene, settings, scale);
    let mut best: Option<StartCandidate> = None;
    for c in candidates {
        if best.is_none_or(|b| c.score > b.score) {
            best = Some(c);
        }
    }
    match best {
        Some(b) => {
            tracing::debug!(start_ms = b.start_ms, score = b.score, "loop start selected");
            b.start_ms
        }
        None => now_ms,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/loop_search.rs"]
mod tests;
