/// Receiver for export progress and cooperative yield points.
///
/// Percentages are whole numbers in `0..=100`. Long loops call [`ProgressSink::yield_now`] every
/// few frames so a host can repaint or pump events.
pub trait ProgressSink {
    /// Overall export progress.
    fn progress(&mut self, percent: u32);

    /// Capture-stage progress for a preview overlay; `None` clears it.
    fn capture_preview(&mut self, _percent: Option<u32>) {}

    /// Cooperative yield point.
    fn yield_now(&mut self) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn progress(&mut self, _percent: u32) {}
}

/// Records every report; used by tests and by the CLI to log stage transitions.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    /// Overall progress values in report order.
    pub progress: Vec<u32>,
    /// Capture preview values in report order.
    pub previews: Vec<Option<u32>>,
    /// Number of yield points hit.
    pub yields: usize,
}

impl ProgressSink for RecordingProgress {
    fn progress(&mut self, percent: u32) {
        self.progress.push(percent);
    }

    fn capture_preview(&mut self, percent: Option<u32>) {
        self.previews.push(percent);
    }

    fn yield_now(&mut self) {
        self.yields += 1;
    }
}

/// A `[start, end]` slice of the overall progress bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressRange {
    /// First percent of the slice.
    pub start: u32,
    /// Last percent of the slice.
    pub end: u32,
}

impl ProgressRange {
    /// The whole bar.
    pub const FULL: Self = Self { start: 0, end: 100 };

    /// Build a range; `end` is raised to `start` if it lies below it.
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Width of the slice.
    pub fn span(self) -> u32 {
        self.end - self.start
    }

    /// Percent at `fraction` (clamped to `0..=1`) of the way through the slice.
    pub fn at(self, fraction: f64) -> u32 {
        let f = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.start + (f64::from(self.span()) * f).round() as u32
    }

    /// Sub-range from `from` to `to` fraction of this slice.
    pub fn sub(self, from: f64, to: f64) -> Self {
        Self::new(self.at(from), self.at(to))
    }

    /// Slice `index` of `count` equal slices of this range.
    pub fn task(self, index: usize, count: usize) -> Self {
        let n = count.max(1) as f64;
        self.sub(index as f64 / n, (index + 1) as f64 / n)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/progress.rs"]
mod tests;
