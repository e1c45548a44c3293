//! Time segments produced by the segmentation pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing segment boundaries.
pub const BOUNDARY_EPSILON: f64 = 1e-6;

/// A half-open time range `[start, end)` in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    /// Start time in seconds (inclusive)
    pub start: f64,
    /// End time in seconds (exclusive)
    pub end: f64,
}

impl Segment {
    /// Create a new segment.
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Duration of this segment in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `t` falls inside `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.3}s, {:.3}s)", self.start, self.end)
    }
}

/// Check that `segments` tile `[first.start, last.end)` with no gaps or overlaps
/// and strictly increasing starts.
pub fn is_contiguous(segments: &[Segment]) -> bool {
    segments
        .iter()
        .all(|s| s.start < s.end)
        && segments
            .windows(2)
            .all(|w| (w[0].end - w[1].start).abs() < BOUNDARY_EPSILON && w[0].start < w[1].start)
}

/// Summary statistics for a list of segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentStats {
    /// Number of segments.
    pub count: usize,
    /// Total covered duration in seconds.
    pub total_secs: f64,
    /// Shortest segment duration in seconds.
    pub min_secs: f64,
    /// Longest segment duration in seconds.
    pub max_secs: f64,
    /// Mean segment duration in seconds.
    pub mean_secs: f64,
}

/// Calculate statistics about the segments.
pub fn compute_segment_stats(segments: &[Segment]) -> SegmentStats {
    if segments.is_empty() {
        return SegmentStats::default();
    }

    let mut total = 0.0;
    let mut min = f64::MAX;
    let mut max = 0.0f64;

    for segment in segments {
        let d = segment.duration();
        total += d;
        min = min.min(d);
        max = max.max(d);
    }

    SegmentStats {
        count: segments.len(),
        total_secs: total,
        min_secs: min,
        max_secs: max,
        mean_secs: total / segments.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_and_contains() {
        let s = Segment::new(6.0, 36.0);
        assert!((s.duration() - 30.0).abs() < 1e-9);
        assert!(s.contains(6.0));
        assert!(!s.contains(36.0));
    }

    #[test]
    fn test_is_contiguous() {
        let ok = vec![Segment::new(0.0, 6.0), Segment::new(6.0, 40.0)];
        assert!(is_contiguous(&ok));

        let gap = vec![Segment::new(0.0, 6.0), Segment::new(7.0, 40.0)];
        assert!(!is_contiguous(&gap));

        let empty_range = vec![Segment::new(3.0, 3.0)];
        assert!(!is_contiguous(&empty_range));

        assert!(is_contiguous(&[]));
    }

    #[test]
    fn test_segment_stats() {
        let segments = vec![
            Segment::new(0.0, 10.0),
            Segment::new(10.0, 40.0),
            Segment::new(40.0, 60.0),
        ];

        let stats = compute_segment_stats(&segments);
        assert_eq!(stats.count, 3);
        assert!((stats.total_secs - 60.0).abs() < 1e-9);
        assert!((stats.min_secs - 10.0).abs() < 1e-9);
        assert!((stats.max_secs - 30.0).abs() < 1e-9);
        assert!((stats.mean_secs - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(compute_segment_stats(&[]), SegmentStats::default());
    }
}
