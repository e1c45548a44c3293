//! State machine turning per-frame change signals into raw segments.
//!
//! ```text
//!            changed && ts - start >= min_gap
//!     ┌──────────────────────────────────────────┐
//!     │                                          ▼
//! ┌────────────────┐   emit [start, ts)   ┌────────────────┐
//! │ start = prev   │ ───────────────────▶ │ start = ts     │
//! └────────────────┘                      └────────────────┘
//! ```
//!
//! A change before `min_gap` has elapsed is ignored and the start stays put.
//! `finalize` closes the trailing segment at the last sampled timestamp.

use taskflow_models::Segment;

/// Proposes segment boundaries from change signals.
#[derive(Debug, Clone)]
pub struct BoundaryProposer {
    min_gap_secs: f64,
    current_start: f64,
    segments: Vec<Segment>,
}

impl BoundaryProposer {
    pub fn new(min_gap_secs: f64) -> Self {
        Self {
            min_gap_secs,
            current_start: 0.0,
            segments: Vec::new(),
        }
    }

    /// Start of the segment currently being accumulated.
    pub fn current_start(&self) -> f64 {
        self.current_start
    }

    /// Boundaries emitted so far.
    pub fn boundaries(&self) -> usize {
        self.segments.len()
    }

    /// Process the change signal for the frame at `timestamp`.
    ///
    /// Returns the segment closed by this frame, if any.
    pub fn ingest(&mut self, timestamp: f64, changed: bool) -> Option<Segment> {
        if !changed || timestamp - self.current_start < self.min_gap_secs {
            return None;
        }

        let segment = Segment::new(self.current_start, timestamp);
        self.segments.push(segment);
        self.current_start = timestamp;
        Some(segment)
    }

    /// Close the trailing segment at `last_timestamp` and return every segment.
    pub fn finalize(mut self, last_timestamp: f64) -> Vec<Segment> {
        if self.current_start < last_timestamp {
            self.segments
                .push(Segment::new(self.current_start, last_timestamp));
        }
        self.segments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_changes_yields_single_trailing_segment() {
        let mut proposer = BoundaryProposer::new(5.0);
        for i in 1..24 {
            assert!(proposer.ingest(i as f64 * 0.5, false).is_none());
        }
        assert_eq!(proposer.finalize(11.5), vec![Segment::new(0.0, 11.5)]);
    }

    #[test]
    fn test_change_before_min_gap_is_ignored() {
        let mut proposer = BoundaryProposer::new(5.0);
        assert!(proposer.ingest(2.0, true).is_none());
        assert_eq!(proposer.current_start(), 0.0);

        // Gap is measured from the segment start, not from the ignored change.
        let closed = proposer.ingest(5.0, true);
        assert_eq!(closed, Some(Segment::new(0.0, 5.0)));
        assert_eq!(proposer.current_start(), 5.0);
    }

    #[test]
    fn test_boundaries_at_changes() {
        let mut proposer = BoundaryProposer::new(5.0);
        proposer.ingest(6.0, true);
        proposer.ingest(8.0, true);
        proposer.ingest(40.0, true);
        assert_eq!(proposer.boundaries(), 2);

        assert_eq!(
            proposer.finalize(65.0),
            vec![
                Segment::new(0.0, 6.0),
                Segment::new(6.0, 40.0),
                Segment::new(40.0, 65.0),
            ]
        );
    }

    #[test]
    fn test_change_on_last_frame_leaves_no_trailing_segment() {
        let mut proposer = BoundaryProposer::new(5.0);
        proposer.ingest(10.0, true);
        assert_eq!(proposer.finalize(10.0), vec![Segment::new(0.0, 10.0)]);
    }

    #[test]
    fn test_single_frame_yields_nothing() {
        assert!(BoundaryProposer::new(5.0).finalize(0.0).is_empty());
    }
}
