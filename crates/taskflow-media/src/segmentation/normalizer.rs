//! Duration normalization: split long segments, then merge short ones.
//!
//! Both passes are pure functions over contiguous segment lists and preserve
//! coverage of the input range.

use taskflow_models::{Segment, BOUNDARY_EPSILON};

/// Split every segment longer than `max_secs` into `max_secs` pieces plus a remainder.
///
/// Cut points are `start + k * max_secs` from the original start. A remainder
/// within [`BOUNDARY_EPSILON`] of zero is folded into the previous piece, so
/// sample timestamps like `n / 25.0` never leave a zero-length tail.
pub fn split_long_segments(segments: &[Segment], max_secs: f64) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len());

    for segment in segments {
        let mut start = segment.start;
        let mut pieces = 1u32;
        loop {
            let cut = segment.start + f64::from(pieces) * max_secs;
            if segment.end - cut <= BOUNDARY_EPSILON {
                break;
            }
            out.push(Segment::new(start, cut));
            start = cut;
            pieces += 1;
        }
        out.push(Segment::new(start, segment.end));
    }

    out
}

/// Merge forward: while the accumulated segment is shorter than `min_secs`,
/// extend it over the next one. The final accumulator is always kept, so a
/// short tail survives when nothing follows it.
pub fn merge_short_segments(segments: &[Segment], min_secs: f64) -> Vec<Segment> {
    let Some((first, rest)) = segments.split_first() else {
        return Vec::new();
    };

    let mut out = Vec::with_capacity(segments.len());
    let mut current = *first;

    for segment in rest {
        if current.duration() < min_secs {
            current.end = segment.end;
        } else {
            out.push(current);
            current = *segment;
        }
    }
    out.push(current);

    out
}

/// Split then merge.
pub fn normalize_segments(segments: &[Segment], min_secs: f64, max_secs: f64) -> Vec<Segment> {
    merge_short_segments(&split_long_segments(segments, max_secs), min_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_models::is_contiguous;

    fn segs(bounds: &[(f64, f64)]) -> Vec<Segment> {
        bounds.iter().map(|&(s, e)| Segment::new(s, e)).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(split_long_segments(&[], 30.0).is_empty());
        assert!(merge_short_segments(&[], 10.0).is_empty());
        assert!(normalize_segments(&[], 10.0, 30.0).is_empty());
    }

    #[test]
    fn test_split() {
        let out = split_long_segments(&segs(&[(0.0, 6.0), (6.0, 40.0), (40.0, 65.0)]), 30.0);
        assert_eq!(
            out,
            segs(&[(0.0, 6.0), (6.0, 36.0), (36.0, 40.0), (40.0, 65.0)])
        );
    }

    #[test]
    fn test_split_exact_multiple() {
        let out = split_long_segments(&segs(&[(0.0, 60.0)]), 30.0);
        assert_eq!(out, segs(&[(0.0, 30.0), (30.0, 60.0)]));

        let out = split_long_segments(&segs(&[(0.0, 95.0)]), 30.0);
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|s| s.duration() <= 30.0));
        assert!(is_contiguous(&out));
    }

    #[test]
    fn test_split_ignores_float_drift() {
        // 37.2 - 7.2 is slightly above 30.0 in binary floating point.
        let out = split_long_segments(&segs(&[(7.2, 37.2)]), 30.0);
        assert_eq!(out, segs(&[(7.2, 37.2)]));

        let out = split_long_segments(&[Segment::new(192.0 / 25.0, 1692.0 / 25.0)], 30.0);
        assert_eq!(out.len(), 2);
        assert!(is_contiguous(&out));
        assert_eq!(out[1].end, 1692.0 / 25.0);
    }

    #[test]
    fn test_split_cuts_from_original_start() {
        let out = split_long_segments(&segs(&[(0.1, 90.4)]), 30.0);
        assert_eq!(out.len(), 4);
        assert_eq!(out[2].end, 0.1 + 3.0 * 30.0);
        assert!(out.iter().all(|s| s.start < s.end));
        assert!(is_contiguous(&out));
    }

    #[test]
    fn test_merge_accumulates_forward() {
        let out = merge_short_segments(
            &segs(&[(0.0, 6.0), (6.0, 36.0), (36.0, 40.0), (40.0, 65.0)]),
            10.0,
        );
        assert_eq!(out, segs(&[(0.0, 36.0), (36.0, 65.0)]));
    }

    #[test]
    fn test_merge_keeps_short_tail() {
        let out = merge_short_segments(&segs(&[(0.0, 20.0), (20.0, 23.0)]), 10.0);
        assert_eq!(out, segs(&[(0.0, 20.0), (20.0, 23.0)]));
    }

    #[test]
    fn test_short_video_is_single_segment() {
        let out = normalize_segments(&segs(&[(0.0, 4.5)]), 10.0, 30.0);
        assert_eq!(out, segs(&[(0.0, 4.5)]));
    }

    #[test]
    fn test_normalize_preserves_coverage() {
        let input = segs(&[(0.0, 3.0), (3.0, 9.0), (9.0, 75.0), (75.0, 81.0), (81.0, 120.0)]);
        let out = normalize_segments(&input, 10.0, 30.0);

        assert!(is_contiguous(&out));
        assert_eq!(out.first().unwrap().start, 0.0);
        assert_eq!(out.last().unwrap().end, 120.0);
        // Every segment except a possible tail reaches the minimum.
        assert!(out[..out.len() - 1].iter().all(|s| s.duration() >= 10.0));
    }
}
