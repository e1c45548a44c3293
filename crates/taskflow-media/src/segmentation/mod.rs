//! Event-aware segmentation.
//!
//! # Pipeline
//!
//! ```text
//! FrameSampler ──▶ ChangeDetector ──▶ BoundaryProposer ──▶ split ──▶ merge
//!   (frames)        (pairwise signal)   (raw segments)     (max)     (min)
//! ```
//!
//! Everything here is blocking. Async callers should run [`segment_video`]
//! inside `tokio::task::spawn_blocking`.

mod normalizer;
mod proposer;

use std::path::Path;
use std::time::Instant;

use taskflow_models::{compute_segment_stats, Segment, SegmentationConfig};
use tracing::{debug, info, warn};

use crate::detection::{ChangeDetector, ObjectSetDetector};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::metrics;
use crate::probe::VideoInfo;
use crate::sampler::FrameSampler;

pub use normalizer::{merge_short_segments, normalize_segments, split_long_segments};
pub use proposer::BoundaryProposer;

/// Result of a segmentation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationOutcome {
    /// Segments as proposed from change signals, before normalization.
    pub proposed: Vec<Segment>,
    /// Final, normalized segments.
    pub segments: Vec<Segment>,
    /// Number of sampled frames consumed.
    pub frames_sampled: usize,
    /// Timestamp of the last sampled frame.
    pub last_timestamp: f64,
    /// Set when the frame stream failed after yielding frames. Segments cover
    /// the frames read before the failure.
    pub decode_error: Option<String>,
}

impl SegmentationOutcome {
    /// Whether the whole stream was consumed.
    pub fn is_complete(&self) -> bool {
        self.decode_error.is_none()
    }
}

/// Segment a stream of sampled frames.
///
/// The config is validated before the first frame is pulled. A decode error
/// ends the stream: before the first frame it is returned, afterwards the
/// frames already read are still segmented and the error is kept in
/// [`SegmentationOutcome::decode_error`]. Detection errors abort the pass.
pub fn segment_frames<I>(
    frames: I,
    detector: &dyn ObjectSetDetector,
    config: &SegmentationConfig,
) -> MediaResult<SegmentationOutcome>
where
    I: IntoIterator<Item = MediaResult<Frame>>,
{
    config.validate()?;

    let mut change = ChangeDetector::new(detector, config.motion_threshold);
    let mut proposer = BoundaryProposer::new(config.min_gap_secs);
    let mut frames_sampled = 0usize;
    let mut last_timestamp = None;
    let mut decode_error = None;

    for frame in frames {
        let frame = match frame {
            Ok(frame) => frame,
            Err(MediaError::Decode(message)) if frames_sampled > 0 => {
                warn!(
                    frames = frames_sampled,
                    error = %message,
                    "Frame stream failed, keeping segments read so far"
                );
                decode_error = Some(message);
                break;
            }
            Err(e) => return Err(e),
        };
        frames_sampled += 1;
        last_timestamp = Some(frame.timestamp);

        let Some(signal) = change.observe(&frame)? else {
            continue;
        };

        if let Some(segment) = proposer.ingest(frame.timestamp, signal.changed()) {
            debug!(
                segment = %segment,
                motion = signal.motion_changed,
                objects = signal.objects_changed,
                "Boundary proposed"
            );
        }
    }

    let last_timestamp =
        last_timestamp.ok_or_else(|| MediaError::InvalidVideo("no frames decoded".to_string()))?;

    let boundaries = proposer.boundaries();
    let proposed = proposer.finalize(last_timestamp);
    let segments = normalize_segments(
        &proposed,
        config.min_segment_secs,
        config.max_segment_secs,
    );

    metrics::record_segmentation(
        frames_sampled,
        boundaries,
        segments.iter().map(Segment::duration),
    );

    let stats = compute_segment_stats(&segments);
    info!(
        frames = frames_sampled,
        boundaries,
        proposed = proposed.len(),
        segments = stats.count,
        min_secs = stats.min_secs,
        max_secs = stats.max_secs,
        mean_secs = stats.mean_secs,
        "Segmentation complete"
    );

    Ok(SegmentationOutcome {
        proposed,
        segments,
        frames_sampled,
        last_timestamp,
        decode_error,
    })
}

/// Decode `path` and segment it.
pub fn segment_video(
    path: &Path,
    info: &VideoInfo,
    detector: &dyn ObjectSetDetector,
    config: &SegmentationConfig,
) -> MediaResult<SegmentationOutcome> {
    config.validate()?;
    if info.frame_count == 0 {
        return Err(MediaError::InvalidVideo(format!(
            "{} has no video frames",
            path.display()
        )));
    }

    let start = Instant::now();
    info!(
        path = %path.display(),
        detector = detector.name(),
        duration = info.duration,
        "Starting segmentation"
    );

    let sampler = FrameSampler::open(path, info, config.sample_rate)?;
    let outcome = segment_frames(sampler, detector, config)?;

    info!(
        path = %path.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        segments = outcome.segments.len(),
        complete = outcome.is_complete(),
        "Segmentation finished"
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::NullObjectDetector;

    #[test]
    fn test_zero_frame_video_rejected_before_decoding() {
        let info = VideoInfo {
            duration: 0.0,
            width: 640,
            height: 480,
            fps: 30.0,
            frame_count: 0,
            codec: "h264".to_string(),
        };

        // The path does not exist; a spawned decoder would report a decode error instead.
        let result = segment_video(
            Path::new("/nonexistent/empty.mp4"),
            &info,
            &NullObjectDetector,
            &SegmentationConfig::default(),
        );
        assert!(matches!(result, Err(MediaError::InvalidVideo(_))));
    }
}
