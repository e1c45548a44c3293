//! Metrics emitted by the media pipeline.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding binary installs a recorder.

use metrics::{counter, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_SAMPLED_TOTAL: &str = "taskflow_frames_sampled_total";
    pub const BOUNDARIES_PROPOSED_TOTAL: &str = "taskflow_boundaries_proposed_total";
    pub const SEGMENT_DURATION_SECONDS: &str = "taskflow_segment_duration_seconds";
    pub const CLIPS_CREATED_TOTAL: &str = "taskflow_clips_created_total";
    pub const CLIPS_FAILED_TOTAL: &str = "taskflow_clips_failed_total";
    pub const FFMPEG_DURATION_SECONDS: &str = "taskflow_ffmpeg_duration_seconds";
}

/// Record a completed segmentation pass.
pub fn record_segmentation(frames: usize, boundaries: usize, durations: impl Iterator<Item = f64>) {
    counter!(names::FRAMES_SAMPLED_TOTAL).increment(frames as u64);
    counter!(names::BOUNDARIES_PROPOSED_TOTAL).increment(boundaries as u64);
    for secs in durations {
        histogram!(names::SEGMENT_DURATION_SECONDS).record(secs);
    }
}

/// Record one clip materialization attempt.
pub fn record_clip(success: bool, duration_secs: f64) {
    let labels = [("operation", "clip".to_string())];
    histogram!(names::FFMPEG_DURATION_SECONDS, &labels).record(duration_secs);
    if success {
        counter!(names::CLIPS_CREATED_TOTAL).increment(1);
    } else {
        counter!(names::CLIPS_FAILED_TOTAL).increment(1);
    }
}
