#![deny(unreachable_patterns)]
//! Event-aware video segmentation.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building and `-progress` parsing
//! - Video probing via ffprobe
//! - Fixed-rate frame sampling over an FFmpeg rawvideo pipe
//! - Motion and object-set change detection
//! - Boundary proposal and duration normalization
//! - Stream-copy clip materialization and audio extraction

pub mod audio;
pub mod clip;
pub mod command;
pub mod detection;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod probe;
pub mod progress;
pub mod sampler;
pub mod segmentation;

pub use audio::extract_audio;
pub use clip::{extract_clip, materialize_clips, ClipBatch};
pub use command::{FfmpegCommand, FfmpegRunner};
pub use detection::{
    ChangeDetector, ChangeSignal, MotionDetector, NullObjectDetector, ObjectSet, ObjectSetDetector,
};
#[cfg(feature = "onnx")]
pub use detection::{ObjectDetectorConfig, YoloObjectDetector};
pub use error::{MediaError, MediaResult};
pub use frame::Frame;
pub use probe::{probe_video, VideoInfo};
pub use progress::FfmpegProgress;
pub use sampler::FrameSampler;
pub use segmentation::{
    merge_short_segments, normalize_segments, segment_frames, segment_video,
    split_long_segments, BoundaryProposer, SegmentationOutcome,
};
