//! Shared data models for the TaskFlow pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Time segments and segment statistics
//! - Segmentation tunables and their validation
//! - Clip artifacts and run manifests
//! - Per-clip action records from the captioning stage

pub mod action;
pub mod clip;
pub mod config;
pub mod segment;

// Re-export common types
pub use action::{
    merge_clip_actions, parse_caption_response, strip_code_fences, Action, ActionPayload,
    ClipActions,
};
pub use clip::{clip_file_name, ClipArtifact, ClipFailure, ClipManifest};
pub use config::{ConfigError, SegmentationConfig};
pub use segment::{
    compute_segment_stats, is_contiguous, Segment, SegmentStats, BOUNDARY_EPSILON,
};
