//! Clip artifacts handed to the captioning stage.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{Segment, SegmentationConfig};

/// Container extension used for materialized clips.
pub const CLIP_EXTENSION: &str = "mp4";

/// Deterministic file name for the clip at `index` covering `segment`.
///
/// Boundaries are truncated to whole seconds, so re-running with the same
/// segments overwrites the same files.
pub fn clip_file_name(index: usize, segment: &Segment) -> String {
    format!(
        "output_{}_{}_{}.{}",
        index,
        segment.start.floor() as u64,
        segment.end.floor() as u64,
        CLIP_EXTENSION
    )
}

/// A materialized clip for exactly one final segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipArtifact {
    /// Ordinal of the segment this clip was cut from
    pub index: usize,
    /// Path to the playable media file
    pub path: PathBuf,
    /// Segment start in seconds
    pub start_secs: f64,
    /// Segment end in seconds
    pub end_secs: f64,
}

impl ClipArtifact {
    /// Source time range of this clip.
    pub fn segment(&self) -> Segment {
        Segment::new(self.start_secs, self.end_secs)
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end_secs - self.start_secs
    }
}

/// A segment whose clip could not be extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClipFailure {
    /// Ordinal of the failed segment
    pub index: usize,
    /// Segment start in seconds
    pub start_secs: f64,
    /// Segment end in seconds
    pub end_secs: f64,
    /// Diagnostic from the extraction tool
    pub message: String,
}

/// Record of one segmentation run, written next to the clips.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClipManifest {
    /// Source video path
    pub video: PathBuf,
    /// When the run finished
    pub created_at: DateTime<Utc>,
    /// Parameters the run used
    pub config: SegmentationConfig,
    /// Final segments, in order
    pub segments: Vec<Segment>,
    /// Successfully materialized clips
    pub clips: Vec<ClipArtifact>,
    /// Segments whose extraction failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ClipFailure>,
    /// Decoder failure that cut the video short; segments stop at the last frame read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decode_error: Option<String>,
}
