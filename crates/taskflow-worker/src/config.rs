//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use taskflow_models::SegmentationConfig;
use tracing::warn;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sampling, detection and normalization tunables
    pub segmentation: SegmentationConfig,
    /// Directory receiving clips, the manifest and the task graph
    pub output_dir: PathBuf,
    /// Scratch directory for audio tracks and per-clip action files
    pub work_dir: PathBuf,
    /// Run the object-set detector (motion only when false)
    pub object_detection: bool,
    /// YOLOv8 ONNX model used for object-set detection
    pub model_path: PathBuf,
    /// Retries for each collaborator call
    pub max_retries: u32,
    /// Base delay for collaborator retry backoff
    pub retry_base_delay: Duration,
    /// Per-invocation FFmpeg timeout
    pub ffmpeg_timeout: Option<Duration>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            segmentation: SegmentationConfig::default(),
            output_dir: PathBuf::from("clips"),
            work_dir: PathBuf::from("/tmp/taskflow"),
            object_detection: true,
            model_path: PathBuf::from("models/yolov8n.onnx"),
            max_retries: 4,
            retry_base_delay: Duration::from_secs(2),
            ffmpeg_timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset or unparseable values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let segmentation = SegmentationConfig {
            sample_rate: parse_var(&lookup, "TASKFLOW_SAMPLE_RATE")
                .unwrap_or(defaults.segmentation.sample_rate),
            motion_threshold: parse_var(&lookup, "TASKFLOW_MOTION_THRESHOLD")
                .unwrap_or(defaults.segmentation.motion_threshold),
            min_gap_secs: parse_var(&lookup, "TASKFLOW_MIN_GAP_SECS")
                .unwrap_or(defaults.segmentation.min_gap_secs),
            max_segment_secs: parse_var(&lookup, "TASKFLOW_MAX_SEGMENT_SECS")
                .unwrap_or(defaults.segmentation.max_segment_secs),
            min_segment_secs: parse_var(&lookup, "TASKFLOW_MIN_SEGMENT_SECS")
                .unwrap_or(defaults.segmentation.min_segment_secs),
        };

        let ffmpeg_timeout = parse_with(&lookup, "TASKFLOW_FFMPEG_TIMEOUT_SECS", parse_timeout)
            .unwrap_or(defaults.ffmpeg_timeout);

        Self {
            segmentation,
            output_dir: lookup("TASKFLOW_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            work_dir: lookup("TASKFLOW_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            object_detection: parse_with(&lookup, "TASKFLOW_OBJECT_DETECTION", parse_bool)
                .unwrap_or(defaults.object_detection),
            model_path: lookup("TASKFLOW_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            max_retries: parse_var(&lookup, "TASKFLOW_MAX_RETRIES")
                .unwrap_or(defaults.max_retries),
            retry_base_delay: parse_var(&lookup, "TASKFLOW_RETRY_BASE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            ffmpeg_timeout,
        }
    }

    /// Check the segmentation tunables and directory settings.
    pub fn validate(&self) -> WorkerResult<()> {
        self.segmentation.validate()?;

        if self.output_dir.as_os_str().is_empty() {
            return Err(WorkerError::config_error("output_dir must not be empty"));
        }
        if self.work_dir.as_os_str().is_empty() {
            return Err(WorkerError::config_error("work_dir must not be empty"));
        }
        Ok(())
    }

    /// Where per-clip action files are written.
    pub fn actions_dir(&self) -> PathBuf {
        self.work_dir.join("clip_actions")
    }

    /// Where extracted audio tracks are written.
    pub fn audio_dir(&self) -> PathBuf {
        self.work_dir.join("audio_clips")
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    parse_with(lookup, key, |v| v.trim().parse().ok())
}

/// Parse `key` with `parse`. Unparseable values are logged and treated as unset.
fn parse_with<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let value = lookup(key)?;
    let parsed = parse(&value);
    if parsed.is_none() {
        warn!(variable = key, value = %value, "Ignoring unparseable value, using default");
    }
    parsed
}

/// `0` disables the timeout.
fn parse_timeout(value: &str) -> Option<Option<Duration>> {
    let secs = u64::from_str(value.trim()).ok()?;
    Some((secs > 0).then(|| Duration::from_secs(secs)))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
