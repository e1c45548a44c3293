//! Segmentation tunables.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of sampled frames per second of video.
pub const DEFAULT_SAMPLE_RATE: f64 = 2.0;
/// Default per-pixel intensity change that counts as motion (8-bit scale).
pub const DEFAULT_MOTION_THRESHOLD: u8 = 25;
/// Default minimum dwell time before a new boundary may be proposed.
pub const DEFAULT_MIN_GAP_SECS: f64 = 5.0;
/// Default upper bound on a segment's duration after splitting.
pub const DEFAULT_MAX_SEGMENT_SECS: f64 = 30.0;
/// Default lower bound on a segment's duration after merging.
pub const DEFAULT_MIN_SEGMENT_SECS: f64 = 10.0;

/// Invalid segmentation parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive and finite, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("motion_threshold must be in 1..=255, got 0")]
    ZeroMotionThreshold,

    #[error("min_segment_secs ({min}) must be less than max_segment_secs ({max})")]
    MinNotBelowMax { min: f64, max: f64 },
}

/// Parameters controlling frame sampling, boundary proposal and normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SegmentationConfig {
    /// Sampled frames per second of source video
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,

    /// Absolute luma difference above which a pixel counts as changed (0-255)
    #[serde(default = "default_motion_threshold")]
    pub motion_threshold: u8,

    /// Minimum seconds since the last boundary before another may be emitted
    #[serde(default = "default_min_gap_secs")]
    pub min_gap_secs: f64,

    /// Segments longer than this are split into fixed-length pieces
    #[serde(default = "default_max_segment_secs")]
    pub max_segment_secs: f64,

    /// Segments shorter than this are merged forward
    #[serde(default = "default_min_segment_secs")]
    pub min_segment_secs: f64,
}

fn default_sample_rate() -> f64 {
    DEFAULT_SAMPLE_RATE
}
fn default_motion_threshold() -> u8 {
    DEFAULT_MOTION_THRESHOLD
}
fn default_min_gap_secs() -> f64 {
    DEFAULT_MIN_GAP_SECS
}
fn default_max_segment_secs() -> f64 {
    DEFAULT_MAX_SEGMENT_SECS
}
fn default_min_segment_secs() -> f64 {
    DEFAULT_MIN_SEGMENT_SECS
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            motion_threshold: DEFAULT_MOTION_THRESHOLD,
            min_gap_secs: DEFAULT_MIN_GAP_SECS,
            max_segment_secs: DEFAULT_MAX_SEGMENT_SECS,
            min_segment_secs: DEFAULT_MIN_SEGMENT_SECS,
        }
    }
}

impl SegmentationConfig {
    /// Builder-style setter for the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Builder-style setter for the motion threshold.
    pub fn with_motion_threshold(mut self, threshold: u8) -> Self {
        self.motion_threshold = threshold;
        self
    }

    /// Builder-style setter for the minimum boundary gap.
    pub fn with_min_gap_secs(mut self, secs: f64) -> Self {
        self.min_gap_secs = secs;
        self
    }

    /// Builder-style setter for the duration bounds.
    pub fn with_segment_bounds(mut self, min_secs: f64, max_secs: f64) -> Self {
        self.min_segment_secs = min_secs;
        self.max_segment_secs = max_secs;
        self
    }

    /// Check every precondition. Called before any decoding starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("sample_rate", self.sample_rate),
            ("min_gap_secs", self.min_gap_secs),
            ("max_segment_secs", self.max_segment_secs),
            ("min_segment_secs", self.min_segment_secs),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }

        if self.motion_threshold == 0 {
            return Err(ConfigError::ZeroMotionThreshold);
        }

        if self.min_segment_secs >= self.max_segment_secs {
            return Err(ConfigError::MinNotBelowMax {
                min: self.min_segment_secs,
                max: self.max_segment_secs,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SegmentationConfig::default();
        assert!((config.sample_rate - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.motion_threshold, 25);
        assert!((config.min_gap_secs - 5.0).abs() < f64::EPSILON);
        assert!((config.max_segment_secs - 30.0).abs() < f64::EPSILON);
        assert!((config.min_segment_secs - 10.0).abs() < f64::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive() {
        let config = SegmentationConfig::default().with_sample_rate(0.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "sample_rate",
                value: 0.0
            })
        );

        let config = SegmentationConfig::default().with_min_gap_secs(-1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "min_gap_secs", .. })
        ));

        let config = SegmentationConfig::default().with_sample_rate(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_min_not_below_max() {
        let config = SegmentationConfig::default().with_segment_bounds(30.0, 30.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::MinNotBelowMax { min: 30.0, max: 30.0 })
        );
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let config = SegmentationConfig::default().with_motion_threshold(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroMotionThreshold));
    }

    #[test]
    fn test_serde_defaults() {
        let config: SegmentationConfig = serde_json::from_str(r#"{"sample_rate": 4.0}"#).unwrap();
        assert!((config.sample_rate - 4.0).abs() < f64::EPSILON);
        assert_eq!(config.motion_threshold, DEFAULT_MOTION_THRESHOLD);
        assert!((config.max_segment_secs - DEFAULT_MAX_SEGMENT_SECS).abs() < f64::EPSILON);
    }
}
