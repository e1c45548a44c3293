//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::config::WorkerConfig;

/// Split a lab video into event clips.
#[derive(Parser, Debug)]
#[command(name = "taskflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Video file to segment
    pub video: PathBuf,

    /// Directory for clips, manifest and task graph
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Scratch directory for audio and per-clip action files
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Sampled frames per second
    #[arg(long)]
    pub sample_rate: Option<f64>,

    /// Per-pixel luma change that counts as motion (1-255)
    #[arg(long)]
    pub motion_threshold: Option<u8>,

    /// Minimum seconds between boundaries
    #[arg(long)]
    pub min_gap: Option<f64>,

    /// Maximum segment length in seconds
    #[arg(long)]
    pub max_segment: Option<f64>,

    /// Minimum segment length in seconds
    #[arg(long)]
    pub min_segment: Option<f64>,

    /// YOLOv8 ONNX model for object-set detection
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Use motion only, without object detection
    #[arg(long)]
    pub no_objects: bool,

    /// Print the manifest as JSON instead of its path
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, mut config: WorkerConfig) -> WorkerConfig {
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(dir) = &self.work_dir {
            config.work_dir = dir.clone();
        }
        if let Some(rate) = self.sample_rate {
            config.segmentation.sample_rate = rate;
        }
        if let Some(threshold) = self.motion_threshold {
            config.segmentation.motion_threshold = threshold;
        }
        if let Some(gap) = self.min_gap {
            config.segmentation.min_gap_secs = gap;
        }
        if let Some(max) = self.max_segment {
            config.segmentation.max_segment_secs = max;
        }
        if let Some(min) = self.min_segment {
            config.segmentation.min_segment_secs = min;
        }
        if let Some(model) = &self.model {
            config.model_path = model.clone();
        }
        if self.no_objects {
            config.object_detection = false;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "taskflow",
            "lab.mp4",
            "-o",
            "out",
            "--sample-rate",
            "3",
            "--min-gap",
            "4",
            "--no-objects",
        ])
        .unwrap();

        let config = cli.apply(WorkerConfig::default());
        assert_eq!(cli.video, PathBuf::from("lab.mp4"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.segmentation.sample_rate, 3.0);
        assert_eq!(config.segmentation.min_gap_secs, 4.0);
        assert_eq!(config.segmentation.max_segment_secs, 30.0);
        assert!(!config.object_detection);
    }

    #[test]
    fn test_video_is_required() {
        assert!(Cli::try_parse_from(["taskflow"]).is_err());
    }

    #[test]
    fn test_threshold_range_checked_by_parser() {
        assert!(Cli::try_parse_from(["taskflow", "lab.mp4", "--motion-threshold", "256"]).is_err());
    }
}
