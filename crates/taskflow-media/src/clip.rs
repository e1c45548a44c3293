//! Clip materialization.
//!
//! Each final segment is cut from the source with a stream copy, so clips are
//! produced without re-encoding. A failed segment is recorded and the
//! remaining segments are still processed.

use std::path::Path;
use std::time::Instant;

use taskflow_models::{clip_file_name, ClipArtifact, ClipFailure, Segment};
use tracing::{info, warn};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::metrics;

/// Outcome of materializing a list of segments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipBatch {
    /// Clips that were written, in segment order.
    pub clips: Vec<ClipArtifact>,
    /// Segments whose extraction failed, in segment order.
    pub failures: Vec<ClipFailure>,
}

impl ClipBatch {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Cut `[start, end)` from `input` into `output` without re-encoding.
pub async fn extract_clip(
    runner: &FfmpegRunner,
    input: &Path,
    output: &Path,
    segment: &Segment,
) -> MediaResult<()> {
    let cmd = FfmpegCommand::new(input, output)
        .seek(segment.start)
        .duration(segment.duration())
        .codec_copy();

    runner.run(&cmd).await
}

/// Materialize one clip per segment into `output_dir`.
///
/// Only a failure to prepare `output_dir` is returned as an error; per-segment
/// failures are collected in [`ClipBatch::failures`] with the tool's diagnostic.
pub async fn materialize_clips(
    runner: &FfmpegRunner,
    input: &Path,
    segments: &[Segment],
    output_dir: &Path,
) -> MediaResult<ClipBatch> {
    tokio::fs::create_dir_all(output_dir).await?;

    info!(
        input = %input.display(),
        output_dir = %output_dir.display(),
        segments = segments.len(),
        "Materializing clips"
    );

    let mut batch = ClipBatch::default();

    for (index, segment) in segments.iter().enumerate() {
        let output = output_dir.join(clip_file_name(index, segment));
        let started = Instant::now();

        let result = extract_clip(runner, input, &output, segment)
            .await
            .map_err(|e| MediaError::clip_extraction(index, e.diagnostic()));
        metrics::record_clip(result.is_ok(), started.elapsed().as_secs_f64());

        match result {
            Ok(()) => {
                info!(index, segment = %segment, path = %output.display(), "Clip created");
                batch.clips.push(ClipArtifact {
                    index,
                    path: output,
                    start_secs: segment.start,
                    end_secs: segment.end,
                });
            }
            Err(MediaError::ClipExtraction { index, message }) => {
                warn!(index, segment = %segment, error = %message, "Clip extraction failed");
                batch.failures.push(ClipFailure {
                    index,
                    start_secs: segment.start,
                    end_secs: segment.end,
                    message,
                });
            }
            Err(other) => return Err(other),
        }
    }

    info!(
        clips = batch.clips.len(),
        failures = batch.failures.len(),
        "Clip materialization finished"
    );

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_failures_are_collected_per_segment() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("clips");
        let segments = vec![Segment::new(0.0, 12.0), Segment::new(12.0, 30.0)];

        let batch = materialize_clips(
            &FfmpegRunner::new(),
            Path::new("/nonexistent/source.mp4"),
            &segments,
            &out,
        )
        .await
        .unwrap();

        assert!(batch.clips.is_empty());
        assert!(!batch.is_complete());
        let indices: Vec<_> = batch.failures.iter().map(|f| f.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert!(batch.failures.iter().all(|f| !f.message.is_empty()));
        assert_eq!(batch.failures[1].start_secs, 12.0);
        assert!(out.is_dir());
    }

    #[tokio::test]
    async fn test_empty_segments() {
        let dir = TempDir::new().unwrap();
        let batch = materialize_clips(
            &FfmpegRunner::new(),
            Path::new("source.mp4"),
            &[],
            dir.path(),
        )
        .await
        .unwrap();
        assert_eq!(batch, ClipBatch::default());
        assert!(batch.is_complete());
    }
}
