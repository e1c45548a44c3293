//! Run orchestration.
//!
//! ```text
//! probe ─▶ segment (blocking) ─▶ materialize clips ─▶ manifest.json
//!                                       │
//!                                       ▼  (with collaborators)
//!          audio ─▶ transcript ─▶ caption ─▶ clip_{i}_actions.json
//!                                       │
//!                                       ▼
//!                         actions.json ─▶ task_graph.txt
//! ```
//!
//! Segmentation and clip-directory failures abort the run. A collaborator
//! failure for one clip is recorded and the remaining clips are still described.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use serde::Serialize;
use tracing::{info, warn, Instrument};

use taskflow_media::{
    materialize_clips, probe_video, segment_video, FfmpegRunner, ObjectSetDetector,
    SegmentationOutcome,
};
use taskflow_models::{
    merge_clip_actions, parse_caption_response, ClipActions, ClipArtifact, ClipManifest,
};

use crate::collaborators::{
    Captioner, Collaborators, FfmpegAudioExtractor, TaskGraphBuilder, Transcriber,
};
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::RunLogger;
use crate::retry::{retry_async_when, RetryConfig};

/// Run manifest file name inside the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";
/// Merged per-clip actions, the task-graph builder's input.
pub const MERGED_ACTIONS_FILE: &str = "actions.json";
/// Task graph file name inside the output directory.
pub const TASK_GRAPH_FILE: &str = "task_graph.txt";

/// File name of the action record for clip `index`.
pub fn clip_actions_file_name(index: usize) -> String {
    format!("clip_{}_actions.json", index)
}

/// A clip whose description failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionFailure {
    pub clip_index: usize,
    pub message: String,
}

/// Per-clip descriptions.
#[derive(Debug, Clone, Default)]
pub struct DescribeOutcome {
    /// Described clips, ordered by clip index.
    pub actions: Vec<ClipActions>,
    pub failures: Vec<ActionFailure>,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub manifest_path: PathBuf,
    pub manifest: ClipManifest,
    pub actions: Vec<ClipActions>,
    pub action_failures: Vec<ActionFailure>,
    pub task_graph_path: Option<PathBuf>,
}

/// Segments a video into event clips and optionally describes them.
pub struct TaskFlowPipeline {
    config: WorkerConfig,
    detector: Arc<dyn ObjectSetDetector>,
    runner: FfmpegRunner,
    collaborators: Option<Collaborators>,
}

impl TaskFlowPipeline {
    pub fn new(config: WorkerConfig, detector: Arc<dyn ObjectSetDetector>) -> Self {
        let runner = match config.ffmpeg_timeout {
            Some(timeout) => FfmpegRunner::new().with_timeout(timeout.as_secs().max(1)),
            None => FfmpegRunner::new(),
        };

        Self {
            config,
            detector,
            runner,
            collaborators: None,
        }
    }

    /// Enable the describe stage.
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = Some(collaborators);
        self
    }

    /// Enable the describe stage with FFmpeg audio extraction into the
    /// configured audio directory.
    pub fn with_services(
        self,
        transcriber: Arc<dyn Transcriber>,
        captioner: Arc<dyn Captioner>,
        graph_builder: Arc<dyn TaskGraphBuilder>,
    ) -> Self {
        let audio = FfmpegAudioExtractor::new(self.runner.clone(), self.config.audio_dir());
        self.with_collaborators(Collaborators::new(
            Arc::new(audio),
            transcriber,
            captioner,
            graph_builder,
        ))
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn runner(&self) -> &FfmpegRunner {
        &self.runner
    }

    /// Probe and segment `video`. Decoding and detection run on the blocking pool.
    pub async fn segment(&self, video: &Path) -> WorkerResult<SegmentationOutcome> {
        self.config.validate()?;
        if !video.is_file() {
            return Err(WorkerError::invalid_input(format!(
                "video not found: {}",
                video.display()
            )));
        }

        let info = probe_video(video).await?;
        let detector = Arc::clone(&self.detector);
        let config = self.config.segmentation.clone();
        let path = video.to_path_buf();

        let outcome = tokio::task::spawn_blocking(move || {
            segment_video(&path, &info, detector.as_ref(), &config)
        })
        .await
        .map_err(|e| WorkerError::TaskFailed(format!("segmentation task join error: {}", e)))??;

        Ok(outcome)
    }

    /// Full run: segment, materialize, write the manifest, then describe clips
    /// and build the task graph when collaborators are configured.
    pub async fn run(&self, video: &Path) -> WorkerResult<RunReport> {
        let logger = RunLogger::new("taskflow");
        let span = logger.create_span();

        let result = self.run_inner(video, &logger).instrument(span).await;
        if let Err(e) = &result {
            logger.log_error(&e.to_string());
        }
        result
    }

    async fn run_inner(&self, video: &Path, logger: &RunLogger) -> WorkerResult<RunReport> {
        logger.log_start(&format!("video={}", video.display()));

        let outcome = self.segment(video).await?;
        if let Some(error) = &outcome.decode_error {
            logger.log_warning(&format!(
                "decoding stopped at {:.3}s, keeping {} frames: {}",
                outcome.last_timestamp, outcome.frames_sampled, error
            ));
        }
        if outcome.segments.is_empty() {
            logger.log_warning("video produced no segments");
        }
        logger.log_progress(&format!(
            "{} segments from {} sampled frames",
            outcome.segments.len(),
            outcome.frames_sampled
        ));

        let batch = materialize_clips(
            &self.runner,
            video,
            &outcome.segments,
            &self.config.output_dir,
        )
        .await?;
        if !batch.is_complete() {
            logger.log_warning(&format!("{} clips failed to extract", batch.failures.len()));
        }

        let manifest = ClipManifest {
            video: video.to_path_buf(),
            created_at: Utc::now(),
            config: self.config.segmentation.clone(),
            segments: outcome.segments,
            clips: batch.clips,
            failures: batch.failures,
            decode_error: outcome.decode_error,
        };
        let manifest_path = self.config.output_dir.join(MANIFEST_FILE);
        write_json_atomic(&manifest_path, &manifest).await?;
        logger.log_progress(&format!("manifest written to {}", manifest_path.display()));

        let mut report = RunReport {
            run_id: logger.run_id().to_string(),
            manifest_path,
            manifest,
            actions: Vec::new(),
            action_failures: Vec::new(),
            task_graph_path: None,
        };

        if self.collaborators.is_some() {
            let described = self.describe_clips(&report.manifest.clips).await?;
            report.task_graph_path = self.build_task_graph(&described.actions).await?;
            report.actions = described.actions;
            report.action_failures = described.failures;
        }

        logger.log_completion(&format!(
            "{} clips, {} described, {} description failures",
            report.manifest.clips.len(),
            report.actions.len(),
            report.action_failures.len()
        ));

        Ok(report)
    }

    /// Describe every clip and persist one action record per clip plus the merged list.
    pub async fn describe_clips(&self, clips: &[ClipArtifact]) -> WorkerResult<DescribeOutcome> {
        let collaborators = self.require_collaborators()?;
        let actions_dir = self.config.actions_dir();
        tokio::fs::create_dir_all(&actions_dir).await?;

        let mut outcome = DescribeOutcome::default();

        for clip in clips {
            match self.describe_clip(collaborators, clip).await {
                Ok(actions) => {
                    if !actions.is_parsed() {
                        warn!(clip_index = clip.index, "Caption was not valid JSON, keeping raw text");
                    }
                    let path = actions_dir.join(clip_actions_file_name(clip.index));
                    write_json_atomic(&path, &actions).await?;
                    info!(
                        clip_index = clip.index,
                        actions = actions.actions().len(),
                        path = %path.display(),
                        "Clip described"
                    );
                    counter!("taskflow_clips_described_total").increment(1);
                    outcome.actions.push(actions);
                }
                Err(e) => {
                    warn!(clip_index = clip.index, error = %e, "Clip description failed");
                    counter!("taskflow_clip_description_failures_total").increment(1);
                    outcome.failures.push(ActionFailure {
                        clip_index: clip.index,
                        message: e.to_string(),
                    });
                }
            }
        }

        outcome.actions = merge_clip_actions(outcome.actions);
        write_json_atomic(
            &self.config.output_dir.join(MERGED_ACTIONS_FILE),
            &outcome.actions,
        )
        .await?;

        Ok(outcome)
    }

    async fn describe_clip(
        &self,
        collaborators: &Collaborators,
        clip: &ClipArtifact,
    ) -> WorkerResult<ClipActions> {
        let retry = self.retry_config();

        let audio = retry_async_when(
            &retry.named(format!("extract_audio[{}]", clip.index)),
            || collaborators.audio.extract(clip),
            WorkerError::is_retryable,
        )
        .await
        .into_result()?;

        let transcript = retry_async_when(
            &retry.named(format!("transcribe[{}]", clip.index)),
            || collaborators.transcriber.transcribe(&audio),
            WorkerError::is_retryable,
        )
        .await
        .into_result()?;

        let caption = retry_async_when(
            &retry.named(format!("caption[{}]", clip.index)),
            || collaborators.captioner.caption(clip, &transcript),
            WorkerError::is_retryable,
        )
        .await
        .into_result()?;

        Ok(parse_caption_response(clip.index, &caption))
    }

    /// Build the task graph from described clips. Nothing is written when no
    /// clip was described.
    pub async fn build_task_graph(&self, actions: &[ClipActions]) -> WorkerResult<Option<PathBuf>> {
        let collaborators = self.require_collaborators()?;
        if actions.is_empty() {
            warn!("No described clips, skipping task graph");
            return Ok(None);
        }

        let graph = retry_async_when(
            &self.retry_config().named("task_graph"),
            || collaborators.graph_builder.build(actions),
            WorkerError::is_retryable,
        )
        .await
        .into_result()?;

        let path = self.config.output_dir.join(TASK_GRAPH_FILE);
        write_atomic(&path, graph.as_bytes()).await?;
        info!(path = %path.display(), clips = actions.len(), "Task graph written");

        Ok(Some(path))
    }

    fn require_collaborators(&self) -> WorkerResult<&Collaborators> {
        self.collaborators
            .as_ref()
            .ok_or_else(|| WorkerError::config_error("no collaborators configured"))
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig::new("collaborator")
            .with_max_retries(self.config.max_retries)
            .with_base_delay(self.config.retry_base_delay)
    }
}

/// Serialize `value` as pretty JSON and write it atomically.
async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> WorkerResult<()> {
    let json = serde_json::to_vec_pretty(value)?;
    write_atomic(path, &json).await
}

/// Write to a sibling temp file, then rename over `path`.
async fn write_atomic(path: &Path, contents: &[u8]) -> WorkerResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| WorkerError::invalid_input(format!("not a file path: {}", path.display())))?;
    let tmp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
