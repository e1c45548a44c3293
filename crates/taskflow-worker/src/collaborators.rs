//! External collaborators of the task-flow stage.
//!
//! The pipeline only knows these traits. Concrete speech-to-text, captioning
//! and task-graph services are supplied by the embedding application.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use taskflow_media::{extract_audio, FfmpegRunner};
use taskflow_models::{ClipActions, ClipArtifact};

use crate::error::WorkerResult;

/// Produces the audio track a [`Transcriber`] consumes.
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    async fn extract(&self, clip: &ClipArtifact) -> WorkerResult<PathBuf>;
}

/// Speech-to-text over an extracted audio file.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &Path) -> WorkerResult<String>;
}

/// Describes the actions in a clip. Returns the service's raw text answer.
#[async_trait]
pub trait Captioner: Send + Sync {
    async fn caption(&self, clip: &ClipArtifact, transcript: &str) -> WorkerResult<String>;
}

/// Turns the merged per-clip actions into a task graph (e.g. a Mermaid flowchart).
#[async_trait]
pub trait TaskGraphBuilder: Send + Sync {
    async fn build(&self, clips: &[ClipActions]) -> WorkerResult<String>;
}

/// Extracts 16 kHz mono WAV tracks with FFmpeg.
pub struct FfmpegAudioExtractor {
    runner: FfmpegRunner,
    output_dir: PathBuf,
}

impl FfmpegAudioExtractor {
    pub fn new(runner: FfmpegRunner, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegAudioExtractor {
    async fn extract(&self, clip: &ClipArtifact) -> WorkerResult<PathBuf> {
        Ok(extract_audio(&self.runner, &clip.path, &self.output_dir).await?)
    }
}

/// The full set of collaborators needed to describe clips.
#[derive(Clone)]
pub struct Collaborators {
    pub audio: Arc<dyn AudioExtractor>,
    pub transcriber: Arc<dyn Transcriber>,
    pub captioner: Arc<dyn Captioner>,
    pub graph_builder: Arc<dyn TaskGraphBuilder>,
}

impl Collaborators {
    pub fn new(
        audio: Arc<dyn AudioExtractor>,
        transcriber: Arc<dyn Transcriber>,
        captioner: Arc<dyn Captioner>,
        graph_builder: Arc<dyn TaskGraphBuilder>,
    ) -> Self {
        Self {
            audio,
            transcriber,
            captioner,
            graph_builder,
        }
    }
}
