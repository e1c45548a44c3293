//! Task-flow pipeline orchestration.
//!
//! This crate provides:
//! - Environment and command-line configuration
//! - Detector selection
//! - The segment → clip → describe → task-graph run
//! - Collaborator traits for transcription, captioning and task graphs
//! - Retry with exponential backoff and per-run structured logging

pub mod cli;
pub mod collaborators;
pub mod config;
pub mod detector;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod retry;

pub use cli::Cli;
pub use collaborators::{
    AudioExtractor, Captioner, Collaborators, FfmpegAudioExtractor, TaskGraphBuilder, Transcriber,
};
pub use config::WorkerConfig;
pub use detector::build_detector;
pub use error::{WorkerError, WorkerResult};
pub use logging::RunLogger;
pub use pipeline::{ActionFailure, DescribeOutcome, RunReport, TaskFlowPipeline};
pub use retry::{retry_async, retry_async_when, RetryConfig, RetryResult};
