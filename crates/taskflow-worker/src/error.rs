//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A transcription, captioning or task-graph call failed.
    #[error("{stage} failed: {message}")]
    CollaboratorFailed {
        stage: &'static str,
        message: String,
    },

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] taskflow_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn collaborator_failed(stage: &'static str, msg: impl Into<String>) -> Self {
        Self::CollaboratorFailed {
            stage,
            message: msg.into(),
        }
    }

    /// Check if error is retryable.
    ///
    /// Collaborators talk to external services, and FFmpeg may time out under
    /// load; everything else is deterministic and will fail again.
    pub fn is_retryable(&self) -> bool {
        use taskflow_media::MediaError;

        match self {
            WorkerError::CollaboratorFailed { .. } => true,
            WorkerError::Media(MediaError::Timeout(_)) => true,
            _ => false,
        }
    }
}

impl From<taskflow_models::ConfigError> for WorkerError {
    fn from(err: taskflow_models::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskflow_media::MediaError;

    #[test]
    fn test_retryable_classification() {
        assert!(WorkerError::collaborator_failed("caption", "503").is_retryable());
        assert!(WorkerError::Media(MediaError::Timeout(30)).is_retryable());
        assert!(!WorkerError::Media(MediaError::decode("truncated")).is_retryable());
        assert!(!WorkerError::config_error("bad").is_retryable());
    }

    #[test]
    fn test_collaborator_message() {
        let err = WorkerError::collaborator_failed("transcribe", "model unavailable");
        assert_eq!(err.to_string(), "transcribe failed: model unavailable");
    }
}
