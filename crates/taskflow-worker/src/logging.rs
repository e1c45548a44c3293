//! Structured run logging.
//!
//! Every pipeline run gets a fresh id so interleaved runs can be told apart in
//! aggregated logs.

use tracing::{error, info, warn, Span};
use uuid::Uuid;

/// Logger that tags events with a run id and operation.
#[derive(Debug, Clone)]
pub struct RunLogger {
    run_id: String,
    operation: String,
}

impl RunLogger {
    /// New logger with a random run id.
    pub fn new(operation: &str) -> Self {
        Self::with_run_id(&Uuid::new_v4().to_string(), operation)
    }

    pub fn with_run_id(run_id: &str, operation: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            run_id = %self.run_id,
            operation = %self.operation,
            "Run completed: {}", message
        );
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Span carrying the run id, for instrumenting nested work.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "run",
            run_id = %self.run_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique() {
        let a = RunLogger::new("segment");
        let b = RunLogger::new("segment");
        assert_ne!(a.run_id(), b.run_id());
        assert!(Uuid::parse_str(a.run_id()).is_ok());
        assert_eq!(a.operation(), "segment");
    }

    #[test]
    fn test_explicit_run_id() {
        let logger = RunLogger::with_run_id("run-1", "taskflow");
        assert_eq!(logger.run_id(), "run-1");
        logger.log_progress("no subscriber installed");
    }
}
