//! Object-set detector selection.

use std::sync::Arc;

use taskflow_media::{NullObjectDetector, ObjectSetDetector};
use tracing::info;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Construct the detector for a run. Built once and shared by every frame.
pub fn build_detector(config: &WorkerConfig) -> WorkerResult<Arc<dyn ObjectSetDetector>> {
    if !config.object_detection {
        info!("Object detection disabled, boundaries come from motion only");
        return Ok(Arc::new(NullObjectDetector));
    }
    load_model(config)
}

#[cfg(feature = "onnx")]
fn load_model(config: &WorkerConfig) -> WorkerResult<Arc<dyn ObjectSetDetector>> {
    use taskflow_media::{ObjectDetectorConfig, YoloObjectDetector};

    let detector = YoloObjectDetector::new(
        ObjectDetectorConfig::default().with_model_path(&config.model_path),
    )?;
    Ok(Arc::new(detector))
}

#[cfg(not(feature = "onnx"))]
fn load_model(_config: &WorkerConfig) -> WorkerResult<Arc<dyn ObjectSetDetector>> {
    Err(crate::error::WorkerError::config_error(
        "object detection needs the `onnx` feature; set TASKFLOW_OBJECT_DETECTION=false",
    ))
}
