//! Per-frame change detection.
//!
//! Two independent signals are computed for every sampled frame after the first:
//!
//! | Signal | Source | Module |
//! |--------|--------|--------|
//! | Motion | thresholded luma difference vs. previous frame | [`motion`] |
//! | Object set | label set from an injected [`ObjectSetDetector`] | [`object_detector`] |
//!
//! [`ChangeDetector`] combines them with logical OR.

pub mod change;
pub mod motion;
#[cfg(feature = "onnx")]
pub mod object_detector;

use std::collections::BTreeSet;

use crate::error::MediaResult;
use crate::frame::Frame;

pub use change::{ChangeDetector, ChangeSignal};
pub use motion::MotionDetector;
#[cfg(feature = "onnx")]
pub use object_detector::{ObjectDetection, ObjectDetectorConfig, YoloObjectDetector};

/// Distinct category labels present in a frame.
pub type ObjectSet = BTreeSet<String>;

/// Capability that lists the object categories visible in a frame.
///
/// Implementations are constructed once by the orchestrator and shared by
/// reference; `detect` must not depend on previously seen frames.
pub trait ObjectSetDetector: Send + Sync {
    /// Detect the set of object labels in `frame`.
    fn detect(&self, frame: &Frame) -> MediaResult<ObjectSet>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Detector that never sees any objects, leaving motion as the only signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObjectDetector;

impl ObjectSetDetector for NullObjectDetector {
    fn detect(&self, _frame: &Frame) -> MediaResult<ObjectSet> {
        Ok(ObjectSet::new())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}
