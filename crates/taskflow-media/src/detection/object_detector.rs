//! YOLOv8 ONNX object detector.
//!
//! Execution provider selection:
//! - CUDA on Linux with NVIDIA GPU (`cuda` feature)
//! - CoreML on macOS
//! - CPU fallback on all platforms
//!
//! Only the set of detected COCO labels matters to segmentation; boxes are
//! kept so NMS can be applied per class before the labels are collected.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use image::imageops::FilterType;
use image::RgbImage;
use ndarray::ArrayView2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use super::{ObjectSet, ObjectSetDetector};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Bounding box features per candidate (cx, cy, w, h).
const BOX_FEATURES: usize = 4;

/// COCO class names (80 classes).
pub const COCO_CLASSES: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck",
    "boat", "traffic light", "fire hydrant", "stop sign", "parking meter", "bench",
    "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra",
    "giraffe", "backpack", "umbrella", "handbag", "tie", "suitcase", "frisbee",
    "skis", "snowboard", "sports ball", "kite", "baseball bat", "baseball glove",
    "skateboard", "surfboard", "tennis racket", "bottle", "wine glass", "cup",
    "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
    "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
    "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier",
    "toothbrush",
];

/// One detected object in normalized [0, 1] coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDetection {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// COCO class ID (0 = person, 39 = bottle, ...)
    pub class_id: usize,
    pub confidence: f32,
}

impl ObjectDetection {
    /// COCO label, if the class id is in range.
    pub fn label(&self) -> Option<&'static str> {
        COCO_CLASSES.get(self.class_id).copied()
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &ObjectDetection) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Configuration for the YOLOv8 detector.
#[derive(Debug, Clone)]
pub struct ObjectDetectorConfig {
    /// Path to ONNX model file
    pub model_path: PathBuf,
    /// Minimum class score to keep a candidate
    pub confidence_threshold: f32,
    /// IoU threshold for NMS
    pub nms_threshold: f32,
    /// Square model input size
    pub input_size: u32,
}

impl Default for ObjectDetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/yolov8n.onnx"),
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
            input_size: 640,
        }
    }
}

impl ObjectDetectorConfig {
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }
}

/// YOLOv8 detector backed by an ONNX Runtime session.
pub struct YoloObjectDetector {
    session: Mutex<Session>,
    config: ObjectDetectorConfig,
}

impl YoloObjectDetector {
    /// Load the model. Fails if the model file is missing or cannot be loaded.
    pub fn new(config: ObjectDetectorConfig) -> MediaResult<Self> {
        if !config.model_path.exists() {
            return Err(MediaError::model_not_found(
                config.model_path.to_string_lossy(),
            ));
        }

        let session = Mutex::new(create_session(&config.model_path)?);
        info!(
            model_path = %config.model_path.display(),
            input_size = config.input_size,
            "Object detector initialized"
        );

        Ok(Self { session, config })
    }

    pub fn config(&self) -> &ObjectDetectorConfig {
        &self.config
    }

    /// Detect boxes in an RGB image.
    pub fn detect_boxes(&self, image: &RgbImage) -> MediaResult<Vec<ObjectDetection>> {
        let input = self.preprocess(image)?;
        let (num_features, outputs) = self.run_inference(input)?;
        let candidates = decode_output(
            &outputs,
            num_features,
            self.config.input_size,
            self.config.confidence_threshold,
        )?;
        Ok(non_maximum_suppression(candidates, self.config.nms_threshold))
    }

    /// Resize to the model input, scale to [0, 1] and lay out as NCHW.
    fn preprocess(&self, image: &RgbImage) -> MediaResult<Value> {
        let size = self.config.input_size;
        let resized = image::imageops::resize(image, size, size, FilterType::Triangle);
        let (w, h) = (size as usize, size as usize);

        let mut chw_data: Vec<f32> = vec![0.0; 3 * h * w];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let offset = y as usize * w + x as usize;
            for c in 0..3 {
                chw_data[c * h * w + offset] = pixel[c] as f32 / 255.0;
            }
        }

        let shape = vec![1usize, 3, h, w];
        Tensor::from_array((shape, chw_data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| MediaError::detection_failed(format!("failed to create tensor: {}", e)))
    }

    /// Run the session; returns the feature count and the flat `[features, candidates]` output.
    fn run_inference(&self, input: Value) -> MediaResult<(usize, Vec<f32>)> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| MediaError::internal("Session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| MediaError::detection_failed(format!("ONNX inference failed: {}", e)))?;

        // YOLOv8 output is [1, 4 + classes, candidates]
        let output = outputs
            .get("output0")
            .ok_or_else(|| MediaError::detection_failed("missing output0 tensor"))?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MediaError::detection_failed(format!("failed to extract tensor: {}", e)))?;

        let num_features = shape
            .get(1)
            .map(|&d| d as usize)
            .ok_or_else(|| MediaError::detection_failed("unexpected output rank"))?;

        Ok((num_features, data.to_vec()))
    }
}

impl ObjectSetDetector for YoloObjectDetector {
    fn detect(&self, frame: &Frame) -> MediaResult<ObjectSet> {
        let detections = self.detect_boxes(&frame.image)?;
        let labels: ObjectSet = detections
            .iter()
            .filter_map(|d| d.label())
            .map(String::from)
            .collect();

        debug!(
            timestamp = frame.timestamp,
            boxes = detections.len(),
            labels = labels.len(),
            "Object detection completed"
        );

        Ok(labels)
    }

    fn name(&self) -> &'static str {
        "yolov8"
    }
}

/// Decode a flat YOLOv8 output laid out as `[num_features, num_candidates]`.
///
/// Each candidate column is `cx, cy, w, h` in model pixels followed by one
/// score per class. Candidates whose best score is below `confidence_threshold`
/// are dropped.
pub fn decode_output(
    outputs: &[f32],
    num_features: usize,
    input_size: u32,
    confidence_threshold: f32,
) -> MediaResult<Vec<ObjectDetection>> {
    if num_features <= BOX_FEATURES || outputs.len() % num_features != 0 {
        return Err(MediaError::detection_failed(format!(
            "unexpected output size {} for {} features",
            outputs.len(),
            num_features
        )));
    }
    let num_candidates = outputs.len() / num_features;

    let view = ArrayView2::from_shape((num_features, num_candidates), outputs)
        .map_err(|e| MediaError::detection_failed(format!("failed to reshape output: {}", e)))?;
    let candidates = view.t();
    let scale = input_size as f32;

    let mut detections = Vec::new();
    for row in candidates.rows() {
        let (best_class, best_score) = row
            .iter()
            .skip(BOX_FEATURES)
            .enumerate()
            .fold((0usize, 0.0f32), |best, (class, &score)| {
                if score > best.1 {
                    (class, score)
                } else {
                    best
                }
            });

        if best_score < confidence_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let x = ((cx - w / 2.0) / scale).clamp(0.0, 1.0);
        let y = ((cy - h / 2.0) / scale).clamp(0.0, 1.0);

        detections.push(ObjectDetection {
            x,
            y,
            width: (w / scale).min(1.0 - x),
            height: (h / scale).min(1.0 - y),
            class_id: best_class,
            confidence: best_score,
        });
    }

    Ok(detections)
}

/// Per-class non-maximum suppression, highest confidence first.
pub fn non_maximum_suppression(
    mut detections: Vec<ObjectDetection>,
    iou_threshold: f32,
) -> Vec<ObjectDetection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<ObjectDetection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let overlaps = keep
            .iter()
            .any(|k| k.class_id == candidate.class_id && k.iou(&candidate) > iou_threshold);
        if !overlaps {
            keep.push(candidate);
        }
    }
    keep
}

/// Create an ONNX Runtime session, preferring hardware execution providers.
fn create_session(model_path: &Path) -> MediaResult<Session> {
    let model_bytes = std::fs::read(model_path)?;

    let builder = Session::builder()
        .map_err(|e| MediaError::internal(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| MediaError::internal(format!("Failed to set optimization level: {}", e)))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!("Using CUDA execution provider for object detection");
                return Ok(session);
            }
        }
        debug!("CUDA execution provider not available, trying alternatives");
    }

    #[cfg(target_os = "macos")]
    {
        use ort::execution_providers::CoreMLExecutionProvider;
        if let Ok(coreml_builder) = builder
            .clone()
            .with_execution_providers([CoreMLExecutionProvider::default().build()])
        {
            if let Ok(session) = coreml_builder.commit_from_memory(&model_bytes) {
                info!("Using CoreML execution provider for object detection");
                return Ok(session);
            }
        }
        debug!("CoreML execution provider not available, using CPU");
    }

    info!("Using CPU execution provider for object detection");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| MediaError::internal(format!("Failed to load ONNX model: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(x: f32, class_id: usize, confidence: f32) -> ObjectDetection {
        ObjectDetection {
            x,
            y: 0.1,
            width: 0.2,
            height: 0.2,
            class_id,
            confidence,
        }
    }

    /// Build a `[features, candidates]` buffer from per-candidate columns.
    fn columns(cols: &[Vec<f32>]) -> (usize, Vec<f32>) {
        let features = cols[0].len();
        let mut flat = vec![0.0; features * cols.len()];
        for (c, col) in cols.iter().enumerate() {
            for (f, value) in col.iter().enumerate() {
                flat[f * cols.len() + c] = *value;
            }
        }
        (features, flat)
    }

    #[test]
    fn test_coco_classes() {
        assert_eq!(COCO_CLASSES.len(), 80);
        assert_eq!(detection(0.0, 0, 0.9).label(), Some("person"));
        assert_eq!(detection(0.0, 39, 0.9).label(), Some("bottle"));
        assert_eq!(detection(0.0, 80, 0.9).label(), None);
    }

    #[test]
    fn test_iou() {
        let a = detection(0.1, 0, 0.9);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
        assert_eq!(a.iou(&detection(0.6, 0, 0.9)), 0.0);
    }

    #[test]
    fn test_nms_is_per_class() {
        let kept = non_maximum_suppression(
            vec![
                detection(0.1, 0, 0.6),
                detection(0.1, 0, 0.9),
                detection(0.1, 2, 0.5),
            ],
            0.45,
        );
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
        assert_eq!(kept[1].class_id, 2);
    }

    #[test]
    fn test_decode_output_thresholds_and_scales() {
        // Two classes; candidate 0 is a confident class-1 box, candidate 1 is noise.
        let (features, flat) = columns(&[
            vec![320.0, 320.0, 64.0, 128.0, 0.1, 0.8],
            vec![100.0, 100.0, 10.0, 10.0, 0.1, 0.1],
        ]);
        let out = decode_output(&flat, features, 640, 0.25).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class_id, 1);
        assert!((out[0].x - 0.45).abs() < 1e-6);
        assert!((out[0].y - 0.4).abs() < 1e-6);
        assert!((out[0].width - 0.1).abs() < 1e-6);
        assert!((out[0].height - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_decode_output_rejects_bad_shape() {
        let result = decode_output(&[0.0; 7], 6, 640, 0.25);
        assert!(matches!(result, Err(MediaError::DetectionFailed(_))));
    }

    #[test]
    fn test_missing_model() {
        let config = ObjectDetectorConfig::default().with_model_path("/nonexistent/yolo.onnx");
        assert!(matches!(
            YoloObjectDetector::new(config),
            Err(MediaError::ModelNotFound(_))
        ));
    }
}
