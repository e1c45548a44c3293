//! Frame-difference motion test.
//!
//! Pixels whose luma changed by more than `threshold` are counted; motion is
//! declared when that count exceeds the frame's pixel count. The comparison is
//! a raw tally against `width * height`, not a fraction.

use image::GrayImage;

use crate::error::{MediaError, MediaResult};

/// Simple frame-diff motion detector over full-resolution luma.
#[derive(Debug, Clone, Copy)]
pub struct MotionDetector {
    /// Minimum pixel intensity change to count as motion (0-255).
    threshold: u8,
}

impl MotionDetector {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Number of pixels whose absolute luma difference exceeds the threshold.
    pub fn changed_pixels(&self, prev: &GrayImage, curr: &GrayImage) -> MediaResult<u64> {
        if prev.dimensions() != curr.dimensions() {
            return Err(MediaError::decode(format!(
                "frame size changed mid-stream: {:?} -> {:?}",
                prev.dimensions(),
                curr.dimensions()
            )));
        }

        let count = prev
            .as_raw()
            .iter()
            .zip(curr.as_raw().iter())
            .filter(|(a, b)| a.abs_diff(**b) > self.threshold)
            .count();

        Ok(count as u64)
    }

    /// Whether the changed-pixel tally exceeds `width * height`.
    pub fn detect(&self, prev: &GrayImage, curr: &GrayImage) -> MediaResult<bool> {
        let changed = self.changed_pixels(prev, curr)?;
        let frame_size = curr.width() as u64 * curr.height() as u64;
        Ok(changed > frame_size)
    }
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new(taskflow_models::config::DEFAULT_MOTION_THRESHOLD)
    }
}
