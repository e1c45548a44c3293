//! Decoded video frames.

use image::{GrayImage, RgbImage};

use crate::error::{MediaError, MediaResult};

/// A sampled RGB frame tagged with its capture time.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Ordinal in the sampled sequence (0, 1, 2, ...)
    pub index: usize,
    /// Ordinal of the native frame this sample was read from
    pub native_index: u64,
    /// Capture time in seconds (`native_index / native_fps`)
    pub timestamp: f64,
    /// Packed RGB pixels
    pub image: RgbImage,
}

impl Frame {
    /// Wrap an already-decoded image.
    pub fn new(index: usize, native_index: u64, timestamp: f64, image: RgbImage) -> Self {
        Self {
            index,
            native_index,
            timestamp,
            image,
        }
    }

    /// Build a frame from raw packed RGB24 bytes.
    pub fn from_rgb_bytes(
        index: usize,
        native_index: u64,
        timestamp: f64,
        width: u32,
        height: u32,
        data: Vec<u8>,
    ) -> MediaResult<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(MediaError::decode(format!(
                "frame {} has {} bytes, expected {} for {}x{} rgb24",
                native_index,
                data.len(),
                expected,
                width,
                height
            )));
        }

        let image = RgbImage::from_raw(width, height, data)
            .ok_or_else(|| MediaError::decode("failed to create frame buffer"))?;
        Ok(Self::new(index, native_index, timestamp, image))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Pixels in this frame.
    pub fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Single-channel intensity using BT.601 weights in fixed point,
    /// the same conversion OpenCV applies for `COLOR_BGR2GRAY`.
    pub fn to_luma(&self) -> GrayImage {
        const R: u32 = 4899;
        const G: u32 = 9617;
        const B: u32 = 1868;
        const SHIFT: u32 = 14;

        let luma: Vec<u8> = self
            .image
            .pixels()
            .map(|p| {
                let [r, g, b] = p.0;
                ((r as u32 * R + g as u32 * G + b as u32 * B + (1 << (SHIFT - 1))) >> SHIFT) as u8
            })
            .collect();

        GrayImage::from_raw(self.width(), self.height(), luma)
            .unwrap_or_else(|| GrayImage::new(self.width(), self.height()))
    }
}
