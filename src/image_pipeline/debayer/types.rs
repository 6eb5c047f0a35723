//! Types for debayering operations

use crate::image_pipeline::common::error::{DevelopError, Result};

/// Interleaved RGB image at 16-bit working depth
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u16>,
}

impl RgbImage {
    pub fn new(width: usize, height: usize, data: Vec<u16>) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(3))
            .ok_or(DevelopError::InvalidDimensions(width, height))?;
        if data.len() != expected {
            return Err(DevelopError::malformed(
                "rgb",
                format!("{} samples for a {width}x{height} RGB image", data.len()),
            ));
        }
        Ok(Self { width, height, data })
    }

    /// Image with every pixel set to `pixel`.
    pub fn filled(width: usize, height: usize, pixel: [u16; 3]) -> Self {
        let data = std::iter::repeat_n(pixel, width * height).flatten().collect();
        Self { width, height, data }
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn pixel(&self, row: usize, col: usize) -> [u16; 3] {
        let i = (row * self.width + col) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    #[inline]
    pub fn set_pixel(&mut self, row: usize, col: usize, pixel: [u16; 3]) {
        let i = (row * self.width + col) * 3;
        self.data[i..i + 3].copy_from_slice(&pixel);
    }
}
