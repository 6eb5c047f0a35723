//! RAW mosaic data types

use crate::image_pipeline::common::error::{DevelopError, Result};
use crate::image_pipeline::raw::cfa::{CfaColor, CfaPattern};

/// Highest value of the 16-bit working range.
pub const MAX_WORKING_VALUE: u16 = u16::MAX;

/// Single-channel sensor mosaic at 16-bit working depth.
#[derive(Debug, Clone)]
pub struct GrayImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// Row-major samples, one per sensor site
    pub data: Vec<u16>,
    /// Colour identity of each site
    pub cfa: CfaPattern,
    /// Black level per [`CfaColor`] index
    pub black_levels: [u16; 4],
    /// White (saturation) level per [`CfaColor`] index
    pub white_levels: [u16; 4],
    /// Actual bits per sample from the sensor (e.g., 12, 14, or 16)
    pub bits_per_sample: u32,
}

impl GrayImage {
    /// Wraps `data` with a black level of 0 and a full-range white level.
    pub fn new(width: usize, height: usize, data: Vec<u16>, cfa: CfaPattern) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DevelopError::malformed(
                "read",
                format!("image dimensions {width}x{height} are empty"),
            ));
        }
        let expected = width
            .checked_mul(height)
            .ok_or(DevelopError::InvalidDimensions(width, height))?;
        if data.len() != expected {
            return Err(DevelopError::malformed(
                "read",
                format!("{} samples for a {width}x{height} image", data.len()),
            ));
        }

        Ok(Self {
            width,
            height,
            data,
            cfa,
            black_levels: [0; 4],
            white_levels: [MAX_WORKING_VALUE; 4],
            bits_per_sample: 16,
        })
    }

    pub fn with_levels(mut self, black_levels: [u16; 4], white_levels: [u16; 4]) -> Self {
        self.black_levels = black_levels;
        self.white_levels = white_levels;
        self
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.data[row * self.width + col]
    }

    #[inline]
    pub fn color_at(&self, row: usize, col: usize) -> CfaColor {
        self.cfa.color_at(row, col)
    }
}
