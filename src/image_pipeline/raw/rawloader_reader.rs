//! RAW image reader implementation using the rawloader library.
//!
//! This module provides support for reading camera RAW formats (ARW, CR2, NEF, DNG, etc.)
//! through rawloader. Besides the sensor mosaic it hands back a
//! [`RawLoaderMetadata`] so the rest of the pipeline reads levels, white
//! balance, colour matrix and orientation from the same file.

use std::io::Cursor;

use rawloader::RawImageData as RawloaderImageData;
use tracing::{debug, warn};

use crate::image_pipeline::common::error::{DevelopError, Result};
use crate::image_pipeline::metadata::{keys, MetadataProvider, RawLoaderMetadata};
use crate::image_pipeline::raw::cfa::CfaPattern;
use crate::image_pipeline::raw::reader::RawImageReader;
use crate::image_pipeline::raw::sample_reader::read_levels;
use crate::image_pipeline::raw::types::GrayImage;

/// RAW image reader that uses the rawloader library for decoding.
///
/// Only single-component Bayer sensors are accepted. Linear DNGs and X-Trans
/// sensors are rejected with [`DevelopError::UnsupportedFormat`].
///
/// The mosaic is cropped to the visible area rawloader reports, with the CFA
/// pattern moved to the new origin. The metadata keeps the full sensor
/// geometry and pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawLoaderReader;

impl RawImageReader for RawLoaderReader {
    type Metadata = RawLoaderMetadata;

    /// Decodes a camera file held in memory.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rawdev_rs::image_pipeline::{RawImageReader, RawLoaderReader};
    ///
    /// let raw_bytes = std::fs::read("image.nef").unwrap();
    /// let (mosaic, metadata) = RawLoaderReader.read_raw(&raw_bytes).unwrap();
    /// ```
    fn read_raw(&self, data: &[u8]) -> Result<(GrayImage, RawLoaderMetadata)> {
        debug!("Decoding RAW image, {} bytes", data.len());

        let decoded = rawloader::decode(&mut Cursor::new(data))
            .map_err(|e| DevelopError::DecodeError(e.to_string()))?;

        if decoded.cpp != 1 {
            return Err(DevelopError::unsupported(
                "read",
                format!("{} components per pixel", decoded.cpp),
            ));
        }

        let width = decoded.width;
        let height = decoded.height;
        debug!("Decoded image: {}x{}", width, height);

        let metadata = RawLoaderMetadata::from_image(&decoded);

        // Float data is normalized to 0.0-1.0
        let samples: Vec<u16> = match decoded.data {
            RawloaderImageData::Integer(values) => values,
            RawloaderImageData::Float(values) => values
                .iter()
                .map(|&v| (v * u16::MAX as f32).round().clamp(0.0, u16::MAX as f32) as u16)
                .collect(),
        };

        let sensor_cfa = CfaPattern::from_name(&metadata.get_string(keys::CFA_PATTERN)?)?;
        let (bits_per_sample, black_levels, white_levels) = read_levels(&metadata)?;

        let visible = VisibleArea::from_crops(width, height, decoded.crops);
        let cfa = sensor_cfa.shifted(visible.top, visible.left);
        let (width, height, samples) = visible.crop(width, samples);

        debug!(
            "CFA {}, {} bits per sample, black {:?}, white {:?}",
            cfa, bits_per_sample, black_levels, white_levels
        );

        let mut image = GrayImage::new(width, height, samples, cfa)?
            .with_levels(black_levels, white_levels);
        image.bits_per_sample = bits_per_sample;

        Ok((image, metadata))
    }
}

/// Part of the sensor outside the masked borders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VisibleArea {
    top: usize,
    left: usize,
    width: usize,
    height: usize,
}

impl VisibleArea {
    /// `crops` is `[top, right, bottom, left]`. Crops that leave nothing
    /// visible are ignored.
    fn from_crops(width: usize, height: usize, crops: [usize; 4]) -> Self {
        let [top, right, bottom, left] = crops;
        let full = Self { top: 0, left: 0, width, height };
        let (Some(visible_width), Some(visible_height)) = (
            width.checked_sub(left + right).filter(|&w| w > 0),
            height.checked_sub(top + bottom).filter(|&h| h > 0),
        ) else {
            warn!("Ignoring crop {:?} for a {}x{} sensor", crops, width, height);
            return full;
        };
        Self { top, left, width: visible_width, height: visible_height }
    }

    fn is_full(&self, width: usize) -> bool {
        self.top == 0 && self.left == 0 && self.width == width
    }

    /// Copies the visible rows out of a `sensor_width`-wide buffer.
    fn crop(&self, sensor_width: usize, samples: Vec<u16>) -> (usize, usize, Vec<u16>) {
        if self.is_full(sensor_width) {
            let mut samples = samples;
            samples.truncate(self.width * self.height);
            return (self.width, self.height, samples);
        }
        debug!(
            "Cropping to visible area {}x{} at ({}, {})",
            self.width, self.height, self.left, self.top
        );
        let data = samples
            .chunks_exact(sensor_width)
            .skip(self.top)
            .take(self.height)
            .flat_map(|row| &row[self.left..self.left + self.width])
            .copied()
            .collect();
        (self.width, self.height, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crop_keeps_visible_area() {
        // 4x3 sensor, one masked column each side and one masked top row
        let samples: Vec<u16> = (0..12).collect();
        let visible = VisibleArea::from_crops(4, 3, [1, 1, 0, 1]);
        assert_eq!(visible, VisibleArea { top: 1, left: 1, width: 2, height: 2 });
        assert_eq!(visible.crop(4, samples), (2, 2, vec![5, 6, 9, 10]));
        assert_eq!(CfaPattern::RGGB.shifted(visible.top, visible.left), CfaPattern::BGGR);
    }

    #[test]
    fn test_crop_larger_than_sensor_is_ignored() {
        let visible = VisibleArea::from_crops(4, 3, [2, 0, 2, 0]);
        assert_eq!(visible, VisibleArea { top: 0, left: 0, width: 4, height: 3 });
        let samples: Vec<u16> = (0..12).collect();
        assert_eq!(visible.crop(4, samples.clone()), (4, 3, samples));
    }

    #[test]
    fn test_rejects_non_raw_bytes() {
        let result = RawLoaderReader.read_raw(b"definitely not a camera file");
        assert!(matches!(result, Err(DevelopError::DecodeError(_))));
    }
}
