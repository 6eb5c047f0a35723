//! Black level subtraction, white balance and range normalization.

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{DevelopError, Result};
use crate::image_pipeline::metadata::{keys, MetadataProvider};
use crate::image_pipeline::raw::cfa::CfaColor;
use crate::image_pipeline::raw::types::{GrayImage, MAX_WORKING_VALUE};

/// Per-identity white balance gains applied while stretching each channel's
/// `[black, white]` range to the full 16-bit working range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleColorsFilter {
    gains: [f32; 4],
}

impl Default for ScaleColorsFilter {
    fn default() -> Self {
        Self { gains: [1.0; 4] }
    }
}

impl ScaleColorsFilter {
    pub fn new(gains: [f32; 4]) -> Self {
        Self { gains }
    }

    /// Reads `Raw.WhiteBalance.<identity>`; channels without an entry get 1.0.
    pub fn from_metadata<M: MetadataProvider>(metadata: &M) -> Result<Self> {
        let mut gains = [1.0f32; 4];
        for color in CfaColor::ALL {
            let key = keys::white_balance(color);
            let gain = metadata.get_float_or(&key, 1.0)?;
            if !gain.is_finite() || gain < 0.0 {
                return Err(DevelopError::malformed(
                    "scale",
                    format!("{key} is {gain}"),
                ));
            }
            gains[color.index()] = gain as f32;
        }
        Ok(Self { gains })
    }

    pub fn gains(&self) -> [f32; 4] {
        self.gains
    }

    /// Scales every sample in place. Afterwards the image's black levels are 0
    /// and its white levels 65535.
    #[instrument(skip_all, name = "scale_colors")]
    pub fn apply(&self, image: &mut GrayImage) -> Result<()> {
        let mut factors = [0.0f32; 4];
        for color in CfaColor::ALL {
            let i = color.index();
            let (black, white) = (image.black_levels[i], image.white_levels[i]);
            if white <= black {
                return Err(DevelopError::malformed(
                    "scale",
                    format!("{} white level {white} is not above black level {black}", color.name()),
                ));
            }
            factors[i] = self.gains[i] * MAX_WORKING_VALUE as f32 / (white - black) as f32;
        }
        debug!("Scale factors {:?}, black levels {:?}", factors, image.black_levels);

        let width = image.width;
        let cfa = image.cfa;
        let black = image.black_levels;

        image
            .data
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(row, samples)| {
                for (col, sample) in samples.iter_mut().enumerate() {
                    let c = cfa.color_at(row, col).index();
                    let scaled = (*sample as f32 - black[c] as f32) * factors[c];
                    *sample = scaled.round().clamp(0.0, MAX_WORKING_VALUE as f32) as u16;
                }
            });

        image.black_levels = [0; 4];
        image.white_levels = [MAX_WORKING_VALUE; 4];
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::metadata::InMemoryMetadata;
    use crate::image_pipeline::raw::cfa::CfaPattern;

    fn mosaic(data: Vec<u16>) -> GrayImage {
        GrayImage::new(2, 2, data, CfaPattern::RGGB).unwrap()
    }

    #[test]
    fn test_unit_gain_full_range_is_identity() {
        let mut image = mosaic(vec![100, 150, 150, 200]);
        ScaleColorsFilter::from_metadata(&InMemoryMetadata::new())
            .unwrap()
            .apply(&mut image)
            .unwrap();
        assert_eq!(image.data, vec![100, 150, 150, 200]);
    }

    #[test]
    fn test_overflowing_gain_clamps() {
        let metadata = InMemoryMetadata::new()
            .with(keys::white_balance(CfaColor::Red), 1.0e30)
            .with(keys::white_balance(CfaColor::Blue), 0.5);
        let mut image = mosaic(vec![60000, 40000, 40000, 3]).with_levels([10; 4], [4095; 4]);

        ScaleColorsFilter::from_metadata(&metadata)
            .unwrap()
            .apply(&mut image)
            .unwrap();

        assert_eq!(image.data[0], u16::MAX);
        assert_eq!(image.data[1], u16::MAX);
        assert_eq!(image.data[3], 0);
        assert_eq!(image.black_levels, [0; 4]);
        assert_eq!(image.white_levels, [u16::MAX; 4]);
    }

    #[test]
    fn test_black_level_and_range_stretch() {
        let mut image = mosaic(vec![10, 265, 138, 5]).with_levels([10; 4], [265; 4]);
        ScaleColorsFilter::default().apply(&mut image).unwrap();
        assert_eq!(image.data, vec![0, u16::MAX, 128 * 257, 0]);
    }

    #[test]
    fn test_rejects_inverted_levels_and_negative_gain() {
        let mut image = mosaic(vec![0; 4]).with_levels([100; 4], [100; 4]);
        assert!(ScaleColorsFilter::default().apply(&mut image).is_err());

        let metadata = InMemoryMetadata::new().with(keys::white_balance(CfaColor::Green), -2.0);
        assert!(matches!(
            ScaleColorsFilter::from_metadata(&metadata),
            Err(DevelopError::MalformedInput { stage: "scale", .. })
        ));
    }
}
