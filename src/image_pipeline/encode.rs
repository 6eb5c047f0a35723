//! Output image encoding
//!
//! The encoder is chosen once, from the configured [`OutputFormat`], when the
//! pipeline is built. The TIFF encoder only exists with the `tiff-output`
//! feature; without it every format falls back to PPM.

mod ppm_encoder;
#[cfg(feature = "tiff-output")]
mod tiff_encoder;
pub mod types;
mod writer;

use std::io::Write;

use tracing::warn;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::debayer::types::RgbImage;

pub use ppm_encoder::PpmEncoder;
#[cfg(feature = "tiff-output")]
pub use tiff_encoder::TiffEncoder;
pub use types::{OutputDepth, OutputFormat, TiffCompression};
pub use writer::ImageEncoder;

#[derive(Debug, Clone, Copy)]
pub enum Encoder {
    #[cfg(feature = "tiff-output")]
    Tiff(TiffEncoder),
    Ppm(PpmEncoder),
}

impl Encoder {
    #[cfg(feature = "tiff-output")]
    pub fn select(format: OutputFormat, compression: TiffCompression, predictor: Option<u16>) -> Self {
        match format {
            OutputFormat::Tiff => Encoder::Tiff(TiffEncoder::new(compression, predictor)),
            OutputFormat::Ppm => Encoder::Ppm(PpmEncoder),
        }
    }

    // Fallback when built without TIFF support
    #[cfg(not(feature = "tiff-output"))]
    pub fn select(format: OutputFormat, _compression: TiffCompression, _predictor: Option<u16>) -> Self {
        if format == OutputFormat::Tiff {
            warn!("Built without TIFF support, writing PPM instead");
        }
        Encoder::Ppm(PpmEncoder)
    }

    pub fn format(&self) -> OutputFormat {
        match self {
            #[cfg(feature = "tiff-output")]
            Encoder::Tiff(_) => OutputFormat::Tiff,
            Encoder::Ppm(_) => OutputFormat::Ppm,
        }
    }
}

impl ImageEncoder for Encoder {
    fn encode(&self, image: &RgbImage, depth: OutputDepth, output: &mut dyn Write) -> Result<OutputDepth> {
        let written = match self {
            #[cfg(feature = "tiff-output")]
            Encoder::Tiff(encoder) => encoder.encode(image, depth, output)?,
            Encoder::Ppm(encoder) => encoder.encode(image, depth, output)?,
        };
        if written != depth {
            warn!("Requested {}-bit output, wrote {}-bit", depth.bits(), written.bits());
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ppm_is_always_available() {
        let encoder = Encoder::select(OutputFormat::Ppm, TiffCompression::Lzw, None);
        assert_eq!(encoder.format(), OutputFormat::Ppm);
    }

    #[cfg(feature = "tiff-output")]
    #[test]
    fn test_tiff_selected_with_feature() {
        let encoder = Encoder::select(OutputFormat::Tiff, TiffCompression::Lzw, Some(2));
        assert_eq!(encoder.format(), OutputFormat::Tiff);
    }

    #[cfg(not(feature = "tiff-output"))]
    #[test]
    fn test_tiff_falls_back_without_feature() {
        let encoder = Encoder::select(OutputFormat::Tiff, TiffCompression::Lzw, Some(2));
        assert_eq!(encoder.format(), OutputFormat::Ppm);
    }
}
