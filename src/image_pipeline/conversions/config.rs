//! Pipeline configuration

use crate::image_pipeline::color::matrix::ColorMatrix;
use crate::image_pipeline::debayer::Interpolation;
use crate::image_pipeline::encode::types::{OutputDepth, OutputFormat, TiffCompression};
use crate::image_pipeline::tone::gamma::ToneConfig;

/// Configuration for developing a RAW capture
#[derive(Debug, Clone, PartialEq)]
pub struct DevelopConfig {
    /// File format written by the encoder
    pub output_format: OutputFormat,
    /// Requested sample depth of the output file
    pub output_depth: OutputDepth,
    /// TIFF compression method
    pub compression: TiffCompression,
    /// Predictor value for compression (typically 2 for horizontal differencing)
    /// Note: Predictor adds processing time, set to None for maximum speed
    pub predictor: Option<u16>,
    /// Demosaic algorithm
    pub interpolation: Interpolation,
    /// Camera to sRGB matrix used instead of the one found for the camera
    pub color_matrix: Option<ColorMatrix>,
    /// Tone curve parameters
    pub tone: ToneConfig,
    /// Whether to rotate/flip the result per the capture's orientation
    pub apply_orientation: bool,
    /// Whether to validate image dimensions before developing
    pub validate_dimensions: bool,
    /// Largest accepted width or height when validating
    pub max_dimension: Option<usize>,
}

impl Default for DevelopConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Tiff,
            output_depth: OutputDepth::Eight,
            compression: TiffCompression::None,
            predictor: None,
            interpolation: Interpolation::Ahd,
            color_matrix: None,
            tone: ToneConfig::default(),
            apply_orientation: true,
            validate_dimensions: true,
            max_dimension: None,
        }
    }
}

impl DevelopConfig {
    pub fn builder() -> DevelopConfigBuilder {
        DevelopConfigBuilder::default()
    }
}

/// Builder for DevelopConfig
#[derive(Default)]
pub struct DevelopConfigBuilder {
    output_format: Option<OutputFormat>,
    output_depth: Option<OutputDepth>,
    compression: Option<TiffCompression>,
    predictor: Option<Option<u16>>,
    interpolation: Option<Interpolation>,
    color_matrix: Option<Option<ColorMatrix>>,
    tone: Option<ToneConfig>,
    apply_orientation: Option<bool>,
    validate_dimensions: Option<bool>,
    max_dimension: Option<Option<usize>>,
}

impl DevelopConfigBuilder {
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }

    pub fn output_depth(mut self, depth: OutputDepth) -> Self {
        self.output_depth = Some(depth);
        self
    }

    pub fn compression(mut self, compression: TiffCompression) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn predictor(mut self, predictor: Option<u16>) -> Self {
        self.predictor = Some(predictor);
        self
    }

    pub fn interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = Some(interpolation);
        self
    }

    pub fn color_matrix(mut self, matrix: Option<ColorMatrix>) -> Self {
        self.color_matrix = Some(matrix);
        self
    }

    pub fn tone(mut self, tone: ToneConfig) -> Self {
        self.tone = Some(tone);
        self
    }

    pub fn apply_orientation(mut self, enable: bool) -> Self {
        self.apply_orientation = Some(enable);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn max_dimension(mut self, max: Option<usize>) -> Self {
        self.max_dimension = Some(max);
        self
    }

    pub fn build(self) -> DevelopConfig {
        let default = DevelopConfig::default();
        DevelopConfig {
            output_format: self.output_format.unwrap_or(default.output_format),
            output_depth: self.output_depth.unwrap_or(default.output_depth),
            compression: self.compression.unwrap_or(default.compression),
            predictor: self.predictor.unwrap_or(default.predictor),
            interpolation: self.interpolation.unwrap_or(default.interpolation),
            color_matrix: self.color_matrix.unwrap_or(default.color_matrix),
            tone: self.tone.unwrap_or(default.tone),
            apply_orientation: self.apply_orientation.unwrap_or(default.apply_orientation),
            validate_dimensions: self.validate_dimensions.unwrap_or(default.validate_dimensions),
            max_dimension: self.max_dimension.unwrap_or(default.max_dimension),
        }
    }
}
