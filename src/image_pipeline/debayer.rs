//! Debayering module for converting Bayer pattern RAW images to RGB

pub mod ahd;
pub mod bilinear;
pub mod types;

use crate::image_pipeline::color::matrix::ColorMatrix;
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::raw::types::GrayImage;

pub use ahd::AhdInterpolator;
pub use bilinear::BilinearInterpolator;
pub use types::RgbImage;

/// Demosaic algorithm, chosen in the pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Ahd,
    Bilinear,
}

impl Interpolation {
    /// Demosaics `mosaic`. `cam_to_xyz` is only used by AHD.
    pub fn run(self, mosaic: GrayImage, cam_to_xyz: ColorMatrix) -> Result<RgbImage> {
        match self {
            Interpolation::Ahd => AhdInterpolator::new(cam_to_xyz).interpolate(mosaic),
            Interpolation::Bilinear => BilinearInterpolator::new().interpolate(mosaic),
        }
    }
}
