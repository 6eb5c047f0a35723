//! Camera to sRGB conversion stage.

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::image_pipeline::color::camera::{CameraProfile, ColorConversion};
use crate::image_pipeline::color::matrix::ColorMatrix;
use crate::image_pipeline::common::diagnostics::{Diagnostic, Diagnostics};
use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::debayer::types::RgbImage;
use crate::image_pipeline::metadata::{keys, MetadataProvider};

/// Where the camera to sRGB matrix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSource {
    Configured,
    Embedded,
    Profile(&'static str),
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSpaceConverter {
    conversion: ColorConversion,
    source: MatrixSource,
}

impl ColorSpaceConverter {
    pub fn new(cam_to_rgb: ColorMatrix) -> Self {
        Self {
            conversion: ColorConversion::for_camera_to_rgb(cam_to_rgb),
            source: MatrixSource::Configured,
        }
    }

    pub fn neutral() -> Self {
        Self {
            conversion: ColorConversion::for_camera_to_rgb(ColorMatrix::IDENTITY),
            source: MatrixSource::Neutral,
        }
    }

    /// Picks the matrix for this capture.
    ///
    /// In order: `configured`, the XYZ to camera matrix embedded in metadata,
    /// the built-in profile for the camera, and finally identity with a
    /// [`Diagnostic::NeutralColorMatrix`].
    pub fn resolve<M: MetadataProvider>(
        metadata: &M,
        configured: Option<ColorMatrix>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        if let Some(matrix) = configured {
            return Ok(Self::new(matrix));
        }

        if let Some(xyz_to_cam) = embedded_xyz_to_camera(metadata)? {
            match ColorConversion::from_xyz_to_camera(xyz_to_cam) {
                Some(conversion) => {
                    debug!("Using colour matrix embedded in metadata");
                    return Ok(Self { conversion, source: MatrixSource::Embedded });
                }
                None => debug!("Embedded colour matrix is degenerate, ignoring it"),
            }
        }

        if let Some(profile) = CameraProfile::detect(metadata)? {
            if let Some(conversion) = profile.conversion() {
                debug!("Using built-in colour profile for {}", profile.name);
                return Ok(Self { conversion, source: MatrixSource::Profile(profile.name) });
            }
        }

        diagnostics.push(Diagnostic::NeutralColorMatrix {
            camera: metadata.get_string_opt(keys::MODEL)?,
        });
        Ok(Self::neutral())
    }

    pub fn matrix(&self) -> ColorMatrix {
        self.conversion.cam_to_rgb
    }

    /// Camera to D65-normalized XYZ, used for demosaic homogeneity.
    pub fn cam_to_xyz(&self) -> ColorMatrix {
        self.conversion.cam_to_xyz
    }

    pub fn source(&self) -> MatrixSource {
        self.source
    }

    #[instrument(skip_all, name = "color_convert")]
    pub fn apply(&self, image: &mut RgbImage) {
        let matrix = self.conversion.cam_to_rgb;
        if matrix.is_identity() {
            debug!("Identity colour matrix, nothing to convert");
            return;
        }
        info!("Converting {}x{} image to sRGB ({:?})", image.width, image.height, self.source);

        let row_len = image.width * 3;
        image.data.par_chunks_mut(row_len).for_each(|row| {
            for pixel in row.chunks_exact_mut(3) {
                let out = matrix.apply([pixel[0], pixel[1], pixel[2]]);
                pixel.copy_from_slice(&out);
            }
        });
    }
}

fn embedded_xyz_to_camera<M: MetadataProvider>(metadata: &M) -> Result<Option<[[f64; 3]; 3]>> {
    let keys: Vec<String> = (0..9).map(keys::xyz_to_camera).collect();
    if !keys.iter().all(|key| metadata.has_key(key)) {
        return Ok(None);
    }

    let mut matrix = [[0.0f64; 3]; 3];
    for (i, key) in keys.iter().enumerate() {
        matrix[i / 3][i % 3] = metadata.get_float(key)?;
    }
    Ok(Some(matrix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::metadata::InMemoryMetadata;

    #[test]
    fn test_identity_on_uniform_gray() {
        let mut image = RgbImage::filled(3, 2, [12345, 12345, 12345]);
        let expected = image.clone();
        ColorSpaceConverter::new(ColorMatrix::IDENTITY).apply(&mut image);
        assert_eq!(image, expected);
    }

    #[test]
    fn test_white_patch_under_camera_profile() {
        let metadata = InMemoryMetadata::new()
            .with(keys::MAKE, "NIKON CORPORATION")
            .with(keys::MODEL, "NIKON D5000");
        let mut diagnostics = Diagnostics::new();
        let converter = ColorSpaceConverter::resolve(&metadata, None, &mut diagnostics).unwrap();
        assert_eq!(converter.source(), MatrixSource::Profile("NIKON D5000"));
        assert!(diagnostics.is_empty());

        let mut image = RgbImage::filled(2, 2, [30000, 30000, 30000]);
        converter.apply(&mut image);
        for pixel in image.data.chunks_exact(3) {
            for channel in pixel {
                assert!((*channel as i32 - 30000).abs() <= 2, "{pixel:?}");
            }
        }
    }

    #[test]
    fn test_resolution_order() {
        let mut metadata = InMemoryMetadata::new().with(keys::MODEL, "NIKON D5000");
        for (i, v) in [7309, -1403, -519, -8474, 16008, 2622, -2433, 2826, 8064].into_iter().enumerate() {
            metadata.set(keys::xyz_to_camera(i), v);
        }
        let mut diagnostics = Diagnostics::new();

        let embedded = ColorSpaceConverter::resolve(&metadata, None, &mut diagnostics).unwrap();
        assert_eq!(embedded.source(), MatrixSource::Embedded);

        let configured = ColorMatrix::from_row_major([1.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0]);
        let overridden = ColorSpaceConverter::resolve(&metadata, Some(configured), &mut diagnostics).unwrap();
        assert_eq!(overridden.source(), MatrixSource::Configured);
        assert_eq!(overridden.matrix(), configured);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_camera_is_neutral_with_diagnostic() {
        let metadata = InMemoryMetadata::new().with(keys::MODEL, "Brownie");
        let mut diagnostics = Diagnostics::new();
        let converter = ColorSpaceConverter::resolve(&metadata, None, &mut diagnostics).unwrap();

        assert_eq!(converter.source(), MatrixSource::Neutral);
        assert!(converter.matrix().is_identity());
        assert!(diagnostics.contains(|d| matches!(
            d,
            Diagnostic::NeutralColorMatrix { camera: Some(c) } if c == "Brownie"
        )));
    }
}
