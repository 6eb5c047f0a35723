//! Metadata adapter over images decoded by the rawloader library.
//!
//! rawloader exposes camera metadata as plain struct fields. This adapter
//! copies the fields the pipeline uses out of a decoded [`rawloader::RawImage`]
//! and answers the pipeline's metadata keys from them, so a decoded camera
//! file and an externally supplied [`InMemoryMetadata`] look the same to every
//! stage.
//!
//! [`InMemoryMetadata`]: super::InMemoryMetadata

use tracing::debug;

use crate::image_pipeline::metadata::keys;
use crate::image_pipeline::metadata::provider::{MetadataProvider, MetadataValue};
use crate::image_pipeline::raw::cfa::CfaColor;

/// Default bit depth when the white levels carry no information.
const DEFAULT_BITS_PER_SAMPLE: u32 = 16;

#[derive(Debug, Clone)]
pub struct RawLoaderMetadata {
    make: String,
    model: String,
    orientation: Option<i64>,
    width: usize,
    height: usize,
    cfa_name: String,
    black_levels: [u16; 4],
    white_levels: [u16; 4],
    white_balance: Option<[f32; 4]>,
    xyz_to_camera: Option<[f32; 9]>,
}

impl RawLoaderMetadata {
    pub fn from_image(image: &rawloader::RawImage) -> Self {
        let metadata = Self {
            make: image.make.trim().to_string(),
            model: image.model.trim().to_string(),
            orientation: orientation_code(image.orientation),
            width: image.width,
            height: image.height,
            cfa_name: image.cfa.name.clone(),
            black_levels: image.blacklevels,
            white_levels: image.whitelevels,
            white_balance: normalized_white_balance(image.wb_coeffs),
            xyz_to_camera: embedded_matrix(&image.xyz_to_cam),
        };

        debug!(
            "Camera {} {}: cfa {:?}, black {:?}, white {:?}, orientation {:?}",
            metadata.make,
            metadata.model,
            metadata.cfa_name,
            metadata.black_levels,
            metadata.white_levels,
            metadata.orientation
        );

        metadata
    }

    /// Sensor bit depth derived from the highest white level, e.g. 4095 -> 12.
    pub fn bits_per_sample(&self) -> u32 {
        let max_white_level = self.white_levels.iter().max().copied().unwrap_or(u16::MAX);
        if max_white_level == 0 {
            DEFAULT_BITS_PER_SAMPLE
        } else {
            u16::BITS - max_white_level.leading_zeros()
        }
    }

    fn per_identity(&self, key: &str, prefix: &str) -> Option<CfaColor> {
        let suffix = key.strip_prefix(prefix)?.strip_prefix('.')?;
        CfaColor::ALL.into_iter().find(|c| c.name() == suffix)
    }
}

impl MetadataProvider for RawLoaderMetadata {
    fn lookup(&self, key: &str) -> Option<MetadataValue> {
        match key {
            keys::MAKE if !self.make.is_empty() => Some(self.make.as_str().into()),
            keys::MODEL if !self.model.is_empty() => Some(self.model.as_str().into()),
            keys::ORIENTATION => self.orientation.map(MetadataValue::Int),
            keys::SENSOR_WIDTH => Some(self.width.into()),
            keys::SENSOR_HEIGHT => Some(self.height.into()),
            keys::CFA_PATTERN if !self.cfa_name.is_empty() => Some(self.cfa_name.as_str().into()),
            keys::BITS_PER_SAMPLE => Some(self.bits_per_sample().into()),
            keys::BLACK_LEVEL => Some(levels(&self.black_levels)),
            keys::WHITE_LEVEL => Some(levels(&self.white_levels)),
            _ => {
                if let Some(color) = self.per_identity(key, keys::BLACK_LEVEL) {
                    return Some(self.black_levels[color.index()].into());
                }
                if let Some(color) = self.per_identity(key, keys::WHITE_LEVEL) {
                    return Some(self.white_levels[color.index()].into());
                }
                if let Some(color) = self.per_identity(key, keys::WHITE_BALANCE) {
                    return self.white_balance.map(|wb| wb[color.index()].into());
                }
                let index: usize = key
                    .strip_prefix(keys::XYZ_TO_CAMERA)?
                    .strip_prefix('.')?
                    .parse()
                    .ok()?;
                self.xyz_to_camera
                    .and_then(|m| m.get(index).copied())
                    .map(MetadataValue::from)
            }
        }
    }
}

fn levels(values: &[u16; 4]) -> MetadataValue {
    MetadataValue::List(values.iter().map(|&v| v.into()).collect())
}

fn orientation_code(orientation: rawloader::Orientation) -> Option<i64> {
    use rawloader::Orientation;

    match orientation {
        Orientation::Normal => Some(1),
        Orientation::HorizontalFlip => Some(2),
        Orientation::Rotate180 => Some(3),
        Orientation::VerticalFlip => Some(4),
        Orientation::Transpose => Some(5),
        Orientation::Rotate90 => Some(6),
        Orientation::Transverse => Some(7),
        Orientation::Rotate270 => Some(8),
        Orientation::Unknown => None,
    }
}

/// As-shot multipliers relative to green. A missing second green reuses green.
fn normalized_white_balance(coeffs: [f32; 4]) -> Option<[f32; 4]> {
    let green = coeffs[1];
    if !green.is_finite() || green <= 0.0 || coeffs[..3].iter().any(|c| !c.is_finite() || *c <= 0.0) {
        return None;
    }

    let green2 = if coeffs[3].is_finite() && coeffs[3] > 0.0 {
        coeffs[3]
    } else {
        green
    };

    Some([coeffs[0] / green, 1.0, coeffs[2] / green, green2 / green])
}

fn embedded_matrix(xyz_to_cam: &[[f32; 3]; 4]) -> Option<[f32; 9]> {
    let mut matrix = [0.0f32; 9];
    for (row, values) in xyz_to_cam.iter().take(3).enumerate() {
        matrix[row * 3..row * 3 + 3].copy_from_slice(values);
    }

    if matrix.iter().all(|v| *v == 0.0) || matrix.iter().any(|v| !v.is_finite()) {
        None
    } else {
        Some(matrix)
    }
}
