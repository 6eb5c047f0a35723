//! Image orientation from capture metadata
//!
//! The eight EXIF orientation codes are declared as compositions of
//! [`Transform`] steps, applied in order. Applying the steps in reverse order
//! undoes the orientation.

pub mod transform;

use std::fmt;

use tracing::{debug, instrument};

use crate::image_pipeline::common::diagnostics::{Diagnostic, Diagnostics};
use crate::image_pipeline::common::error::{DevelopError, Result};
use crate::image_pipeline::debayer::types::RgbImage;
use crate::image_pipeline::metadata::{keys, MetadataProvider};

pub use transform::Transform;

use Transform::{FlipHorizontal, FlipVertical, Transpose};

/// Steps for codes 1 through 8.
const COMPOSITION: [&[Transform]; 8] = [
    &[],
    &[FlipHorizontal],
    &[FlipHorizontal, FlipVertical],
    &[FlipVertical],
    &[Transpose],
    &[Transpose, FlipVertical],
    &[Transpose, FlipHorizontal, FlipVertical],
    &[Transpose, FlipHorizontal],
];

/// An EXIF orientation code in `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Orientation(u8);

impl Default for Orientation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Orientation {
    pub const IDENTITY: Orientation = Orientation(1);
    /// Code 6, a quarter turn counter-clockwise
    pub const ROTATE_CCW: Orientation = Orientation(6);
    /// Code 8, a quarter turn clockwise
    pub const ROTATE_CW: Orientation = Orientation(8);

    pub fn from_code(code: i64) -> Result<Self> {
        match u8::try_from(code) {
            Ok(c @ 1..=8) => Ok(Self(c)),
            _ => Err(DevelopError::InvalidOrientationCode(code)),
        }
    }

    /// All eight orientations.
    pub fn all() -> impl Iterator<Item = Orientation> {
        (1..=8).map(Orientation)
    }

    /// Reads `Exif.Image.Orientation`.
    ///
    /// Absent means identity. A value outside `1..=8`, or one that is not an
    /// integer, also means identity and is reported to `diagnostics`.
    pub fn from_metadata<M: MetadataProvider>(
        metadata: &M,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let code = match metadata.get_int(keys::ORIENTATION) {
            Ok(code) => code,
            Err(DevelopError::MetadataKeyMissing { .. }) => return Ok(Self::IDENTITY),
            Err(DevelopError::MetadataTypeMismatch { .. }) => {
                diagnostics.push(Diagnostic::InvalidOrientationCode { code: None });
                return Ok(Self::IDENTITY);
            }
            Err(e) => return Err(e),
        };

        match Self::from_code(code) {
            Ok(orientation) => Ok(orientation),
            Err(DevelopError::InvalidOrientationCode(code)) => {
                diagnostics.push(Diagnostic::InvalidOrientationCode { code: Some(code) });
                Ok(Self::IDENTITY)
            }
            Err(e) => Err(e),
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn steps(self) -> &'static [Transform] {
        COMPOSITION[(self.0 - 1) as usize]
    }

    pub fn is_identity(self) -> bool {
        self.steps().is_empty()
    }

    /// True when width and height trade places.
    pub fn swaps_dimensions(self) -> bool {
        self.steps().contains(&Transpose)
    }

    #[instrument(skip(image), name = "orient")]
    pub fn apply(self, image: RgbImage) -> RgbImage {
        debug!("Applying orientation steps {:?}", self.steps());
        self.steps().iter().fold(image, |image, step| step.apply(image))
    }

    pub fn apply_inverse(self, image: RgbImage) -> RgbImage {
        self.steps().iter().rev().fold(image, |image, step| step.apply(image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::metadata::{InMemoryMetadata, MetadataValue};

    fn gradient(width: usize, height: usize) -> RgbImage {
        let data = (0..width * height)
            .flat_map(|i| [i as u16, (i * 3) as u16, 65535 - i as u16])
            .collect();
        RgbImage::new(width, height, data).unwrap()
    }

    #[test]
    fn test_every_code_round_trips() {
        let image = gradient(5, 3);
        for orientation in Orientation::all() {
            let turned = orientation.apply(image.clone());
            if orientation.swaps_dimensions() {
                assert_eq!((turned.width, turned.height), (3, 5));
            }
            assert_eq!(orientation.apply_inverse(turned), image, "code {orientation}");
        }
    }

    #[test]
    fn test_identity_and_composition() {
        let image = gradient(4, 3);
        assert_eq!(Orientation::IDENTITY.apply(image.clone()), image);

        let three = Orientation::from_code(3).unwrap().apply(image.clone());
        let two_then_four = Orientation::from_code(4)
            .unwrap()
            .apply(Orientation::from_code(2).unwrap().apply(image));
        assert_eq!(three, two_then_four);
    }

    #[test]
    fn test_quarter_turns() {
        // [a b c]       ccw: [c f]      cw: [d a]
        // [d e f]            [b e]          [e b]
        //                    [a d]          [f c]
        let image = gradient(3, 2);
        let ccw = Orientation::ROTATE_CCW.apply(image.clone());
        assert_eq!((ccw.width, ccw.height), (2, 3));
        assert_eq!(ccw.pixel(0, 0), image.pixel(0, 2));
        assert_eq!(ccw.pixel(0, 1), image.pixel(1, 2));
        assert_eq!(ccw.pixel(2, 0), image.pixel(0, 0));

        let cw = Orientation::ROTATE_CW.apply(image.clone());
        assert_eq!(cw.pixel(0, 0), image.pixel(1, 0));
        assert_eq!(cw.pixel(2, 1), image.pixel(0, 2));
    }

    #[test]
    fn test_metadata_defaults() {
        let mut diagnostics = Diagnostics::new();

        let absent = Orientation::from_metadata(&InMemoryMetadata::new(), &mut diagnostics).unwrap();
        assert!(absent.is_identity());
        assert!(diagnostics.is_empty());

        let listed = InMemoryMetadata::new().with(
            keys::ORIENTATION,
            vec![MetadataValue::Int(8), MetadataValue::Int(1)],
        );
        assert_eq!(Orientation::from_metadata(&listed, &mut diagnostics).unwrap(), Orientation::ROTATE_CW);

        let bogus = InMemoryMetadata::new().with(keys::ORIENTATION, 99);
        assert!(Orientation::from_metadata(&bogus, &mut diagnostics).unwrap().is_identity());
        let garbled = InMemoryMetadata::new().with(keys::ORIENTATION, vec![0xffu8]);
        assert!(Orientation::from_metadata(&garbled, &mut diagnostics).unwrap().is_identity());

        assert_eq!(
            diagnostics.entries(),
            &[
                Diagnostic::InvalidOrientationCode { code: Some(99) },
                Diagnostic::InvalidOrientationCode { code: None },
            ]
        );
    }

    #[test]
    fn test_from_code_range() {
        assert!(Orientation::from_code(0).is_err());
        assert!(matches!(Orientation::from_code(-6), Err(DevelopError::InvalidOrientationCode(-6))));
        assert_eq!(Orientation::from_code(5).unwrap().steps(), &[Transpose]);
    }
}
