//! Metadata key names understood by the pipeline.

use crate::image_pipeline::raw::cfa::CfaColor;

pub const ORIENTATION: &str = "Exif.Image.Orientation";
pub const MAKE: &str = "Exif.Image.Make";
pub const MODEL: &str = "Exif.Image.Model";

pub const SENSOR_WIDTH: &str = "Raw.Sensor.Width";
pub const SENSOR_HEIGHT: &str = "Raw.Sensor.Height";
pub const CFA_PATTERN: &str = "Raw.Sensor.CfaPattern";
pub const SAMPLE_FORMAT: &str = "Raw.Sensor.SampleFormat";
pub const BITS_PER_SAMPLE: &str = "Raw.Sensor.BitsPerSample";

pub const BLACK_LEVEL: &str = "Raw.BlackLevel";
pub const WHITE_LEVEL: &str = "Raw.WhiteLevel";
pub const WHITE_BALANCE: &str = "Raw.WhiteBalance";
pub const XYZ_TO_CAMERA: &str = "Raw.Color.XyzToCamera";

pub fn black_level(color: CfaColor) -> String {
    format!("{BLACK_LEVEL}.{}", color.name())
}

pub fn white_level(color: CfaColor) -> String {
    format!("{WHITE_LEVEL}.{}", color.name())
}

pub fn white_balance(color: CfaColor) -> String {
    format!("{WHITE_BALANCE}.{}", color.name())
}

/// Row-major entry `index` (0..9) of the XYZ to camera matrix.
pub fn xyz_to_camera(index: usize) -> String {
    format!("{XYZ_TO_CAMERA}.{index}")
}
