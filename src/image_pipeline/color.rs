//! Sensor colour to sRGB conversion

pub mod camera;
pub mod converter;
pub mod matrix;

pub use camera::{CameraProfile, ColorConversion};
pub use converter::{ColorSpaceConverter, MatrixSource};
pub use matrix::ColorMatrix;
