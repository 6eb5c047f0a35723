//! In-place filters over the sensor mosaic

pub mod scale_colors;

pub use scale_colors::ScaleColorsFilter;
