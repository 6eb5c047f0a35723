//! RAW image reading module
//!
//! Turns either a camera file (through rawloader) or a bare sample stream into
//! a [`GrayImage`] mosaic tagged with its CFA pattern and levels.

pub mod cfa;
mod reader;
mod rawloader_reader;
mod sample_reader;
pub mod types;

pub use cfa::{CfaColor, CfaPattern};
pub use reader::RawImageReader;
pub use rawloader_reader::RawLoaderReader;
pub use sample_reader::{read_levels, RawGeometry, RawSampleReader, SampleFormat};
pub use types::{GrayImage, MAX_WORKING_VALUE};
