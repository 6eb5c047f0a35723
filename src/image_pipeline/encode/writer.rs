use std::io::Write;

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::debayer::types::RgbImage;
use crate::image_pipeline::encode::types::OutputDepth;

pub trait ImageEncoder {
    /// Serializes `image` to `output` and returns the depth actually written,
    /// which may be lower than `depth` for formats that cannot hold it.
    fn encode(&self, image: &RgbImage, depth: OutputDepth, output: &mut dyn Write) -> Result<OutputDepth>;
}
