use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::metadata::MetadataProvider;
use crate::image_pipeline::raw::types::GrayImage;

/// Decodes a complete capture file into its mosaic and the metadata found in it.
pub trait RawImageReader {
    type Metadata: MetadataProvider;

    fn read_raw(&self, data: &[u8]) -> Result<(GrayImage, Self::Metadata)>;
}
