use std::io::{Cursor, Write};

use tiff::encoder::colortype;
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::Compression;
use tiff::tags::Predictor;
use tracing::debug;

use crate::image_pipeline::common::error::{DevelopError, Result};
use crate::image_pipeline::debayer::types::RgbImage;
use crate::image_pipeline::encode::types::{to_8bit, OutputDepth, TiffCompression};
use crate::image_pipeline::encode::writer::ImageEncoder;

/// RGB TIFF encoder backed by the `tiff` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TiffEncoder {
    pub compression: TiffCompression,
    /// Predictor tag value; 2 enables horizontal differencing
    pub predictor: Option<u16>,
}

impl TiffEncoder {
    pub fn new(compression: TiffCompression, predictor: Option<u16>) -> Self {
        Self { compression, predictor }
    }
}

impl ImageEncoder for TiffEncoder {
    fn encode(&self, image: &RgbImage, depth: OutputDepth, output: &mut dyn Write) -> Result<OutputDepth> {
        debug!("Encoding {}-bit RGB TIFF image: {}x{}", depth.bits(), image.width, image.height);

        let mut buffer = Vec::new();

        let compression = match self.compression {
            TiffCompression::None => Compression::Uncompressed,
            TiffCompression::Lzw => Compression::Lzw,
            TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
            TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
            TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
        };

        let mut encoder = tiff::encoder::TiffEncoder::new(Cursor::new(&mut buffer))
            .map_err(|e| DevelopError::EncodingFailure(e.to_string()))?
            .with_compression(compression);

        if let Some(predictor_val) = self.predictor {
            let predictor = match predictor_val {
                2 => Predictor::Horizontal,
                _ => Predictor::None,
            };
            encoder = encoder.with_predictor(predictor);
        }

        let (width, height) = (image.width as u32, image.height as u32);
        match depth {
            OutputDepth::Sixteen => encoder.write_image::<colortype::RGB16>(width, height, &image.data),
            OutputDepth::Eight => {
                let narrowed: Vec<u8> = image.data.iter().map(|&v| to_8bit(v)).collect();
                encoder.write_image::<colortype::RGB8>(width, height, &narrowed)
            }
        }
        .map_err(|e| DevelopError::EncodingFailure(e.to_string()))?;

        output
            .write_all(&buffer)
            .map_err(|e| DevelopError::EncodingFailure(e.to_string()))?;

        debug!("TIFF encoding complete");
        Ok(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn encode(encoder: TiffEncoder, depth: OutputDepth) -> Vec<u8> {
        let image = RgbImage::filled(4, 3, [1000, 30000, 65535]);
        let mut output = Vec::new();
        assert_eq!(encoder.encode(&image, depth, &mut output).unwrap(), depth);
        output
    }

    #[test]
    fn test_writes_tiff_magic() {
        for depth in [OutputDepth::Eight, OutputDepth::Sixteen] {
            let output = encode(TiffEncoder::default(), depth);
            assert!(output.starts_with(b"II*\0") || output.starts_with(b"MM\0*"));
        }
    }

    #[test]
    fn test_decodes_back() {
        let output = encode(TiffEncoder::new(TiffCompression::DeflateFast, Some(2)), OutputDepth::Sixteen);
        let mut decoder = tiff::decoder::Decoder::new(Cursor::new(output)).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (4, 3));
        match decoder.read_image().unwrap() {
            tiff::decoder::DecodingResult::U16(data) => {
                assert_eq!(data.len(), 36);
                assert_eq!(&data[..3], &[1000, 30000, 65535]);
            }
            _ => panic!("expected 16-bit samples"),
        }
    }

    #[test]
    fn test_sink_failure_is_encoding_failure() {
        let image = RgbImage::filled(2, 2, [1, 2, 3]);
        let result = TiffEncoder::default().encode(&image, OutputDepth::Sixteen, &mut FullDisk);
        assert!(matches!(result, Err(DevelopError::EncodingFailure(_))));
    }
}
