use std::io::Write;

use tracing::{debug, warn};

use crate::image_pipeline::common::error::{DevelopError, Result};
use crate::image_pipeline::debayer::types::RgbImage;
use crate::image_pipeline::encode::types::{to_8bit, OutputDepth};
use crate::image_pipeline::encode::writer::ImageEncoder;

/// Uncompressed binary PPM: `P6\n<width> <height>\n255\n` then 8-bit RGB.
#[derive(Debug, Clone, Copy, Default)]
pub struct PpmEncoder;

impl PpmEncoder {
    pub fn header(width: usize, height: usize) -> String {
        format!("P6\n{width} {height}\n255\n")
    }
}

impl ImageEncoder for PpmEncoder {
    fn encode(&self, image: &RgbImage, depth: OutputDepth, output: &mut dyn Write) -> Result<OutputDepth> {
        debug!("Encoding PPM image: {}x{}", image.width, image.height);
        if depth != OutputDepth::Eight {
            warn!("PPM output is 8-bit only, {}-bit samples will be narrowed", depth.bits());
        }

        let header = Self::header(image.width, image.height);
        let mut buffer = Vec::with_capacity(header.len() + image.data.len());
        buffer.extend_from_slice(header.as_bytes());
        buffer.extend(image.data.iter().map(|&v| to_8bit(v)));

        output
            .write_all(&buffer)
            .and_then(|()| output.flush())
            .map_err(|e| DevelopError::EncodingFailure(e.to_string()))?;

        debug!("PPM encoding complete");
        Ok(OutputDepth::Eight)
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

    #[test]
    fn test_sink_failure_is_encoding_failure() {
        let image = RgbImage::filled(2, 2, [1, 2, 3]);
        let result = PpmEncoder.encode(&image, OutputDepth::Eight, &mut FullDisk);
        match result {
            Err(DevelopError::EncodingFailure(message)) => assert!(message.contains("disk full")),
            other => panic!("expected EncodingFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_header_and_payload() {
        let image = RgbImage::new(2, 1, vec![0xffff, 0x8000, 0x00ff, 0x0100, 0, 0x7fff]).unwrap();
        let mut output = Vec::new();
        let written = PpmEncoder.encode(&image, OutputDepth::Sixteen, &mut output).unwrap();

        assert_eq!(written, OutputDepth::Eight);
        let header = b"P6\n2 1\n255\n";
        assert_eq!(&output[..header.len()], header);
        assert_eq!(&output[header.len()..], &[0xff, 0x80, 0x00, 0x01, 0x00, 0x7f]);
        assert_eq!(output.len(), header.len() + 6);
    }
}
