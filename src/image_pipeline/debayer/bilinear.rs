use std::io::Cursor;

use bayer::{BayerDepth, Demosaic, RasterDepth, RasterMut, CFA};
use tracing::{debug, info, instrument};

use crate::image_pipeline::common::error::{DevelopError, Result};
use crate::image_pipeline::debayer::ahd::check_mosaic;
use crate::image_pipeline::debayer::types::RgbImage;
use crate::image_pipeline::raw::cfa::CfaPattern;
use crate::image_pipeline::raw::types::GrayImage;

/// Bilinear demosaic backed by the `bayer` crate.
///
/// Faster than AHD and prone to zipper artifacts on edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct BilinearInterpolator;

impl BilinearInterpolator {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all, name = "bilinear")]
    pub fn interpolate(&self, mosaic: GrayImage) -> Result<RgbImage> {
        check_mosaic(&mosaic)?;
        let width = mosaic.width;
        let height = mosaic.height;
        info!("Starting bilinear demosaic for image {}x{}", width, height);

        let cfa = bayer_cfa(mosaic.cfa)?;
        let bayer_bytes: Vec<u8> = mosaic.data.iter().flat_map(|&val| val.to_le_bytes()).collect();
        drop(mosaic);

        let mut output_buf = vec![0u8; width * height * 3 * 2];
        let mut cursor = Cursor::new(&bayer_bytes[..]);
        let mut output_raster = RasterMut::new(width, height, RasterDepth::Depth16, &mut output_buf);

        debug!("Running demosaic with CFA={:?}, algo=Linear", cfa);
        bayer::run_demosaic(
            &mut cursor,
            BayerDepth::Depth16LE,
            cfa,
            Demosaic::Linear,
            &mut output_raster,
        )
        .map_err(|e| DevelopError::malformed("demosaic", format!("bayer demosaic failed: {e:?}")))?;

        // 16-bit rasters are written in native byte order
        let data = output_buf
            .chunks_exact(2)
            .map(|b| u16::from_ne_bytes([b[0], b[1]]))
            .collect();

        RgbImage::new(width, height, data)
    }
}

fn bayer_cfa(pattern: CfaPattern) -> Result<CFA> {
    match pattern.merged_greens() {
        p if p == CfaPattern::RGGB => Ok(CFA::RGGB),
        p if p == CfaPattern::BGGR => Ok(CFA::BGGR),
        p if p == CfaPattern::GRBG => Ok(CFA::GRBG),
        p if p == CfaPattern::GBRG => Ok(CFA::GBRG),
        p => Err(DevelopError::unsupported(
            "demosaic",
            format!("CFA pattern {p} has no bilinear mapping"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_field() {
        let cfa = CfaPattern::GRBG;
        let data = (0..6)
            .flat_map(|row| (0..6).map(move |col| [700u16, 800, 900][cfa.color_at(row, col).plane()]))
            .collect();
        let mosaic = GrayImage::new(6, 6, data, cfa).unwrap();

        let rgb = BilinearInterpolator::new().interpolate(mosaic).unwrap();
        assert_eq!((rgb.width, rgb.height), (6, 6));
        for pixel in rgb.data.chunks_exact(3) {
            assert_eq!(pixel, [700, 800, 900]);
        }
    }

    #[test]
    fn test_rejects_single_row() {
        let mosaic = GrayImage::new(6, 1, vec![0; 6], CfaPattern::RGGB).unwrap();
        assert!(BilinearInterpolator::new().interpolate(mosaic).is_err());
    }
}
