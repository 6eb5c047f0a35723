use rayon::prelude::*;
use tracing::instrument;

use crate::image_pipeline::debayer::types::RgbImage;

/// Default number of low bits dropped when binning 16-bit samples (8192 slots).
pub const DEFAULT_COARSENESS: u32 = 3;

/// Per-channel sample counts of an RGB image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    coarseness: u32,
    counts: [Vec<u32>; 3],
    n_pixels: usize,
}

impl Histogram {
    pub fn from_image(image: &RgbImage) -> Self {
        Self::with_coarseness(image, DEFAULT_COARSENESS)
    }

    /// Bins each sample into slot `value >> coarseness`.
    #[instrument(skip_all, name = "histogram")]
    pub fn with_coarseness(image: &RgbImage, coarseness: u32) -> Self {
        let coarseness = coarseness.min(15);
        let slots = 0x10000usize >> coarseness;
        let empty = || [vec![0u32; slots], vec![0u32; slots], vec![0u32; slots]];
        let row_len = (image.width * 3).max(3);

        let counts = image
            .data
            .par_chunks(row_len)
            .fold(empty, |mut counts, row| {
                for pixel in row.chunks_exact(3) {
                    for (channel, &value) in counts.iter_mut().zip(pixel) {
                        channel[(value >> coarseness) as usize] += 1;
                    }
                }
                counts
            })
            .reduce(empty, |mut a, b| {
                for (ca, cb) in a.iter_mut().zip(&b) {
                    ca.iter_mut().zip(cb).for_each(|(x, y)| *x += y);
                }
                a
            });

        Self {
            coarseness,
            counts,
            n_pixels: image.pixel_count(),
        }
    }

    pub fn coarseness(&self) -> u32 {
        self.coarseness
    }

    pub fn slots(&self) -> usize {
        self.counts[0].len()
    }

    pub fn n_pixels(&self) -> usize {
        self.n_pixels
    }

    pub fn channel(&self, channel: usize) -> &[u32] {
        &self.counts[channel]
    }

    #[inline]
    pub fn count(&self, channel: usize, slot: usize) -> u32 {
        self.counts[channel][slot]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_per_channel() {
        let image = RgbImage::new(2, 2, vec![
            0, 8, 65535,
            7, 16, 65535,
            8, 16, 0,
            65535, 17, 0,
        ])
        .unwrap();
        let histogram = Histogram::from_image(&image);

        assert_eq!(histogram.slots(), 8192);
        assert_eq!(histogram.n_pixels(), 4);
        assert_eq!(histogram.count(0, 0), 2);
        assert_eq!(histogram.count(0, 1), 1);
        assert_eq!(histogram.count(0, 8191), 1);
        assert_eq!(histogram.count(1, 2), 3);
        assert_eq!(histogram.count(2, 0), 2);
        for channel in 0..3 {
            assert_eq!(histogram.channel(channel).iter().sum::<u32>(), 4);
        }
    }

    #[test]
    fn test_coarseness_zero_keeps_every_value() {
        let image = RgbImage::filled(3, 1, [1, 2, 3]);
        let histogram = Histogram::with_coarseness(&image, 0);
        assert_eq!(histogram.slots(), 65536);
        assert_eq!(histogram.count(2, 3), 3);
    }
}
