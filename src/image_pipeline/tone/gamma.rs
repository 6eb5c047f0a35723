//! Tone curve built from the image histogram, and the filter applying it.

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::image_pipeline::debayer::types::RgbImage;
use crate::image_pipeline::tone::histogram::Histogram;

const CURVE_SIZE: usize = 0x10000;

/// Lowest slot the white point search descends to.
const WHITE_SLOT_FLOOR: usize = 32;

/// Tone curve parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneConfig {
    /// Fraction of pixels allowed to saturate at the white point
    pub white_clip: f64,
    /// Fraction of pixels allowed to crush to black; 0 pins black at 0
    pub black_clip: f64,
    /// Gamma exponent
    pub power: f64,
    /// Slope of the linear toe segment
    pub toe_slope: f64,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            white_clip: 0.01,
            black_clip: 0.0,
            power: 0.45,
            toe_slope: 4.5,
        }
    }
}

/// Non-decreasing 16-bit to 16-bit lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaCurve {
    table: Vec<u16>,
    black_point: usize,
    white_point: usize,
}

impl GammaCurve {
    /// Picks black and white points from `histogram` and builds the curve
    /// between them.
    ///
    /// The white point is the highest level, over all channels, below which
    /// all but `white_clip` of the pixels fall. It never drops under slot 32.
    /// The black point is the lowest level, over all channels, above which
    /// all but `black_clip` of the pixels fall.
    #[instrument(skip_all, name = "gamma_curve")]
    pub fn from_histogram(histogram: &Histogram, config: &ToneConfig) -> Self {
        let n_pixels = histogram.n_pixels() as f64;
        let white_limit = (n_pixels * config.white_clip.max(0.0)) as u64;
        let top = histogram.slots() - 1;

        let white_slot = (0..3)
            .map(|c| {
                let mut total = 0u64;
                let mut slot = top;
                while slot > WHITE_SLOT_FLOOR {
                    total += histogram.count(c, slot) as u64;
                    if total > white_limit {
                        break;
                    }
                    slot -= 1;
                }
                slot
            })
            .max()
            .unwrap_or(top);

        let black_slot = if config.black_clip > 0.0 {
            let black_limit = (n_pixels * config.black_clip) as u64;
            (0..3)
                .map(|c| {
                    let mut total = 0u64;
                    (0..=top)
                        .find(|&slot| {
                            total += histogram.count(c, slot) as u64;
                            total > black_limit
                        })
                        .unwrap_or(0)
                })
                .min()
                .unwrap_or(0)
        } else {
            0
        };

        let shift = histogram.coarseness();
        let curve = Self::with_points(
            black_slot << shift,
            white_slot << shift,
            config.power,
            config.toe_slope,
        );
        debug!(
            "Gamma curve black point {}, white point {}",
            curve.black_point, curve.white_point
        );
        curve
    }

    /// Curve mapping `black` to 0 and `white` and above to 65535.
    ///
    /// Between the two it follows a power curve with exponent `power` and a
    /// linear toe of slope `toe_slope`, joined where value and slope match.
    pub fn with_points(black: usize, white: usize, power: f64, toe_slope: f64) -> Self {
        let black = black.min(CURVE_SIZE - 2);
        let white = white.clamp(black + 1, CURVE_SIZE - 1);
        let span = (white - black) as f64;
        let segment = CurveSegment::solve(power, toe_slope);

        let mut table: Vec<u16> = (0..CURVE_SIZE)
            .map(|i| {
                if i <= black {
                    return 0;
                }
                let r = (i - black) as f64 / span;
                if r >= 1.0 {
                    return u16::MAX;
                }
                let value = CURVE_SIZE as f64 * segment.eval(r);
                value.clamp(0.0, u16::MAX as f64) as u16
            })
            .collect();

        for i in 1..table.len() {
            table[i] = table[i].max(table[i - 1]);
        }

        Self {
            table,
            black_point: black,
            white_point: white,
        }
    }

    #[inline]
    pub fn lookup(&self, value: u16) -> u16 {
        self.table[value as usize]
    }

    pub fn table(&self) -> &[u16] {
        &self.table
    }

    pub fn black_point(&self) -> usize {
        self.black_point
    }

    pub fn white_point(&self) -> usize {
        self.white_point
    }
}

/// BT.709-style transfer: linear below `toe_end`, offset power curve above.
#[derive(Debug, Clone, Copy)]
struct CurveSegment {
    power: f64,
    slope: f64,
    toe_end: f64,
    offset: f64,
}

impl CurveSegment {
    fn solve(power: f64, slope: f64) -> Self {
        let mut bounds = [0.0f64, 1.0];
        let mut knee = 0.5;
        for _ in 0..48 {
            knee = (bounds[0] + bounds[1]) / 2.0;
            let t = (knee / slope).powf(-power) - 1.0;
            bounds[usize::from(t / power - 1.0 / knee > -1.0)] = knee;
        }

        Self {
            power,
            slope,
            toe_end: knee / slope,
            offset: knee * (1.0 / power - 1.0),
        }
    }

    #[inline]
    fn eval(&self, r: f64) -> f64 {
        if r < self.toe_end {
            r * self.slope
        } else {
            r.powf(self.power) * (1.0 + self.offset) - self.offset
        }
    }
}

/// Applies a [`GammaCurve`] to every sample in place.
#[derive(Debug, Clone, Copy)]
pub struct GammaFilter<'a> {
    curve: &'a GammaCurve,
}

impl<'a> GammaFilter<'a> {
    pub fn new(curve: &'a GammaCurve) -> Self {
        Self { curve }
    }

    #[instrument(skip_all, name = "gamma")]
    pub fn apply(&self, image: &mut RgbImage) {
        let row_len = (image.width * 3).max(3);
        image.data.par_chunks_mut(row_len).for_each(|row| {
            for sample in row.iter_mut() {
                *sample = self.curve.lookup(*sample);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_non_decreasing(curve: &GammaCurve) {
        assert_eq!(curve.table().len(), CURVE_SIZE);
        assert!(curve.table().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_curve_shape() {
        let curve = GammaCurve::with_points(0, 0x8000, 0.45, 4.5);
        assert_non_decreasing(&curve);
        assert_eq!(curve.lookup(0), 0);
        assert_eq!(curve.lookup(0x8000), u16::MAX);
        assert_eq!(curve.lookup(u16::MAX), u16::MAX);
        // The toe is linear with slope 4.5 near black.
        assert_eq!(curve.lookup(64), (64.0 / 32768.0 * 4.5 * 65536.0) as u16);
        // Mid grey is lifted by the power segment.
        assert!(curve.lookup(0x4000) > 0x8000);
    }

    #[test]
    fn test_degenerate_histograms_stay_monotonic() {
        let config = ToneConfig::default();
        for value in [0u16, 1, 255, 256, 32768, 65535] {
            let image = RgbImage::filled(4, 4, [value; 3]);
            let curve = GammaCurve::from_histogram(&Histogram::from_image(&image), &config);
            assert_non_decreasing(&curve);
        }

        let clipped = ToneConfig { black_clip: 0.5, ..config };
        let image = RgbImage::filled(4, 4, [40000; 3]);
        let curve = GammaCurve::from_histogram(&Histogram::from_image(&image), &clipped);
        assert!(curve.white_point() > curve.black_point());
        assert_non_decreasing(&curve);
    }

    #[test]
    fn test_white_point_from_histogram() {
        // 100 pixels: 98 dark, 2 bright. With 1% allowed to clip the white
        // point lands on the bright level.
        let mut data = vec![1000u16; 98 * 3];
        data.extend_from_slice(&[40000; 6]);
        let image = RgbImage::new(10, 10, data).unwrap();

        let curve = GammaCurve::from_histogram(&Histogram::from_image(&image), &ToneConfig::default());
        assert_eq!(curve.white_point(), (40000 >> 3) << 3);
        assert_eq!(curve.black_point(), 0);

        // An all-dark image stops at the floor slot.
        let dark = RgbImage::filled(10, 10, [5, 5, 5]);
        let curve = GammaCurve::from_histogram(&Histogram::from_image(&dark), &ToneConfig::default());
        assert_eq!(curve.white_point(), 32 << 3);
    }

    #[test]
    fn test_black_clip_moves_black_point() {
        let mut data = vec![8000u16; 50 * 3];
        data.extend(std::iter::repeat_n(30000u16, 50 * 3));
        let image = RgbImage::new(10, 10, data).unwrap();
        let config = ToneConfig { black_clip: 0.2, ..ToneConfig::default() };

        let curve = GammaCurve::from_histogram(&Histogram::from_image(&image), &config);
        assert_eq!(curve.black_point(), 8000);
        assert_eq!(curve.lookup(8000), 0);
        assert_non_decreasing(&curve);
    }

    #[test]
    fn test_filter_applies_table() {
        let curve = GammaCurve::with_points(0, 1000, 0.45, 4.5);
        let mut image = RgbImage::new(1, 2, vec![0, 1000, 2000, 10, 20, 30]).unwrap();
        GammaFilter::new(&curve).apply(&mut image);
        assert_eq!(&image.data[..3], &[0, u16::MAX, u16::MAX]);
        assert_eq!(image.data[3], curve.lookup(10));
    }
}
