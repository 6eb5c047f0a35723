//! Adaptive homogeneity-directed demosaicing.
//!
//! Two complete candidates are built, one interpolating green along rows and
//! one along columns. Both are converted to a CIELab-like space and, for every
//! pixel, the candidate whose neighbourhood is more homogeneous in luma and
//! chroma wins.
//!
//! Every pass reads only fully materialized buffers from the previous pass and
//! writes its own output rows, so each pass runs row-parallel.

use std::sync::OnceLock;

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::image_pipeline::color::matrix::ColorMatrix;
use crate::image_pipeline::common::error::{DevelopError, Result};
use crate::image_pipeline::debayer::types::RgbImage;
use crate::image_pipeline::raw::cfa::CfaPattern;
use crate::image_pipeline::raw::types::GrayImage;

/// Smallest image holding one full CFA tile.
pub const MIN_DIMENSION: usize = 2;

const GREEN: usize = 1;
const HORIZONTAL: usize = 0;
const VERTICAL: usize = 1;

/// CIELab `L`, `a`, `b`, all scaled by 64.
type Lab = [i32; 3];

#[derive(Debug, Clone, Copy)]
pub struct AhdInterpolator {
    cam_to_xyz: ColorMatrix,
}

impl AhdInterpolator {
    /// `cam_to_xyz` maps the mosaic's camera RGB to D65-normalized XYZ.
    pub fn new(cam_to_xyz: ColorMatrix) -> Self {
        Self { cam_to_xyz }
    }

    #[instrument(skip_all, name = "ahd", fields(width = mosaic.width, height = mosaic.height))]
    pub fn interpolate(&self, mosaic: GrayImage) -> Result<RgbImage> {
        let (width, height) = (mosaic.width, mosaic.height);
        check_mosaic(&mosaic)?;
        info!("Starting AHD demosaic for image {}x{}", width, height);

        let raw = Grid::new(&mosaic.data, width, height);
        let cfa = mosaic.cfa;

        let (green_h, green_v) = rayon::join(
            || interpolate_green(raw, cfa, (0, 1)),
            || interpolate_green(raw, cfa, (1, 0)),
        );
        let (rgb_h, rgb_v) = rayon::join(
            || fill_red_blue(raw, cfa, Grid::new(&green_h, width, height)),
            || fill_red_blue(raw, cfa, Grid::new(&green_v, width, height)),
        );
        drop((green_h, green_v));
        drop(mosaic);
        debug!("Directional candidates ready");

        let (lab_h, lab_v) = rayon::join(
            || to_lab(&rgb_h, width, &self.cam_to_xyz),
            || to_lab(&rgb_v, width, &self.cam_to_xyz),
        );
        let homogeneity = homogeneity_map([&lab_h, &lab_v], width, height);
        drop((lab_h, lab_v));

        let data = select(&homogeneity, [&rgb_h, &rgb_v], width, height);
        RgbImage::new(width, height, data)
    }
}

pub(crate) fn check_mosaic(mosaic: &GrayImage) -> Result<()> {
    if mosaic.width < MIN_DIMENSION || mosaic.height < MIN_DIMENSION {
        return Err(DevelopError::malformed(
            "demosaic",
            format!(
                "{}x{} is smaller than one {MIN_DIMENSION}x{MIN_DIMENSION} CFA tile",
                mosaic.width, mosaic.height
            ),
        ));
    }
    if !mosaic.cfa.is_bayer() {
        return Err(DevelopError::unsupported(
            "demosaic",
            format!("CFA pattern {} is not a Bayer tile", mosaic.cfa),
        ));
    }
    Ok(())
}

/// Read-only view of a single-channel plane with mirrored borders.
#[derive(Clone, Copy)]
struct Grid<'a> {
    data: &'a [u16],
    width: usize,
    height: usize,
}

impl<'a> Grid<'a> {
    fn new(data: &'a [u16], width: usize, height: usize) -> Self {
        Self { data, width, height }
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> i32 {
        self.data[row * self.width + col] as i32
    }

    /// Sample at a possibly out-of-bounds coordinate, mirrored about the edge.
    #[inline]
    fn at(&self, row: isize, col: isize) -> i32 {
        self.get(reflect(row, self.height), reflect(col, self.width))
    }
}

/// Mirrors `i` into `0..n` without repeating the edge sample, which keeps the
/// coordinate's parity and therefore its CFA colour. Requires `n >= 2`.
#[inline]
fn reflect(mut i: isize, n: usize) -> usize {
    let n = n as isize;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * (n - 1) - i;
        } else {
            return i as usize;
        }
    }
}

#[inline]
fn clamp16(value: i32) -> u16 {
    value.clamp(0, u16::MAX as i32) as u16
}

/// Green at red and blue sites along `step`, bounded by the two adjacent greens.
fn interpolate_green(raw: Grid<'_>, cfa: CfaPattern, step: (isize, isize)) -> Vec<u16> {
    let (dr, dc) = step;
    let mut out = vec![0u16; raw.width * raw.height];

    out.par_chunks_mut(raw.width)
        .enumerate()
        .for_each(|(row, line)| {
            for (col, green) in line.iter_mut().enumerate() {
                let sample = raw.get(row, col);
                if cfa.color_at(row, col).plane() == GREEN {
                    *green = sample as u16;
                    continue;
                }

                let (r, c) = (row as isize, col as isize);
                let before = raw.at(r - dr, c - dc);
                let after = raw.at(r + dr, c + dc);
                let value = ((before + sample + after) * 2
                    - raw.at(r - 2 * dr, c - 2 * dc)
                    - raw.at(r + 2 * dr, c + 2 * dc))
                    >> 2;
                *green = value.clamp(before.min(after), before.max(after)) as u16;
            }
        });

    out
}

/// Red and blue by colour-difference interpolation against one green plane.
fn fill_red_blue(raw: Grid<'_>, cfa: CfaPattern, green: Grid<'_>) -> Vec<u16> {
    let mut out = vec![0u16; raw.width * raw.height * 3];

    out.par_chunks_mut(raw.width * 3)
        .enumerate()
        .for_each(|(row, line)| {
            for (col, pixel) in line.chunks_exact_mut(3).enumerate() {
                let (r, c) = (row as isize, col as isize);
                let g = green.get(row, col);
                let plane = cfa.color_at(row, col).plane();
                pixel[GREEN] = g as u16;

                if plane == GREEN {
                    let row_plane = cfa.color_at(row, col + 1).plane();
                    let col_plane = cfa.color_at(row + 1, col).plane();
                    let row_value = g
                        + ((raw.at(r, c - 1) + raw.at(r, c + 1)
                            - green.at(r, c - 1)
                            - green.at(r, c + 1))
                            >> 1);
                    let col_value = g
                        + ((raw.at(r - 1, c) + raw.at(r + 1, c)
                            - green.at(r - 1, c)
                            - green.at(r + 1, c))
                            >> 1);
                    pixel[row_plane] = clamp16(row_value);
                    pixel[col_plane] = clamp16(col_value);
                } else {
                    pixel[plane] = raw.get(row, col) as u16;
                    let diagonal: i32 = [(-1, -1), (-1, 1), (1, -1), (1, 1)]
                        .iter()
                        .map(|&(dr, dc)| raw.at(r + dr, c + dc) - green.at(r + dr, c + dc))
                        .sum();
                    pixel[2 - plane] = clamp16(g + ((diagonal + 1) >> 2));
                }
            }
        });

    out
}

/// `64 * f(i / 65535)` where `f` is the CIELab companding function.
fn cube_root_table() -> &'static [f32] {
    static TABLE: OnceLock<Vec<f32>> = OnceLock::new();
    TABLE.get_or_init(|| {
        (0..0x10000)
            .map(|i| {
                let r = i as f64 / 65535.0;
                let f = if r > 0.008856 {
                    r.cbrt()
                } else {
                    7.787 * r + 16.0 / 116.0
                };
                (64.0 * f) as f32
            })
            .collect()
    })
}

fn to_lab(rgb: &[u16], width: usize, cam_to_xyz: &ColorMatrix) -> Vec<Lab> {
    let table = cube_root_table();
    let lookup = |v: f32| table[v.clamp(0.0, u16::MAX as f32) as usize];
    let mut out = vec![[0i32; 3]; rgb.len() / 3];

    out.par_chunks_mut(width)
        .zip(rgb.par_chunks(width * 3))
        .for_each(|(line, source)| {
            for (lab, pixel) in line.iter_mut().zip(source.chunks_exact(3)) {
                let xyz = cam_to_xyz.transform([pixel[0] as f32, pixel[1] as f32, pixel[2] as f32]);
                let (x, y, z) = (lookup(xyz[0]), lookup(xyz[1]), lookup(xyz[2]));
                *lab = [
                    (116.0 * y - 64.0 * 16.0) as i32,
                    (500.0 * (x - y)) as i32,
                    (200.0 * (y - z)) as i32,
                ];
            }
        });

    out
}

/// Per pixel and candidate, how many of the 4-neighbours stay within the
/// adaptive luma and chroma thresholds. Neighbours outside the image are
/// skipped.
fn homogeneity_map(lab: [&[Lab]; 2], width: usize, height: usize) -> Vec<[u8; 2]> {
    let mut out = vec![[0u8; 2]; width * height];

    out.par_chunks_mut(width)
        .enumerate()
        .for_each(|(row, line)| {
            for (col, counts) in line.iter_mut().enumerate() {
                let center = row * width + col;
                let neighbours = [
                    (col > 0).then(|| center - 1),
                    (col + 1 < width).then(|| center + 1),
                    (row > 0).then(|| center - width),
                    (row + 1 < height).then(|| center + width),
                ];

                let mut l_diff = [[0i32; 4]; 2];
                let mut ab_diff = [[0i64; 4]; 2];
                for d in [HORIZONTAL, VERTICAL] {
                    let here = lab[d][center];
                    for (k, neighbour) in neighbours.iter().enumerate() {
                        if let Some(n) = *neighbour {
                            let there = lab[d][n];
                            let da = (here[1] - there[1]) as i64;
                            let db = (here[2] - there[2]) as i64;
                            l_diff[d][k] = (here[0] - there[0]).abs();
                            ab_diff[d][k] = da * da + db * db;
                        }
                    }
                }

                let l_eps = l_diff[HORIZONTAL][0]
                    .max(l_diff[HORIZONTAL][1])
                    .min(l_diff[VERTICAL][2].max(l_diff[VERTICAL][3]));
                let ab_eps = ab_diff[HORIZONTAL][0]
                    .max(ab_diff[HORIZONTAL][1])
                    .min(ab_diff[VERTICAL][2].max(ab_diff[VERTICAL][3]));

                for d in [HORIZONTAL, VERTICAL] {
                    counts[d] = (0..4)
                        .filter(|&k| {
                            neighbours[k].is_some()
                                && l_diff[d][k] <= l_eps
                                && ab_diff[d][k] <= ab_eps
                        })
                        .count() as u8;
                }
            }
        });

    out
}

/// Copies, per pixel, the candidate with the larger 3x3 homogeneity sum.
/// Ties keep the horizontal candidate.
fn select(homogeneity: &[[u8; 2]], rgb: [&[u16]; 2], width: usize, height: usize) -> Vec<u16> {
    let mut out = vec![0u16; width * height * 3];

    out.par_chunks_mut(width * 3)
        .enumerate()
        .for_each(|(row, line)| {
            let rows = row.saturating_sub(1)..=(row + 1).min(height - 1);
            for (col, pixel) in line.chunks_exact_mut(3).enumerate() {
                let mut score = [0u32; 2];
                for r in rows.clone() {
                    for c in col.saturating_sub(1)..=(col + 1).min(width - 1) {
                        let counts = homogeneity[r * width + c];
                        score[HORIZONTAL] += counts[HORIZONTAL] as u32;
                        score[VERTICAL] += counts[VERTICAL] as u32;
                    }
                }

                let chosen = if score[HORIZONTAL] >= score[VERTICAL] { HORIZONTAL } else { VERTICAL };
                let i = (row * width + col) * 3;
                pixel.copy_from_slice(&rgb[chosen][i..i + 3]);
            }
        });

    out
}
