//! Elementary pixel-grid transforms.

use rayon::prelude::*;

use crate::image_pipeline::debayer::types::RgbImage;

/// One step of an orientation. Each step is its own inverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Swap rows and columns; width and height trade places
    Transpose,
    /// Mirror left to right
    FlipHorizontal,
    /// Mirror top to bottom
    FlipVertical,
}

impl Transform {
    pub fn apply(self, image: RgbImage) -> RgbImage {
        match self {
            Transform::Transpose => transpose(image),
            Transform::FlipHorizontal => {
                let mut image = image;
                flip_horizontal(&mut image);
                image
            }
            Transform::FlipVertical => {
                let mut image = image;
                flip_vertical(&mut image);
                image
            }
        }
    }
}

fn transpose(image: RgbImage) -> RgbImage {
    let (width, height) = (image.width, image.height);
    if width <= 1 && height <= 1 {
        return image;
    }

    let mut data = vec![0u16; image.data.len()];
    data.par_chunks_mut(height * 3)
        .enumerate()
        .for_each(|(out_row, line)| {
            for (out_col, pixel) in line.chunks_exact_mut(3).enumerate() {
                let i = (out_col * width + out_row) * 3;
                pixel.copy_from_slice(&image.data[i..i + 3]);
            }
        });

    RgbImage {
        width: height,
        height: width,
        data,
    }
}

fn flip_horizontal(image: &mut RgbImage) {
    let width = image.width;
    image.data.par_chunks_mut(width * 3).for_each(|row| {
        for col in 0..width / 2 {
            let mirror = width - 1 - col;
            for channel in 0..3 {
                row.swap(col * 3 + channel, mirror * 3 + channel);
            }
        }
    });
}

fn flip_vertical(image: &mut RgbImage) {
    let row_len = image.width * 3;
    let height = image.height;
    let (top, bottom) = image.data.split_at_mut(row_len * (height / 2));
    let bottom_start = if height % 2 == 1 { row_len } else { 0 };

    top.par_chunks_mut(row_len)
        .zip(bottom[bottom_start..].par_chunks_mut(row_len).rev())
        .for_each(|(upper, lower)| upper.swap_with_slice(lower));
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3x2 image whose pixels hold their own (row, col) in R and G.
    fn labelled(width: usize, height: usize) -> RgbImage {
        let data = (0..height)
            .flat_map(|r| (0..width).flat_map(move |c| [r as u16, c as u16, 7]))
            .collect();
        RgbImage::new(width, height, data).unwrap()
    }

    #[test]
    fn test_transpose_swaps_dimensions() {
        let out = Transform::Transpose.apply(labelled(3, 2));
        assert_eq!((out.width, out.height), (2, 3));
        assert_eq!(out.pixel(2, 1), [1, 2, 7]);
        assert_eq!(out.pixel(0, 1), [1, 0, 7]);
    }

    #[test]
    fn test_flips() {
        let h = Transform::FlipHorizontal.apply(labelled(3, 2));
        assert_eq!(h.pixel(0, 0), [0, 2, 7]);
        assert_eq!(h.pixel(1, 1), [1, 1, 7]);

        let v = Transform::FlipVertical.apply(labelled(2, 3));
        assert_eq!(v.pixel(0, 1), [2, 1, 7]);
        assert_eq!(v.pixel(1, 0), [1, 0, 7]);
        assert_eq!(v.pixel(2, 0), [0, 0, 7]);
    }

    #[test]
    fn test_each_step_is_self_inverse() {
        for step in [Transform::Transpose, Transform::FlipHorizontal, Transform::FlipVertical] {
            let image = labelled(4, 3);
            assert_eq!(step.apply(step.apply(image.clone())), image);
        }
    }
}
