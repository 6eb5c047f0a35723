//! Colour filter array description for 2x2 Bayer-style sensors.

use std::fmt;

use crate::image_pipeline::common::error::{DevelopError, Result};

/// Colour identity recorded by one sensor site.
///
/// `Green2` is the second green of the tile on sensors that report it
/// separately; for interpolation it is treated as green.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CfaColor {
    Red = 0,
    Green = 1,
    Blue = 2,
    Green2 = 3,
}

impl CfaColor {
    pub const ALL: [CfaColor; 4] = [CfaColor::Red, CfaColor::Green, CfaColor::Blue, CfaColor::Green2];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// RGB plane this identity contributes to.
    #[inline]
    pub fn plane(self) -> usize {
        match self {
            CfaColor::Red => 0,
            CfaColor::Green | CfaColor::Green2 => 1,
            CfaColor::Blue => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CfaColor::Red => "Red",
            CfaColor::Green => "Green",
            CfaColor::Blue => "Blue",
            CfaColor::Green2 => "Green2",
        }
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'R' => Some(CfaColor::Red),
            'G' => Some(CfaColor::Green),
            'B' => Some(CfaColor::Blue),
            'E' | 'H' => Some(CfaColor::Green2),
            _ => None,
        }
    }

    fn letter(self) -> char {
        match self {
            CfaColor::Red => 'R',
            CfaColor::Green => 'G',
            CfaColor::Blue => 'B',
            CfaColor::Green2 => 'E',
        }
    }
}

/// Which colour identity sits at each position of the repeating 2x2 tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfaPattern {
    tile: [[CfaColor; 2]; 2],
}

impl CfaPattern {
    pub const RGGB: CfaPattern = CfaPattern::new([
        [CfaColor::Red, CfaColor::Green],
        [CfaColor::Green, CfaColor::Blue],
    ]);
    pub const BGGR: CfaPattern = CfaPattern::new([
        [CfaColor::Blue, CfaColor::Green],
        [CfaColor::Green, CfaColor::Red],
    ]);
    pub const GRBG: CfaPattern = CfaPattern::new([
        [CfaColor::Green, CfaColor::Red],
        [CfaColor::Blue, CfaColor::Green],
    ]);
    pub const GBRG: CfaPattern = CfaPattern::new([
        [CfaColor::Green, CfaColor::Blue],
        [CfaColor::Red, CfaColor::Green],
    ]);

    pub const fn new(tile: [[CfaColor; 2]; 2]) -> Self {
        Self { tile }
    }

    /// Parses a four-letter, row-major pattern name such as `"RGGB"`.
    ///
    /// `E` (or `H`) names the second green identity.
    pub fn from_name(name: &str) -> Result<Self> {
        let letters: Vec<char> = name.trim().chars().collect();
        if letters.len() != 4 {
            return Err(DevelopError::unsupported(
                "read",
                format!("colour filter pattern {name:?} is not a 2x2 tile"),
            ));
        }

        let mut colors = [CfaColor::Red; 4];
        for (slot, letter) in colors.iter_mut().zip(&letters) {
            *slot = CfaColor::from_letter(*letter).ok_or_else(|| {
                DevelopError::unsupported(
                    "read",
                    format!("unknown colour {letter:?} in filter pattern {name:?}"),
                )
            })?;
        }

        Ok(Self::new([[colors[0], colors[1]], [colors[2], colors[3]]]))
    }

    #[inline]
    pub fn color_at(&self, row: usize, col: usize) -> CfaColor {
        self.tile[row & 1][col & 1]
    }

    /// True for tiles with both greens on one diagonal and red and blue on
    /// the other.
    pub fn is_bayer(&self) -> bool {
        let planes = [
            self.tile[0][0].plane(),
            self.tile[0][1].plane(),
            self.tile[1][0].plane(),
            self.tile[1][1].plane(),
        ];
        let greens = planes.iter().filter(|&&p| p == 1).count();
        greens == 2
            && (planes[0] == planes[3]) != (planes[1] == planes[2])
            && planes.contains(&0)
            && planes.contains(&2)
    }

    /// Tile seen from an origin moved `rows` down and `cols` right, as after
    /// cropping that many samples off the top and left.
    pub fn shifted(&self, rows: usize, cols: usize) -> Self {
        let at = |r: usize, c: usize| self.color_at(r + rows, c + cols);
        Self::new([[at(0, 0), at(0, 1)], [at(1, 0), at(1, 1)]])
    }

    /// Same tile with both greens reported as plain `Green`.
    pub fn merged_greens(&self) -> Self {
        let merge = |c: CfaColor| if c == CfaColor::Green2 { CfaColor::Green } else { c };
        Self::new([
            [merge(self.tile[0][0]), merge(self.tile[0][1])],
            [merge(self.tile[1][0]), merge(self.tile[1][1])],
        ])
    }
}

impl fmt::Display for CfaPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.tile {
            for color in row {
                write!(f, "{}", color.letter())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_patterns() {
        assert_eq!(CfaPattern::from_name("RGGB").unwrap(), CfaPattern::RGGB);
        assert_eq!(CfaPattern::from_name("bggr").unwrap(), CfaPattern::BGGR);
        assert_eq!(CfaPattern::GRBG.color_at(0, 1), CfaColor::Red);
        assert_eq!(CfaPattern::GBRG.color_at(3, 2), CfaColor::Red);
    }

    #[test]
    fn test_standard_tiles_are_bayer() {
        for pattern in [CfaPattern::RGGB, CfaPattern::BGGR, CfaPattern::GRBG, CfaPattern::GBRG] {
            assert!(pattern.is_bayer(), "{pattern}");
            assert!(pattern.merged_greens().is_bayer(), "{pattern}");
        }
        assert!(!CfaPattern::from_name("RGBG").unwrap().is_bayer());
    }

    #[test]
    fn test_shifted_origin() {
        assert_eq!(CfaPattern::RGGB.shifted(0, 1), CfaPattern::GRBG);
        assert_eq!(CfaPattern::RGGB.shifted(1, 0), CfaPattern::GBRG);
        assert_eq!(CfaPattern::RGGB.shifted(1, 1), CfaPattern::BGGR);
        assert_eq!(CfaPattern::RGGB.shifted(2, 4), CfaPattern::RGGB);
    }

    #[test]
    fn test_second_green_identity() {
        let pattern = CfaPattern::from_name("RGEB").unwrap();
        assert_eq!(pattern.color_at(1, 0), CfaColor::Green2);
        assert!(pattern.is_bayer());
        assert_eq!(pattern.merged_greens(), CfaPattern::RGGB);
        assert_eq!(pattern.to_string(), "RGEB");
    }

    #[test]
    fn test_rejects_unknown_patterns() {
        assert!(matches!(
            CfaPattern::from_name("RGXB"),
            Err(DevelopError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            CfaPattern::from_name("RGBGRGBG"),
            Err(DevelopError::UnsupportedFormat { .. })
        ));
        assert!(!CfaPattern::from_name("RRGB").unwrap().is_bayer());
        assert!(!CfaPattern::from_name("RBGG").unwrap().is_bayer());
    }
}
