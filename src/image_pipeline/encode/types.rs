//! Output encoding types

use std::path::Path;

/// Sample depth of the encoded file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputDepth {
    #[default]
    Eight,
    Sixteen,
}

impl OutputDepth {
    pub fn bits(self) -> u32 {
        match self {
            OutputDepth::Eight => 8,
            OutputDepth::Sixteen => 16,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            8 => Some(OutputDepth::Eight),
            16 => Some(OutputDepth::Sixteen),
            _ => None,
        }
    }
}

/// File format written by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Tiff,
    /// Binary PPM (P6), always 8-bit
    Ppm,
}

impl OutputFormat {
    /// `.ppm` selects PPM; anything else TIFF.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("ppm") => OutputFormat::Ppm,
            _ => OutputFormat::Tiff,
        }
    }
}

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffCompression {
    /// No compression (fastest, largest file)
    #[default]
    None,
    /// LZW compression (slow, good compression)
    Lzw,
    /// Deflate compression - fast level (good speed/size balance)
    DeflateFast,
    /// Deflate compression - best compression (slower)
    DeflateBest,
    /// Deflate compression - balanced
    DeflateBalanced,
}

/// Narrows a 16-bit sample to 8 bits.
#[inline]
pub(crate) fn to_8bit(value: u16) -> u8 {
    (value >> 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_path(Path::new("out.PPM")), OutputFormat::Ppm);
        assert_eq!(OutputFormat::from_path(Path::new("out.tif")), OutputFormat::Tiff);
        assert_eq!(OutputFormat::from_path(Path::new("out")), OutputFormat::Tiff);
    }

    #[test]
    fn test_depth_bits() {
        assert_eq!(OutputDepth::from_bits(16), Some(OutputDepth::Sixteen));
        assert_eq!(OutputDepth::from_bits(12), None);
        assert_eq!(OutputDepth::default().bits(), 8);
        assert_eq!(to_8bit(0xabcd), 0xab);
    }
}
