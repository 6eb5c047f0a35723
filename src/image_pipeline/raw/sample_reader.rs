//! Reader for bare sensor sample streams.
//!
//! Such streams carry no header: geometry, sample format and CFA pattern come
//! either from metadata or from an explicit [`RawGeometry`] hint.

use std::fmt;
use std::io::{ErrorKind, Read};
use std::str::FromStr;

use tracing::{debug, instrument};

use crate::image_pipeline::common::error::{DevelopError, Result};
use crate::image_pipeline::metadata::{keys, MetadataProvider};
use crate::image_pipeline::raw::cfa::{CfaColor, CfaPattern};
use crate::image_pipeline::raw::types::GrayImage;

/// Default bit depth when metadata does not name one.
const DEFAULT_BITS_PER_SAMPLE: i64 = 16;

/// Layout of one sample in the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// One byte per sample
    Gray8,
    /// Two bytes per sample, little endian
    Gray16Le,
    /// Two bytes per sample, big endian
    Gray16Be,
    /// Two 12-bit samples packed big endian into three bytes
    Packed12,
}

impl SampleFormat {
    /// Bytes needed for `samples` samples.
    pub fn byte_len(self, samples: usize) -> Option<usize> {
        match self {
            SampleFormat::Gray8 => Some(samples),
            SampleFormat::Gray16Le | SampleFormat::Gray16Be => samples.checked_mul(2),
            SampleFormat::Packed12 => samples.checked_mul(3).map(|n| n.div_ceil(2)),
        }
    }

    fn decode(self, bytes: &[u8], samples: usize) -> Vec<u16> {
        match self {
            SampleFormat::Gray8 => bytes.iter().map(|&b| b as u16).collect(),
            SampleFormat::Gray16Le => bytes
                .chunks_exact(2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]))
                .collect(),
            SampleFormat::Gray16Be => bytes
                .chunks_exact(2)
                .map(|b| u16::from_be_bytes([b[0], b[1]]))
                .collect(),
            SampleFormat::Packed12 => {
                let mut out = Vec::with_capacity(samples + 1);
                for chunk in bytes.chunks(3) {
                    let b0 = chunk[0] as u16;
                    let b1 = chunk.get(1).copied().unwrap_or(0) as u16;
                    out.push((b0 << 4) | (b1 >> 4));
                    if let Some(&b2) = chunk.get(2) {
                        out.push(((b1 & 0x0f) << 8) | b2 as u16);
                    }
                }
                out.truncate(samples);
                out
            }
        }
    }
}

impl FromStr for SampleFormat {
    type Err = DevelopError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gray8" => Ok(SampleFormat::Gray8),
            "gray16le" | "gray16" => Ok(SampleFormat::Gray16Le),
            "gray16be" => Ok(SampleFormat::Gray16Be),
            "packed12" => Ok(SampleFormat::Packed12),
            other => Err(DevelopError::unsupported(
                "read",
                format!("sample format {other:?}"),
            )),
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SampleFormat::Gray8 => "gray8",
            SampleFormat::Gray16Le => "gray16le",
            SampleFormat::Gray16Be => "gray16be",
            SampleFormat::Packed12 => "packed12",
        };
        f.write_str(name)
    }
}

/// Explicit geometry for raw sub-images whose stream and metadata lack it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawGeometry {
    pub format: SampleFormat,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RawSampleReader;

impl RawSampleReader {
    pub fn new() -> Self {
        Self
    }

    /// Reads exactly `width * height` samples from `input`.
    ///
    /// Without `geometry`, width, height and sample format are taken from
    /// metadata. The CFA pattern always comes from metadata. Trailing bytes in
    /// the stream are left unread.
    #[instrument(skip_all, name = "read_samples")]
    pub fn read<R: Read, M: MetadataProvider>(
        &self,
        mut input: R,
        metadata: &M,
        geometry: Option<RawGeometry>,
    ) -> Result<GrayImage> {
        let geometry = match geometry {
            Some(geometry) => geometry,
            None => geometry_from_metadata(metadata)?,
        };
        let RawGeometry { format, width, height } = geometry;
        if width == 0 || height == 0 {
            return Err(DevelopError::malformed(
                "read",
                format!("image dimensions {width}x{height} are empty"),
            ));
        }

        let cfa = CfaPattern::from_name(&metadata.get_string(keys::CFA_PATTERN)?)?;
        let samples = width
            .checked_mul(height)
            .ok_or(DevelopError::InvalidDimensions(width, height))?;
        let byte_len = format
            .byte_len(samples)
            .ok_or(DevelopError::InvalidDimensions(width, height))?;

        debug!("Reading {}x{} {} samples ({} bytes)", width, height, format, byte_len);

        let mut bytes = vec![0u8; byte_len];
        input.read_exact(&mut bytes).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => DevelopError::malformed(
                "read",
                format!("stream shorter than the {byte_len} bytes a {width}x{height} {format} image needs"),
            ),
            _ => DevelopError::InputReadError(e.to_string()),
        })?;

        let data = format.decode(&bytes, samples);
        let (bits_per_sample, black_levels, white_levels) = read_levels(metadata)?;

        let mut image = GrayImage::new(width, height, data, cfa)?
            .with_levels(black_levels, white_levels);
        image.bits_per_sample = bits_per_sample;
        Ok(image)
    }
}

fn geometry_from_metadata<M: MetadataProvider>(metadata: &M) -> Result<RawGeometry> {
    let dimension = |key: &str| -> Result<usize> {
        let value = metadata.get_int(key)?;
        usize::try_from(value)
            .map_err(|_| DevelopError::malformed("read", format!("{key} is negative ({value})")))
    };

    let format = match metadata.get_string_opt(keys::SAMPLE_FORMAT)? {
        Some(name) => name.parse()?,
        None => SampleFormat::Gray16Le,
    };

    Ok(RawGeometry {
        format,
        width: dimension(keys::SENSOR_WIDTH)?,
        height: dimension(keys::SENSOR_HEIGHT)?,
    })
}

/// Sensor bit depth and per-identity black/white levels.
///
/// Each level is looked up under its per-identity key first, then the shared
/// key (whose first element is used when it holds one value per channel).
/// Black defaults to 0 and white to `2^bits - 1`.
pub fn read_levels<M: MetadataProvider>(metadata: &M) -> Result<(u32, [u16; 4], [u16; 4])> {
    let bits = metadata.get_int_or(keys::BITS_PER_SAMPLE, DEFAULT_BITS_PER_SAMPLE)?;
    if !(1..=16).contains(&bits) {
        return Err(DevelopError::unsupported(
            "read",
            format!("{bits} bits per sample"),
        ));
    }
    let bits = bits as u32;
    let full_scale = ((1u32 << bits) - 1) as i64;

    let level = |specific: String, shared: &str, default: i64| -> Result<u16> {
        let value = match metadata.get_int(&specific) {
            Err(DevelopError::MetadataKeyMissing { .. }) => metadata.get_int_or(shared, default)?,
            other => other?,
        };
        Ok(value.clamp(0, u16::MAX as i64) as u16)
    };

    let mut black_levels = [0u16; 4];
    let mut white_levels = [0u16; 4];
    for color in CfaColor::ALL {
        black_levels[color.index()] = level(keys::black_level(color), keys::BLACK_LEVEL, 0)?;
        white_levels[color.index()] =
            level(keys::white_level(color), keys::WHITE_LEVEL, full_scale)?;
    }

    Ok((bits, black_levels, white_levels))
}
