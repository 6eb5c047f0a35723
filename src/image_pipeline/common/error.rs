use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevelopError {
    #[error("Metadata key missing: {key}")]
    MetadataKeyMissing { key: String },

    #[error("Metadata key {key} cannot be read as {expected}")]
    MetadataTypeMismatch { key: String, expected: &'static str },

    #[error("Unsupported format in {stage}: {detail}")]
    UnsupportedFormat { stage: &'static str, detail: String },

    #[error("Malformed input in {stage}: {reason}")]
    MalformedInput { stage: &'static str, reason: String },

    #[error("Invalid orientation code: {0}")]
    InvalidOrientationCode(i64),

    #[error("Failed to encode output image: {0}")]
    EncodingFailure(String),

    #[error("Failed to decode RAW image: {0}")]
    DecodeError(String),

    #[error("Failed to read input file: {0}")]
    InputReadError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Pipeline cancelled before {stage}")]
    Cancelled { stage: &'static str },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DevelopError {
    pub fn missing(key: &str) -> Self {
        Self::MetadataKeyMissing { key: key.to_string() }
    }

    pub fn malformed(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedInput { stage, reason: reason.into() }
    }

    pub fn unsupported(stage: &'static str, detail: impl Into<String>) -> Self {
        Self::UnsupportedFormat { stage, detail: detail.into() }
    }
}

pub type Result<T> = std::result::Result<T, DevelopError>;
