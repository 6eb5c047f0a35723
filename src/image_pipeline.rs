//! Image processing pipeline module
//!
//! RAW development in stages: reading the sensor mosaic, white balance
//! scaling, demosaicing, colour conversion, tone mapping, orientation and
//! encoding, orchestrated by [`RawDevelopPipeline`].

pub mod color;
pub mod common;
pub mod conversions;
pub mod debayer;
pub mod encode;
pub mod filters;
pub mod metadata;
pub mod orientation;
pub mod raw;
pub mod tone;

pub use common::{Diagnostic, Diagnostics, DevelopError, Result};

pub use metadata::{InMemoryMetadata, MetadataProvider, MetadataValue, RawLoaderMetadata};

pub use raw::{
    CfaPattern,
    GrayImage,
    RawGeometry,
    RawImageReader,
    RawLoaderReader,
    RawSampleReader,
    SampleFormat,
};

pub use debayer::{Interpolation, RgbImage};

pub use color::{ColorMatrix, ColorSpaceConverter};

pub use tone::ToneConfig;

pub use orientation::Orientation;

pub use encode::{
    Encoder,
    ImageEncoder,
    OutputDepth,
    OutputFormat,
    TiffCompression,
};

pub use conversions::{
    CancelFlag,
    DevelopConfig,
    DevelopConfigBuilder,
    DevelopedImage,
    PipelineTimings,
    RawDevelopPipeline,
};
