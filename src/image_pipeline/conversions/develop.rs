use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use tracing::{error, info, info_span, instrument};

use crate::image_pipeline::{
    color::ColorSpaceConverter,
    common::diagnostics::{Diagnostic, Diagnostics},
    common::error::{DevelopError, Result},
    conversions::cancel::CancelFlag,
    conversions::config::DevelopConfig,
    conversions::timing::PipelineTimings,
    debayer::RgbImage,
    encode::{Encoder, ImageEncoder},
    filters::ScaleColorsFilter,
    metadata::MetadataProvider,
    orientation::Orientation,
    raw::{GrayImage, RawGeometry, RawImageReader, RawLoaderReader, RawSampleReader},
    tone::{GammaCurve, GammaFilter, Histogram},
};

/// A developed image with what happened while producing it.
#[derive(Debug, Clone)]
pub struct DevelopedImage {
    pub image: RgbImage,
    pub diagnostics: Diagnostics,
    pub timings: PipelineTimings,
}

/// Runs a mosaic through scale, demosaic, colour, tone and orientation, then
/// hands the result to an encoder.
pub struct RawDevelopPipeline<R: RawImageReader = RawLoaderReader, E: ImageEncoder = Encoder> {
    reader: R,
    encoder: E,
    config: DevelopConfig,
    cancel: CancelFlag,
}

impl RawDevelopPipeline<RawLoaderReader, Encoder> {
    pub fn new(config: DevelopConfig) -> Self {
        Self {
            reader: RawLoaderReader,
            encoder: Encoder::select(config.output_format, config.compression, config.predictor),
            config,
            cancel: CancelFlag::new(),
        }
    }
}

impl<R: RawImageReader> RawDevelopPipeline<R, Encoder> {
    /// Replaces the configuration and picks the encoder it asks for.
    pub fn set_config(&mut self, config: DevelopConfig) {
        self.encoder = Encoder::select(config.output_format, config.compression, config.predictor);
        self.config = config;
    }
}

impl<R: RawImageReader, E: ImageEncoder> RawDevelopPipeline<R, E> {
    pub fn with_custom(reader: R, encoder: E, config: DevelopConfig) -> Self {
        Self {
            reader,
            encoder,
            config,
            cancel: CancelFlag::new(),
        }
    }

    /// Shares `flag` with the caller; setting it stops the pipeline at the
    /// next stage boundary.
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = flag;
        self
    }

    pub fn cancel_flag(&self) -> &CancelFlag {
        &self.cancel
    }

    fn validate_dimensions(&self, width: usize, height: usize) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if width == 0 || height == 0 {
            return Err(DevelopError::InvalidDimensions(width, height));
        }

        if let Some(max) = self.config.max_dimension {
            if width > max || height > max {
                return Err(DevelopError::InvalidDimensions(width, height));
            }
        }

        Ok(())
    }

    /// Runs one stage: checks for cancellation, then times `f` inside a span.
    fn stage<T>(
        &self,
        timings: &mut PipelineTimings,
        stage: &'static str,
        f: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        self.cancel.check(stage)?;
        let _span = info_span!("stage", stage).entered();
        timings.time(stage, f).inspect_err(|e| error!(stage, "{}", e))
    }

    /// Develops an already-read mosaic.
    #[instrument(skip_all, fields(width = mosaic.width, height = mosaic.height))]
    pub fn develop<M: MetadataProvider>(&self, mosaic: GrayImage, metadata: &M) -> Result<DevelopedImage> {
        self.run_stages(mosaic, metadata, PipelineTimings::new())
    }

    /// Reads a bare sample stream and develops it.
    ///
    /// Geometry comes from `geometry` when given, from metadata otherwise.
    #[instrument(skip_all)]
    pub fn develop_stream<In: Read, M: MetadataProvider>(
        &self,
        input: In,
        metadata: &M,
        geometry: Option<RawGeometry>,
    ) -> Result<DevelopedImage> {
        let mut timings = PipelineTimings::new();
        let mosaic = self.stage(&mut timings, "read", || {
            RawSampleReader::new().read(input, metadata, geometry)
        })?;
        self.run_stages(mosaic, metadata, timings)
    }

    fn run_stages<M: MetadataProvider>(
        &self,
        mut mosaic: GrayImage,
        metadata: &M,
        mut timings: PipelineTimings,
    ) -> Result<DevelopedImage> {
        let mut diagnostics = Diagnostics::new();

        {
            let _span = info_span!("validate_dimensions", width = mosaic.width, height = mosaic.height).entered();
            self.validate_dimensions(mosaic.width, mosaic.height)?;
        }

        self.stage(&mut timings, "scale_colors", || {
            ScaleColorsFilter::from_metadata(metadata)?.apply(&mut mosaic)
        })?;

        // AHD scores homogeneity in Lab, so the camera matrix is needed first
        let converter = self.stage(&mut timings, "color_resolve", || {
            ColorSpaceConverter::resolve(metadata, self.config.color_matrix, &mut diagnostics)
        })?;

        let interpolation = self.config.interpolation;
        let mut image = self.stage(&mut timings, "demosaic", || {
            interpolation.run(mosaic, converter.cam_to_xyz())
        })?;

        self.stage(&mut timings, "color_convert", || {
            converter.apply(&mut image);
            Ok(())
        })?;

        self.stage(&mut timings, "gamma", || {
            let histogram = Histogram::from_image(&image);
            let curve = GammaCurve::from_histogram(&histogram, &self.config.tone);
            GammaFilter::new(&curve).apply(&mut image);
            Ok(())
        })?;

        if self.config.apply_orientation {
            image = self.stage(&mut timings, "orientation", || {
                let orientation = Orientation::from_metadata(metadata, &mut diagnostics)?;
                Ok(orientation.apply(image))
            })?;
        }

        info!(
            width = image.width,
            height = image.height,
            diagnostics = diagnostics.entries().len(),
            "Development complete"
        );
        Ok(DevelopedImage { image, diagnostics, timings })
    }

    /// Encodes a developed image, noting in its diagnostics when the encoder
    /// wrote fewer bits than configured.
    pub fn encode(&self, developed: &mut DevelopedImage, output: &mut dyn Write) -> Result<()> {
        let requested = self.config.output_depth;
        let written = self.stage(&mut developed.timings, "encode", || {
            self.encoder.encode(&developed.image, requested, output)
        })?;

        if written != requested {
            developed.diagnostics.push(Diagnostic::EncoderDepthReduced {
                requested: requested.bits(),
                written: written.bits(),
            });
        }
        Ok(())
    }

    /// Decodes a camera file held in memory, develops it and encodes the
    /// result to `output`.
    #[instrument(skip(self, input_data, output), fields(input_size = input_data.len()))]
    pub fn convert(&self, input_data: &[u8], output: &mut dyn Write) -> Result<DevelopedImage> {
        info!("Starting RAW development");

        let mut timings = PipelineTimings::new();
        let (mosaic, metadata) = self.stage(&mut timings, "read", || self.reader.read_raw(input_data))?;

        let mut developed = self.run_stages(mosaic, &metadata, timings)?;
        self.encode(&mut developed, output)?;
        Ok(developed)
    }

    /// Like [`convert`](Self::convert) between files. The output file is only
    /// created once development has succeeded.
    #[instrument(skip(self, input_path, output_path))]
    pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<DevelopedImage> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();

        info!(
            input = %input_path.display(),
            output = %output_path.display(),
            "Developing file"
        );

        let input_data = {
            let _span = info_span!("read_input_file").entered();
            std::fs::read(input_path).map_err(|e| {
                DevelopError::InputReadError(format!("{}: {}", input_path.display(), e))
            })?
        };

        let mut timings = PipelineTimings::new();
        let (mosaic, metadata) = self.stage(&mut timings, "read", || self.reader.read_raw(&input_data))?;
        drop(input_data);
        let mut developed = self.run_stages(mosaic, &metadata, timings)?;

        let output_file = {
            let _span = info_span!("create_output_file").entered();
            File::create(output_path).map_err(|e| {
                DevelopError::OutputWriteError(format!("{}: {}", output_path.display(), e))
            })?
        };

        let mut writer = BufWriter::new(output_file);
        self.encode(&mut developed, &mut writer)?;
        writer.flush().map_err(|e| {
            DevelopError::OutputWriteError(format!("{}: {}", output_path.display(), e))
        })?;

        Ok(developed)
    }

    pub fn config(&self) -> &DevelopConfig {
        &self.config
    }
}
