use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use tracing::{error, info};

use rawdev_rs::image_pipeline::{DevelopConfig, OutputFormat, RawDevelopPipeline};
use rawdev_rs::logger;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let [_, input, output] = args.as_slice() else {
        let program = args.first().map(String::as_str).unwrap_or("rawdev");
        eprintln!("usage: {program} <input.raw> <output.tiff|output.ppm>");
        return ExitCode::FAILURE;
    };

    logger::init();

    match run(PathBuf::from(input), PathBuf::from(output)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Development failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    info!("Starting rawdev...");

    let config = DevelopConfig::builder()
        .output_format(OutputFormat::from_path(&output))
        .build();
    let pipeline = RawDevelopPipeline::new(config);

    info!("Output format: {:?}", pipeline.config().output_format);
    info!("Interpolation: {:?}", pipeline.config().interpolation);

    let developed = pipeline
        .convert_file(&input, &output)
        .with_context(|| format!("developing {}", input.display()))?;

    for diagnostic in developed.diagnostics.entries() {
        info!("Note: {}", diagnostic);
    }
    developed.timings.log_summary();
    info!("Wrote {}", output.display());

    Ok(())
}
