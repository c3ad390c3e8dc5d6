//! analyze - run object detection on images and emit JSON results
//!
//! For each image:
//! 1. Detects objects with the configured detector (loaded once)
//! 2. Summarises the labels into `descripcion` / `respuesta` / `objetos`
//! 3. Writes a placeholder 3D model for the most confident class
//!
//! One JSON document per image is written to stdout.

use anyhow::{anyhow, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use objeto3d::generate::ArtifactNamer;
use objeto3d::{AppConfig, BackendKind, DetectionPipeline, DetectorHandle, PlaceholderGenerator};

#[derive(Parser, Debug)]
#[command(
    name = "analyze",
    about = "Detect objects in images and generate 3D placeholders"
)]
struct Args {
    /// Image files to analyze
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// TOML config file (default: $APP_CONFIG)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the detector backend (tract|stub)
    #[arg(long, value_name = "NAME")]
    backend: Option<BackendKind>,

    /// Seed for artifact file suffixes (reproducible names)
    #[arg(long)]
    seed: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = AppConfig::load(args.config.as_deref())?;
    if let Some(backend) = args.backend {
        cfg.detector.backend = backend;
    }

    let detector = DetectorHandle::load(&cfg.detector);
    let mut pipeline = DetectionPipeline::new(detector, PlaceholderGenerator::new(), &cfg.output)?;
    if let Some(seed) = args.seed {
        pipeline = pipeline.with_namer(ArtifactNamer::seeded(seed));
    }
    log::info!(
        "writing 3D models to {} (detector ready: {})",
        pipeline.models_dir().display(),
        pipeline.detector_ready()
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for image in &args.images {
        let result = pipeline.analyze(image);
        let json = if args.pretty {
            serde_json::to_string_pretty(&result)
        } else {
            serde_json::to_string(&result)
        }
        .map_err(|e| anyhow!("failed to serialize result for {}: {}", image.display(), e))?;
        writeln!(out, "{}", json)?;
    }
    Ok(())
}
