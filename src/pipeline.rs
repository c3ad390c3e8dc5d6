//! Detection pipeline: image path in, `AnalysisResult` out.
//!
//! `DetectionPipeline::analyze` never fails. Every failure below it is a
//! typed `AnalysisFailure` whose text becomes the `respuesta` of an empty
//! result; a panic inside a collaborator is caught and reported the same way.
//! Artifact generation is best-effort and only ever degrades `modelo_url`.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader};

use crate::analysis::{primary_class, AnalysisResult, Detection};
use crate::config::OutputSettings;
use crate::detect::DetectorHandle;
use crate::generate::{request_generation, ArtifactNamer, ModelGenerator};

/// Why an analysis produced no detections.
#[derive(Debug)]
pub enum AnalysisFailure {
    MissingImage(PathBuf),
    ModelUnavailable(String),
    DecodeFailure,
    NoInferenceResult,
    NoDetections,
    Internal(String),
}

impl fmt::Display for AnalysisFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingImage(path) => {
                write!(f, "No se pudo leer la imagen: {}", path.display())
            }
            Self::ModelUnavailable(reason) => {
                write!(f, "Error cargando modelo YOLO: {}", reason)
            }
            Self::DecodeFailure => f.write_str(
                "La imagen no pudo ser decodificada (formato no soportado o archivo corrupto).",
            ),
            Self::NoInferenceResult => f.write_str("El modelo no devolvió resultados."),
            Self::NoDetections => {
                f.write_str("No se encontró ningún objeto relevante en la imagen.")
            }
            Self::Internal(reason) => write!(f, "Error interno en YOLO: {}", reason),
        }
    }
}

impl std::error::Error for AnalysisFailure {}

impl From<anyhow::Error> for AnalysisFailure {
    fn from(e: anyhow::Error) -> Self {
        Self::Internal(format!("{:#}", e))
    }
}

/// Single-image analysis with an injected detector and generator.
pub struct DetectionPipeline {
    detector: DetectorHandle,
    generator: Box<dyn ModelGenerator>,
    models_dir: PathBuf,
    url_prefix: String,
    namer: ArtifactNamer,
}

impl DetectionPipeline {
    /// Build the pipeline and create the artifact directory (idempotent).
    pub fn new<G: ModelGenerator + 'static>(
        detector: DetectorHandle,
        generator: G,
        output: &OutputSettings,
    ) -> Result<Self> {
        std::fs::create_dir_all(&output.models_dir).with_context(|| {
            format!(
                "failed to create models directory {}",
                output.models_dir.display()
            )
        })?;
        Ok(Self {
            detector,
            generator: Box::new(generator),
            models_dir: output.models_dir.clone(),
            url_prefix: output.url_prefix.trim_end_matches('/').to_string(),
            namer: ArtifactNamer::new(),
        })
    }

    /// Replace the artifact namer (e.g. with a seeded one).
    pub fn with_namer(mut self, namer: ArtifactNamer) -> Self {
        self.namer = namer;
        self
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn detector_ready(&self) -> bool {
        self.detector.is_ready()
    }

    /// Analyze one image. Never fails; see the module docs.
    pub fn analyze(&mut self, image_path: impl AsRef<Path>) -> AnalysisResult {
        let image_path = image_path.as_ref();
        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_analyze(image_path)));
        let failure = match outcome {
            Ok(Ok(result)) => return result,
            Ok(Err(failure)) => failure,
            Err(panic) => AnalysisFailure::Internal(panic_message(panic.as_ref())),
        };
        match &failure {
            AnalysisFailure::Internal(reason) => {
                log::error!("unexpected error analysing {}: {}", image_path.display(), reason)
            }
            other => log::info!("no detections for {}: {}", image_path.display(), other),
        }
        AnalysisResult::empty(failure.to_string())
    }

    fn try_analyze(&mut self, image_path: &Path) -> Result<AnalysisResult, AnalysisFailure> {
        let image_path = resolve_image_path(image_path)?;
        if !image_path.exists() {
            return Err(AnalysisFailure::MissingImage(image_path));
        }

        let backend = self
            .detector
            .backend_mut()
            .map_err(|reason| AnalysisFailure::ModelUnavailable(reason.to_string()))?;

        let image = decode_image(&image_path)?;

        let predictions = backend.predict(&image)?;
        let Some(prediction) = predictions.into_iter().next() else {
            return Err(AnalysisFailure::NoInferenceResult);
        };

        let names = prediction
            .class_names
            .as_ref()
            .unwrap_or_else(|| backend.class_names());
        let detections: Vec<Detection> = prediction
            .boxes
            .iter()
            .map(|b| Detection::from_score(names.label(b.class_index), b.confidence))
            .collect();
        if detections.is_empty() {
            return Err(AnalysisFailure::NoDetections);
        }
        log::debug!(
            "{} detections in {} via '{}'",
            detections.len(),
            image_path.display(),
            backend.name()
        );

        let primary = primary_class(&detections).to_string();
        let model_url = match self.generate_artifact(&image_path, &primary) {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("3D generation failed for '{}': {:#}", primary, e);
                None
            }
        };

        Ok(AnalysisResult::from_detections(detections, model_url))
    }

    fn generate_artifact(&mut self, image_path: &Path, primary: &str) -> Result<String> {
        let file_name = self.namer.allocate(&self.models_dir, primary)?;
        let output_path = self.models_dir.join(&file_name);
        request_generation(self.generator.as_ref(), image_path, &output_path, primary)?;
        log::info!(
            "generated {} with '{}'",
            output_path.display(),
            self.generator.name()
        );
        Ok(format!("{}/{}", self.url_prefix, file_name))
    }
}

/// Absolute form of `path` with `.` and `..` resolved.
///
/// Existing files are canonicalized (symlinks followed); missing ones are
/// normalized lexically so the error names the resolved location.
fn resolve_image_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    let normalized = normalize_lexically(&absolute);
    Ok(std::fs::canonicalize(&normalized).unwrap_or(normalized))
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn decode_image(path: &Path) -> Result<DynamicImage, AnalysisFailure> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|e| {
            log::debug!("failed to open {}: {}", path.display(), e);
            AnalysisFailure::DecodeFailure
        })?;
    reader.decode().map_err(|e| {
        log::debug!("failed to decode {}: {}", path.display(), e);
        AnalysisFailure::DecodeFailure
    })
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in detection pipeline".to_string()
    }
}
