use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::config::DetectorSettings;
use crate::detect::backend::DetectorBackend;
use crate::detect::backends::StubBackend;
use crate::detect::classes::ClassNames;

/// Which detector implementation to load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Tract,
    Stub,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tract" | "onnx" => Ok(Self::Tract),
            "stub" => Ok(Self::Stub),
            other => Err(anyhow!(
                "unknown detector backend '{}'; expected tract or stub",
                other
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tract => f.write_str("tract"),
            Self::Stub => f.write_str("stub"),
        }
    }
}

/// The detector as loaded at process start.
///
/// Loading happens once; a failure is kept as text and reported on every
/// subsequent analysis instead of being retried.
pub enum DetectorHandle {
    Ready(Box<dyn DetectorBackend>),
    Unavailable(String),
}

impl DetectorHandle {
    pub fn ready<B: DetectorBackend + 'static>(backend: B) -> Self {
        Self::Ready(Box::new(backend))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }

    /// Load the configured backend, logging the outcome.
    pub fn load(settings: &DetectorSettings) -> Self {
        match load_backend(settings) {
            Ok(backend) => {
                log::info!(
                    "detector '{}' loaded from {} ({} classes)",
                    backend.name(),
                    settings.model_path.display(),
                    backend.class_names().len()
                );
                Self::Ready(backend)
            }
            Err(e) => {
                log::error!("failed to load detector: {:#}", e);
                Self::Unavailable(format!("{:#}", e))
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn backend_mut(&mut self) -> Result<&mut dyn DetectorBackend, &str> {
        match self {
            Self::Ready(backend) => Ok(backend.as_mut()),
            Self::Unavailable(reason) => Err(reason.as_str()),
        }
    }
}

fn load_backend(settings: &DetectorSettings) -> Result<Box<dyn DetectorBackend>> {
    let class_names = match &settings.labels_path {
        Some(path) => ClassNames::from_file(path)?,
        None => ClassNames::coco(),
    };
    match settings.backend {
        BackendKind::Stub => Ok(Box::new(StubBackend::new().with_class_names(class_names))),
        BackendKind::Tract => {
            if !settings.model_path.exists() {
                return Err(anyhow!(
                    "No se encontró el modelo YOLO en: {}\n\
                     Copiá el modelo ONNX a {} o definí YOLO_MODEL_PATH con su ubicación.",
                    settings.model_path.display(),
                    settings.model_path.display()
                ));
            }
            load_tract(settings, class_names)
        }
    }
}

#[cfg(feature = "backend-tract")]
fn load_tract(
    settings: &DetectorSettings,
    class_names: ClassNames,
) -> Result<Box<dyn DetectorBackend>> {
    use crate::detect::backends::TractBackend;

    let mut backend = TractBackend::new(&settings.model_path, settings.input_size)?
        .with_class_names(class_names)
        .with_thresholds(settings.confidence_threshold, settings.iou_threshold);
    backend.warm_up()?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn load_tract(
    _settings: &DetectorSettings,
    _class_names: ClassNames,
) -> Result<Box<dyn DetectorBackend>> {
    Err(anyhow!(
        "tract detector backend requires the backend-tract feature"
    ))
}
