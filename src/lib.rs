//! Object detection to 3D placeholder pipeline.
//!
//! Given an image path, a detector reports labelled boxes; the labels are
//! summarised into an `AnalysisResult` and the most confident class drives
//! generation of a placeholder 3D artifact.
//!
//! # Module Structure
//!
//! - `analysis`: result data model (`Detection`, `AnalysisResult`)
//! - `detect`: detector backends and the once-loaded `DetectorHandle`
//! - `generate`: 3D generator contract, artifact naming, OBJ placeholders
//! - `pipeline`: `DetectionPipeline::analyze`, the never-failing entry point
//! - `config`: env file + TOML + environment configuration
//! - `llm`: chat provider model catalogue

pub mod analysis;
pub mod config;
pub mod detect;
pub mod generate;
pub mod llm;
pub mod pipeline;

pub use analysis::{AnalysisResult, Detection, NO_OBJECTS_DESCRIPTION};
pub use config::{AppConfig, DetectorSettings, LlmSettings, OutputSettings};
pub use detect::{
    BackendKind, ClassNames, DetectorBackend, DetectorHandle, Prediction, RawBox, StubBackend,
};
pub use generate::{
    GenerationRequest, ModelGenerator, PlaceholderGenerator, UnsupportedClassHint,
};
pub use pipeline::{AnalysisFailure, DetectionPipeline};
