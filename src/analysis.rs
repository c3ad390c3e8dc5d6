//! Analysis data model.
//!
//! - `Detection`: one labelled, confidence-scored box (percent, 2 decimals).
//! - `AnalysisResult`: the JSON-facing response of one `analyze` call.
//!
//! Field names on the wire are the ones existing clients consume
//! (`descripcion`, `respuesta`, `objetos`, `modelo_url`).

use serde::{Deserialize, Serialize};

/// Description used whenever a call produced no detections.
pub const NO_OBJECTS_DESCRIPTION: &str = "No se detectaron objetos.";

/// One detected object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "clase")]
    pub class_label: String,
    /// Percentage in 0..=100, rounded to 2 decimals.
    #[serde(rename = "confianza")]
    pub confidence: f64,
}

impl Detection {
    /// Build a detection from a raw model score in 0..=1.
    pub fn from_score(class_label: impl Into<String>, score: f32) -> Self {
        Self {
            class_label: class_label.into(),
            confidence: score_to_percent(score),
        }
    }
}

/// Result of analysing one image. Built once per call, never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "respuesta")]
    pub message: String,
    #[serde(rename = "objetos")]
    pub detections: Vec<Detection>,
    #[serde(rename = "modelo_url", default)]
    pub model_url: Option<String>,
}

impl AnalysisResult {
    /// The empty-result shape: no detections, no model, `message` explains why.
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            description: NO_OBJECTS_DESCRIPTION.to_string(),
            message: message.into(),
            detections: Vec::new(),
            model_url: None,
        }
    }

    /// Build a successful result from a non-empty detection list.
    pub fn from_detections(detections: Vec<Detection>, model_url: Option<String>) -> Self {
        if detections.is_empty() {
            return Self::empty(NO_OBJECTS_DESCRIPTION);
        }
        let description = describe(&detections);
        let message = format!("Se detectaron los siguientes objetos: {}.", description);
        Self {
            description,
            message,
            detections,
            model_url,
        }
    }

    /// True for the no-detections shape.
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Sorted, de-duplicated labels joined with ", ".
pub fn describe(detections: &[Detection]) -> String {
    let mut labels: Vec<&str> = detections.iter().map(|d| d.class_label.as_str()).collect();
    labels.sort_unstable();
    labels.dedup();
    labels.join(", ")
}

/// Label of the first detection holding the maximum confidence.
///
/// Returns an empty string for an empty slice.
pub fn primary_class(detections: &[Detection]) -> &str {
    let mut best: Option<&Detection> = None;
    for detection in detections {
        match best {
            Some(current) if detection.confidence <= current.confidence => {}
            _ => best = Some(detection),
        }
    }
    best.map(|d| d.class_label.trim()).unwrap_or("")
}

/// Scale a 0..=1 score to a percentage rounded to 2 decimals and clamped to 0..=100.
pub fn score_to_percent(score: f32) -> f64 {
    if !score.is_finite() {
        return 0.0;
    }
    let percent = ((score as f64) * 100.0 * 100.0).round() / 100.0;
    percent.clamp(0.0, 100.0)
}
