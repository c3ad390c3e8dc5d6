#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::classes::ClassNames;
use crate::detect::postprocess::{decode_yolo_output, DecodeParams};
use crate::detect::result::Prediction;

/// Tract-based backend for Ultralytics ONNX exports.
///
/// Loads a local model file once and runs CPU inference on decoded images.
/// No network I/O and no writes to disk.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>,
    input_size: u32,
    class_names: ClassNames,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for square `input_size` inputs.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            class_names: ClassNames::coco(),
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
        })
    }

    pub fn with_class_names(mut self, class_names: ClassNames) -> Self {
        self.class_names = class_names;
        self
    }

    /// Override the default confidence and IoU thresholds.
    pub fn with_thresholds(mut self, confidence: f32, iou: f32) -> Self {
        self.confidence_threshold = confidence;
        self.iou_threshold = iou;
        self
    }

    fn build_input(&self, image: &DynamicImage) -> Result<Tensor> {
        let side = self.input_size;
        let resized = image
            .resize_exact(side, side, FilterType::Triangle)
            .to_rgb8();
        let side = side as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, channel, y, x)| {
            resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
        });
        Ok(input.into_tensor())
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    fn predict(&mut self, image: &DynamicImage) -> Result<Vec<Prediction>> {
        if image.width() == 0 || image.height() == 0 {
            return Err(anyhow!("image has zero width or height"));
        }
        let input = self.build_input(image)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let Some(output) = outputs.first() else {
            return Ok(Vec::new());
        };
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let shape = view.shape().to_vec();
        let data: Vec<f32> = view.iter().copied().collect();

        let params = DecodeParams {
            confidence_threshold: self.confidence_threshold,
            iou_threshold: self.iou_threshold,
            scale_x: image.width() as f32 / self.input_size as f32,
            scale_y: image.height() as f32 / self.input_size as f32,
            ..DecodeParams::default()
        };
        let boxes = decode_yolo_output(&data, &shape, &params)?;
        Ok(vec![Prediction::new(boxes)])
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = DynamicImage::new_rgb8(self.input_size, self.input_size);
        self.predict(&blank).map(|_| ())
    }
}
