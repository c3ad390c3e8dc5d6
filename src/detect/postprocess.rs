//! YOLO output decoding.
//!
//! Ultralytics exports (v5u, v8, v11) emit one tensor shaped `[1, 4 + nc, N]`:
//! per anchor a `cx, cy, w, h` box in input pixels followed by `nc` class
//! scores. Some converters emit the transposed `[1, N, 4 + nc]`; both are
//! accepted here. This module is plain slice math so it is usable without
//! any inference runtime.

use anyhow::{anyhow, Result};

use crate::detect::result::{BoundingBox, RawBox};

/// Decoding parameters.
#[derive(Clone, Copy, Debug)]
pub struct DecodeParams {
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub max_detections: usize,
    /// Multipliers taking input-space boxes back to source-image pixels.
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            iou_threshold: 0.45,
            max_detections: 300,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Decode a raw output tensor (row-major `data` with `shape`) into boxes.
///
/// Boxes are sorted by descending confidence after per-class NMS.
pub fn decode_yolo_output(
    data: &[f32],
    shape: &[usize],
    params: &DecodeParams,
) -> Result<Vec<RawBox>> {
    let (rows, cols) = match shape {
        [1, a, b] => (*a, *b),
        [a, b] => (*a, *b),
        other => return Err(anyhow!("unexpected detector output shape {:?}", other)),
    };
    let expected = rows
        .checked_mul(cols)
        .ok_or_else(|| anyhow!("detector output dimensions overflow"))?;
    if data.len() != expected {
        return Err(anyhow!(
            "detector output length mismatch: expected {}, got {}",
            expected,
            data.len()
        ));
    }

    // Attributes run along the shorter axis.
    let attrs_first = rows <= cols;
    let (num_attrs, num_anchors) = if attrs_first { (rows, cols) } else { (cols, rows) };
    if num_attrs < 5 {
        return Err(anyhow!(
            "detector output requires at least 5 attributes (box + 1 class), got {}",
            num_attrs
        ));
    }
    let at = |attr: usize, anchor: usize| -> f32 {
        if attrs_first {
            data[attr * num_anchors + anchor]
        } else {
            data[anchor * num_attrs + attr]
        }
    };

    let mut candidates = Vec::new();
    for anchor in 0..num_anchors {
        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..num_attrs - 4 {
            let score = at(4 + class, anchor);
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }
        if !best_score.is_finite() || best_score < params.confidence_threshold {
            continue;
        }
        let bbox = BoundingBox::from_center(
            at(0, anchor),
            at(1, anchor),
            at(2, anchor),
            at(3, anchor),
        )
        .scale(params.scale_x, params.scale_y);
        candidates.push(RawBox {
            class_index: best_class,
            confidence: best_score,
            bbox,
        });
    }

    Ok(non_max_suppression(
        candidates,
        params.iou_threshold,
        params.max_detections,
    ))
}

/// Greedy per-class NMS. Output is ordered by descending confidence.
pub fn non_max_suppression(
    mut boxes: Vec<RawBox>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<RawBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<RawBox> = Vec::new();
    for candidate in boxes {
        if kept.len() >= max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_index == candidate.class_index && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}
