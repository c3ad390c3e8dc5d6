use crate::detect::classes::ClassNames;

/// Raw output of one inference call on one image.
#[derive(Clone, Debug, Default)]
pub struct Prediction {
    /// Boxes in model output order.
    pub boxes: Vec<RawBox>,
    /// Per-result class table; backends leave this empty to use their own.
    pub class_names: Option<ClassNames>,
}

impl Prediction {
    pub fn new(boxes: Vec<RawBox>) -> Self {
        Self {
            boxes,
            class_names: None,
        }
    }

    pub fn with_class_names(mut self, class_names: ClassNames) -> Self {
        self.class_names = Some(class_names);
        self
    }
}

/// One detected box before labelling.
#[derive(Clone, Debug, PartialEq)]
pub struct RawBox {
    pub class_index: usize,
    /// Model score in 0..=1.
    pub confidence: f32,
    /// Corners in source-image pixel coordinates.
    pub bbox: BoundingBox,
}

impl RawBox {
    pub fn new(class_index: usize, confidence: f32) -> Self {
        Self {
            class_index,
            confidence,
            bbox: BoundingBox::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x1: cx - w / 2.0,
            y1: cy - h / 2.0,
            x2: cx + w / 2.0,
            y2: cy + h / 2.0,
        }
    }

    pub fn area(&self) -> f32 {
        (self.x2 - self.x1).max(0.0) * (self.y2 - self.y1).max(0.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        let intersection = if x2 > x1 && y2 > y1 {
            (x2 - x1) * (y2 - y1)
        } else {
            0.0
        };
        let union = self.area() + other.area() - intersection;
        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    pub fn scale(&self, sx: f32, sy: f32) -> Self {
        Self {
            x1: self.x1 * sx,
            y1: self.y1 * sy,
            x2: self.x2 * sx,
            y2: self.y2 * sy,
        }
    }
}
