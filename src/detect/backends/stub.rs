use anyhow::Result;
use image::DynamicImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::classes::ClassNames;
use crate::detect::result::{Prediction, RawBox};

/// Stub backend for testing and dry runs. Replays a scripted prediction.
pub struct StubBackend {
    class_names: ClassNames,
    script: Script,
    calls: u64,
}

enum Script {
    Boxes(Vec<RawBox>),
    NoResult,
}

impl StubBackend {
    /// A backend with COCO names that never detects anything.
    pub fn new() -> Self {
        Self {
            class_names: ClassNames::coco(),
            script: Script::Boxes(Vec::new()),
            calls: 0,
        }
    }

    pub fn with_class_names(mut self, class_names: ClassNames) -> Self {
        self.class_names = class_names;
        self
    }

    /// Return these boxes on every call.
    pub fn with_boxes(mut self, boxes: Vec<RawBox>) -> Self {
        self.script = Script::Boxes(boxes);
        self
    }

    /// Return no prediction at all on every call.
    pub fn with_no_result(mut self) -> Self {
        self.script = Script::NoResult;
        self
    }

    /// Number of `predict` calls served.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn class_names(&self) -> &ClassNames {
        &self.class_names
    }

    fn predict(&mut self, _image: &DynamicImage) -> Result<Vec<Prediction>> {
        self.calls += 1;
        match &self.script {
            Script::Boxes(boxes) => Ok(vec![Prediction::new(boxes.clone())]),
            Script::NoResult => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_backend_replays_script() -> Result<()> {
        let image = DynamicImage::new_rgb8(4, 4);

        let mut backend = StubBackend::new();
        let r1 = backend.predict(&image)?;
        assert_eq!(r1.len(), 1);
        assert!(r1[0].boxes.is_empty());

        let mut backend = StubBackend::new().with_boxes(vec![RawBox::new(63, 0.8)]);
        let r2 = backend.predict(&image)?;
        assert_eq!(r2[0].boxes, vec![RawBox::new(63, 0.8)]);
        assert_eq!(backend.class_names().label(63), "laptop");

        let mut backend = StubBackend::new().with_no_result();
        assert!(backend.predict(&image)?.is_empty());
        assert_eq!(backend.calls(), 1);
        Ok(())
    }
}
