use anyhow::Result;
use image::DynamicImage;

use crate::detect::classes::ClassNames;
use crate::detect::result::Prediction;

/// Detector backend trait.
///
/// A backend is loaded once at process start and then only used for
/// inference. Implementations must not write to disk.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Class-index to label table used when a prediction carries none.
    fn class_names(&self) -> &ClassNames;

    /// Run inference on a decoded image.
    ///
    /// Returns one `Prediction` per input image; an empty vector means the
    /// model produced no result object at all (distinct from zero boxes).
    fn predict(&mut self, image: &DynamicImage) -> Result<Vec<Prediction>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
