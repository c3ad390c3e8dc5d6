mod backend;
mod backends;
mod classes;
mod handle;
pub mod postprocess;
mod result;

pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use classes::{ClassNames, COCO_CLASS_NAMES};
pub use handle::{BackendKind, DetectorHandle};
pub use result::{BoundingBox, Prediction, RawBox};
