//! 3D artifact generation.
//!
//! The pipeline delegates placeholder generation to a `ModelGenerator`.
//! Generators differ in whether they accept a class hint; the capability is
//! advertised up front and resolved by `request_generation`.

use std::fmt;
use std::path::Path;

use anyhow::Result;

pub mod naming;
mod placeholder;

pub use naming::{artifact_file_name, normalize_class, ArtifactNamer};
pub use placeholder::{PlaceholderGenerator, PlaceholderShape};

/// One generation request.
#[derive(Clone, Copy, Debug)]
pub struct GenerationRequest<'a> {
    pub image_path: &'a Path,
    pub output_path: &'a Path,
    /// Only set when the generator advertised `supports_class_hint`.
    pub class_hint: Option<&'a str>,
}

/// External 3D generator contract.
pub trait ModelGenerator: Send {
    /// Generator identifier.
    fn name(&self) -> &'static str;

    /// Whether `generate` understands `GenerationRequest::class_hint`.
    fn supports_class_hint(&self) -> bool {
        false
    }

    /// Write the artifact at `request.output_path`.
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<()>;
}

/// Returned by a generator that advertised hint support but rejected the hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsupportedClassHint;

impl fmt::Display for UnsupportedClassHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("generator does not accept a class hint")
    }
}

impl std::error::Error for UnsupportedClassHint {}

/// Ask `generator` for an artifact, passing `class` as hint when supported.
///
/// A generator that rejects the hint with `UnsupportedClassHint` is retried
/// once without it.
pub fn request_generation(
    generator: &dyn ModelGenerator,
    image_path: &Path,
    output_path: &Path,
    class: &str,
) -> Result<()> {
    let hinted = GenerationRequest {
        image_path,
        output_path,
        class_hint: (generator.supports_class_hint() && !class.is_empty()).then_some(class),
    };
    match generator.generate(&hinted) {
        Err(e) if hinted.class_hint.is_some() && e.is::<UnsupportedClassHint>() => {
            log::debug!(
                "generator '{}' rejected class hint; retrying without it",
                generator.name()
            );
            generator.generate(&GenerationRequest {
                class_hint: None,
                ..hinted
            })
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    use anyhow::anyhow;

    struct Recording {
        hint_support: bool,
        reject_hint: bool,
        seen: Mutex<Vec<Option<String>>>,
    }

    impl Recording {
        fn new(hint_support: bool, reject_hint: bool) -> Self {
            Self {
                hint_support,
                reject_hint,
                seen: Mutex::new(Vec::new()),
            }
        }

        fn seen(&self) -> Vec<Option<String>> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl ModelGenerator for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn supports_class_hint(&self) -> bool {
            self.hint_support
        }

        fn generate(&self, request: &GenerationRequest<'_>) -> Result<()> {
            self.seen
                .lock()
                .unwrap()
                .push(request.class_hint.map(str::to_string));
            if self.reject_hint && request.class_hint.is_some() {
                return Err(anyhow!(UnsupportedClassHint));
            }
            Ok(())
        }
    }

    fn paths() -> (PathBuf, PathBuf) {
        (PathBuf::from("in.png"), PathBuf::from("out.obj"))
    }

    #[test]
    fn hint_is_passed_only_when_advertised() -> Result<()> {
        let (image, out) = paths();

        let hinting = Recording::new(true, false);
        request_generation(&hinting, &image, &out, "laptop")?;
        assert_eq!(hinting.seen(), vec![Some("laptop".to_string())]);

        let legacy = Recording::new(false, false);
        request_generation(&legacy, &image, &out, "laptop")?;
        assert_eq!(legacy.seen(), vec![None]);
        Ok(())
    }

    #[test]
    fn rejected_hint_is_retried_without_it() -> Result<()> {
        let (image, out) = paths();
        let generator = Recording::new(true, true);
        request_generation(&generator, &image, &out, "cup")?;
        assert_eq!(generator.seen(), vec![Some("cup".to_string()), None]);
        Ok(())
    }

    #[test]
    fn other_failures_are_not_retried() {
        struct Broken;
        impl ModelGenerator for Broken {
            fn name(&self) -> &'static str {
                "broken"
            }
            fn supports_class_hint(&self) -> bool {
                true
            }
            fn generate(&self, _request: &GenerationRequest<'_>) -> Result<()> {
                Err(anyhow!("disk full"))
            }
        }

        let (image, out) = paths();
        let err = request_generation(&Broken, &image, &out, "cup").unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }
}
