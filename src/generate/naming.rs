//! Artifact file naming: `{normalized_class}_{NNNN}.obj`.

use std::path::Path;

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Base name used when there is no primary class.
pub const FALLBACK_BASE_NAME: &str = "objeto";
pub const ARTIFACT_EXTENSION: &str = "obj";

const SUFFIX_MIN: u16 = 1000;
const SUFFIX_MAX: u16 = 9999;
const MAX_NAME_ATTEMPTS: usize = 32;

/// Lowercase and trim, then map every character outside `[a-z0-9_]` to `_`.
///
/// The result is always a single path component.
pub fn normalize_class(class: &str) -> String {
    let trimmed = class.trim();
    if trimmed.is_empty() {
        return FALLBACK_BASE_NAME.to_string();
    }
    trimmed
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn artifact_file_name(class: &str, suffix: u16) -> String {
    format!("{}_{}.{}", normalize_class(class), suffix, ARTIFACT_EXTENSION)
}

/// Draws random 4-digit suffixes and avoids names already present on disk.
pub struct ArtifactNamer {
    rng: StdRng,
}

impl ArtifactNamer {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic suffix sequence, for tests and reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_suffix(&mut self) -> u16 {
        self.rng.gen_range(SUFFIX_MIN..=SUFFIX_MAX)
    }

    /// Pick a file name for `class` that does not yet exist in `dir`.
    pub fn allocate(&mut self, dir: &Path, class: &str) -> Result<String> {
        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = artifact_file_name(class, self.next_suffix());
            if !dir.join(&name).exists() {
                return Ok(name);
            }
            log::debug!("artifact name {} already taken", name);
        }
        Err(anyhow!(
            "no free artifact name for '{}' in {} after {} attempts",
            normalize_class(class),
            dir.display(),
            MAX_NAME_ATTEMPTS
        ))
    }
}

impl Default for ArtifactNamer {
    fn default() -> Self {
        Self::new()
    }
}
