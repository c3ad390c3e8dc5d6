use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};

/// The 80 COCO class names, in the index order Ultralytics exports use.
pub const COCO_CLASS_NAMES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

/// Class-index to human-readable label table.
///
/// Sparse on purpose: a model may only name some of its indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassNames {
    names: HashMap<usize, String>,
}

impl ClassNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coco() -> Self {
        Self::from_labels(COCO_CLASS_NAMES)
    }

    /// Build a dense table where position is the class index.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: labels
                .into_iter()
                .enumerate()
                .map(|(idx, label)| (idx, label.into()))
                .collect(),
        }
    }

    /// Read a labels file: one label per line, blank lines and `#` comments skipped.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read labels file {}", path.display()))?;
        let labels: Vec<&str> = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        if labels.is_empty() {
            return Err(anyhow!("labels file {} is empty", path.display()));
        }
        Ok(Self::from_labels(labels))
    }

    pub fn insert(&mut self, index: usize, label: impl Into<String>) {
        self.names.insert(index, label.into());
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(&index).map(String::as_str)
    }

    /// Label for `index`, or the index itself when the table has no entry.
    pub fn label(&self, index: usize) -> String {
        self.get(index)
            .map(str::to_string)
            .unwrap_or_else(|| index.to_string())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unknown_index_falls_back_to_number() {
        let mut names = ClassNames::new();
        names.insert(3, "motorcycle");
        assert_eq!(names.label(3), "motorcycle");
        assert_eq!(names.label(41), "41");
    }

    #[test]
    fn coco_table_matches_export_order() {
        let names = ClassNames::coco();
        assert_eq!(names.len(), 80);
        assert_eq!(names.label(0), "person");
        assert_eq!(names.label(63), "laptop");
        assert_eq!(names.label(79), "toothbrush");
    }

    #[test]
    fn labels_file_skips_blank_and_comment_lines() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "# custom model")?;
        writeln!(file, "mug")?;
        writeln!(file)?;
        writeln!(file, "  teapot  ")?;
        let names = ClassNames::from_file(file.path())?;
        assert_eq!(names.len(), 2);
        assert_eq!(names.label(0), "mug");
        assert_eq!(names.label(1), "teapot");
        Ok(())
    }
}
