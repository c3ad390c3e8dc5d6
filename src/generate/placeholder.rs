use std::f32::consts::PI;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};

use anyhow::{Context, Result};

use super::{GenerationRequest, ModelGenerator};

const CYLINDER_SEGMENTS: usize = 24;
const SPHERE_STACKS: usize = 12;
const SPHERE_SLICES: usize = 24;

const SLAB_CLASSES: &[&str] = &[
    "laptop", "book", "tv", "keyboard", "cell phone", "remote", "dining table", "bench",
    "skateboard", "surfboard", "bed", "pizza",
];
const CYLINDER_CLASSES: &[&str] = &[
    "bottle", "cup", "wine glass", "vase", "bowl", "potted plant", "fire hydrant",
    "parking meter", "toothbrush", "hair drier",
];
const SPHERE_CLASSES: &[&str] = &[
    "sports ball", "apple", "orange", "donut", "clock", "frisbee", "cake",
];

/// Primitive written for a class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaceholderShape {
    /// Axis-aligned box `width x height x depth`.
    Box { width: f32, height: f32, depth: f32 },
    Cylinder { radius: f32, height: f32 },
    Sphere { radius: f32 },
}

impl PlaceholderShape {
    /// Shape for an optional class hint and the source image aspect ratio (w / h).
    pub fn for_class(class_hint: Option<&str>, aspect: f32) -> Self {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect.clamp(0.25, 4.0)
        } else {
            1.0
        };
        let class = class_hint.map(|c| c.trim().to_lowercase());
        match class.as_deref() {
            Some(c) if SLAB_CLASSES.contains(&c) => Self::Box {
                width: aspect,
                height: 0.1,
                depth: 1.0,
            },
            Some(c) if CYLINDER_CLASSES.contains(&c) => Self::Cylinder {
                radius: 0.35,
                height: 1.0,
            },
            Some(c) if SPHERE_CLASSES.contains(&c) => Self::Sphere { radius: 0.5 },
            _ => Self::Box {
                width: aspect,
                height: 1.0,
                depth: 0.5,
            },
        }
    }

    fn mesh(&self) -> Mesh {
        match *self {
            Self::Box {
                width,
                height,
                depth,
            } => box_mesh(width, height, depth),
            Self::Cylinder { radius, height } => cylinder_mesh(radius, height, CYLINDER_SEGMENTS),
            Self::Sphere { radius } => sphere_mesh(radius, SPHERE_STACKS, SPHERE_SLICES),
        }
    }
}

/// Writes a Wavefront OBJ primitive chosen from the class hint.
///
/// Never overwrites an existing file.
#[derive(Clone, Debug)]
pub struct PlaceholderGenerator {
    accepts_hint: bool,
}

impl PlaceholderGenerator {
    pub fn new() -> Self {
        Self { accepts_hint: true }
    }

    /// A generator that ignores class hints and always writes the aspect box.
    pub fn without_class_hint() -> Self {
        Self {
            accepts_hint: false,
        }
    }
}

impl Default for PlaceholderGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelGenerator for PlaceholderGenerator {
    fn name(&self) -> &'static str {
        "placeholder"
    }

    fn supports_class_hint(&self) -> bool {
        self.accepts_hint
    }

    fn generate(&self, request: &GenerationRequest<'_>) -> Result<()> {
        let (width, height) = image::image_dimensions(request.image_path).with_context(|| {
            format!("failed to read image size of {}", request.image_path.display())
        })?;
        let aspect = width as f32 / height.max(1) as f32;
        let hint = if self.accepts_hint {
            request.class_hint
        } else {
            None
        };
        let shape = PlaceholderShape::for_class(hint, aspect);
        let object_name = hint
            .map(|c| c.trim().replace(char::is_whitespace, "_"))
            .unwrap_or_else(|| "placeholder".to_string());

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(request.output_path)
            .with_context(|| format!("failed to create {}", request.output_path.display()))?;
        let mut out = BufWriter::new(file);
        write_obj(&mut out, &object_name, &shape.mesh())?;
        out.flush()
            .with_context(|| format!("failed to write {}", request.output_path.display()))?;
        Ok(())
    }
}

struct Mesh {
    vertices: Vec<[f32; 3]>,
    /// 1-based vertex indices, as OBJ expects.
    faces: Vec<Vec<usize>>,
}

fn write_obj<W: Write>(out: &mut W, object_name: &str, mesh: &Mesh) -> Result<()> {
    writeln!(out, "# placeholder model")?;
    writeln!(out, "o {}", object_name)?;
    for [x, y, z] in &mesh.vertices {
        writeln!(out, "v {:.6} {:.6} {:.6}", x, y, z)?;
    }
    for face in &mesh.faces {
        let indices: Vec<String> = face.iter().map(|i| i.to_string()).collect();
        writeln!(out, "f {}", indices.join(" "))?;
    }
    Ok(())
}

fn box_mesh(width: f32, height: f32, depth: f32) -> Mesh {
    let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
    let vertices = vec![
        [-x, -y, -z],
        [x, -y, -z],
        [x, y, -z],
        [-x, y, -z],
        [-x, -y, z],
        [x, -y, z],
        [x, y, z],
        [-x, y, z],
    ];
    let faces = vec![
        vec![1, 4, 3, 2],
        vec![5, 6, 7, 8],
        vec![1, 2, 6, 5],
        vec![2, 3, 7, 6],
        vec![3, 4, 8, 7],
        vec![4, 1, 5, 8],
    ];
    Mesh { vertices, faces }
}

fn cylinder_mesh(radius: f32, height: f32, segments: usize) -> Mesh {
    let half = height / 2.0;
    let mut vertices = Vec::with_capacity(segments * 2);
    for ring_y in [-half, half] {
        for i in 0..segments {
            let theta = 2.0 * PI * i as f32 / segments as f32;
            vertices.push([radius * theta.cos(), ring_y, radius * theta.sin()]);
        }
    }
    let mut faces = Vec::with_capacity(segments + 2);
    for i in 0..segments {
        let next = (i + 1) % segments;
        faces.push(vec![i + 1, next + 1, segments + next + 1, segments + i + 1]);
    }
    faces.push((1..=segments).rev().collect());
    faces.push((segments + 1..=2 * segments).collect());
    Mesh { vertices, faces }
}

fn sphere_mesh(radius: f32, stacks: usize, slices: usize) -> Mesh {
    let mut vertices = vec![[0.0, radius, 0.0]];
    for stack in 1..stacks {
        let phi = PI * stack as f32 / stacks as f32;
        for slice in 0..slices {
            let theta = 2.0 * PI * slice as f32 / slices as f32;
            vertices.push([
                radius * phi.sin() * theta.cos(),
                radius * phi.cos(),
                radius * phi.sin() * theta.sin(),
            ]);
        }
    }
    vertices.push([0.0, -radius, 0.0]);
    let bottom = vertices.len();

    // Ring r (0-based) slice s lives at 2 + r * slices + s.
    let ring = |r: usize, s: usize| 2 + r * slices + (s % slices);
    let rings = stacks - 1;
    let mut faces = Vec::new();
    for s in 0..slices {
        faces.push(vec![1, ring(0, s + 1), ring(0, s)]);
    }
    for r in 0..rings - 1 {
        for s in 0..slices {
            faces.push(vec![ring(r, s), ring(r, s + 1), ring(r + 1, s + 1), ring(r + 1, s)]);
        }
    }
    for s in 0..slices {
        faces.push(vec![bottom, ring(rings - 1, s), ring(rings - 1, s + 1)]);
    }
    Mesh { vertices, faces }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_png(path: &Path, width: u32, height: u32) -> Result<()> {
        image::RgbImage::new(width, height).save(path)?;
        Ok(())
    }

    fn count_prefix(obj: &str, prefix: &str) -> usize {
        obj.lines().filter(|l| l.starts_with(prefix)).count()
    }

    #[test]
    fn shape_follows_class_hint() {
        assert!(matches!(
            PlaceholderShape::for_class(Some("Laptop"), 1.5),
            PlaceholderShape::Box { height, .. } if height < 0.2
        ));
        assert!(matches!(
            PlaceholderShape::for_class(Some("cup"), 1.0),
            PlaceholderShape::Cylinder { .. }
        ));
        assert!(matches!(
            PlaceholderShape::for_class(Some("sports ball"), 1.0),
            PlaceholderShape::Sphere { .. }
        ));
        assert_eq!(
            PlaceholderShape::for_class(None, 2.0),
            PlaceholderShape::Box {
                width: 2.0,
                height: 1.0,
                depth: 0.5
            }
        );
    }

    #[test]
    fn meshes_reference_valid_vertices() {
        for shape in [
            PlaceholderShape::for_class(Some("book"), 1.0),
            PlaceholderShape::for_class(Some("bottle"), 1.0),
            PlaceholderShape::for_class(Some("orange"), 1.0),
        ] {
            let mesh = shape.mesh();
            for face in &mesh.faces {
                assert!(face.len() >= 3);
                assert!(face.iter().all(|&i| i >= 1 && i <= mesh.vertices.len()));
            }
        }
    }

    #[test]
    fn writes_obj_and_refuses_to_overwrite() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let image_path = dir.path().join("photo.png");
        write_png(&image_path, 8, 4)?;
        let output_path = dir.path().join("cup_1234.obj");

        let generator = PlaceholderGenerator::new();
        let request = GenerationRequest {
            image_path: &image_path,
            output_path: &output_path,
            class_hint: Some("cup"),
        };
        generator.generate(&request)?;

        let obj = std::fs::read_to_string(&output_path)?;
        assert!(obj.contains("o cup"));
        assert_eq!(count_prefix(&obj, "v "), CYLINDER_SEGMENTS * 2);
        assert_eq!(count_prefix(&obj, "f "), CYLINDER_SEGMENTS + 2);

        assert!(generator.generate(&request).is_err());
        Ok(())
    }

    #[test]
    fn hintless_generator_writes_aspect_box() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let image_path = dir.path().join("photo.png");
        write_png(&image_path, 8, 4)?;
        let output_path = dir.path().join("cup_4321.obj");

        let generator = PlaceholderGenerator::without_class_hint();
        assert!(!generator.supports_class_hint());
        generator.generate(&GenerationRequest {
            image_path: &image_path,
            output_path: &output_path,
            class_hint: Some("cup"),
        })?;

        let obj = std::fs::read_to_string(&output_path)?;
        assert!(obj.contains("o placeholder"));
        assert_eq!(count_prefix(&obj, "v "), 8);
        assert!(obj.contains("v 1.000000 0.500000 0.250000"));
        Ok(())
    }
}
