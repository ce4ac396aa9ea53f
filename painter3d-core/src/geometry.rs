/// Indexed polygon meshes and a few procedural shapes
use std::f32::consts::PI;
use std::path::Path;

use nalgebra::Point3;

use crate::color::Color;
use crate::error::{GeometryError, Result};
use crate::projection::fit_unit_cube;

/// A mesh of vertices and faces.
///
/// Every face lists the indices of its vertices; all faces of a mesh have the
/// same arity (3 for triangles, 4 for quads, ...). Faces are expected to be
/// wound counter-clockwise when seen from outside so that culling and
/// lighting agree across shared edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3<f32>>,
    pub faces: Vec<Vec<usize>>,
}

impl Mesh {
    /// Build a mesh, checking index range and face arity
    pub fn new(vertices: Vec<Point3<f32>>, faces: Vec<Vec<usize>>) -> Result<Self> {
        validate_faces(&faces, vertices.len())?;
        Ok(Self { vertices, faces })
    }

    /// Number of vertices per face (0 for a mesh without faces)
    pub fn arity(&self) -> usize {
        self.faces.first().map_or(0, Vec::len)
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Object-space positions of the vertices of face `index`
    pub fn face_points(&self, index: usize) -> Vec<Point3<f32>> {
        self.faces[index].iter().map(|&i| self.vertices[i]).collect()
    }

    /// Rescale and re-center the vertices into the unit cube
    pub fn fit_unit_cube(&mut self) {
        fit_unit_cube(&mut self.vertices);
    }

    /// Load an `.obj` or `.stl` file and fit it into the unit cube
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let mut mesh = match extension.as_str() {
            "obj" => crate::obj::load_obj(path)?,
            "stl" => crate::stl::load_stl(path)?,
            other => {
                return Err(GeometryError::parse(
                    "mesh",
                    format!("unsupported file extension {other:?} for {}", path.display()),
                ))
            }
        };
        mesh.fit_unit_cube();
        log::debug!("loaded {}: {} vertices, {} faces", path.display(), mesh.vertices.len(), mesh.face_count());
        Ok(mesh)
    }

    /// Axis-aligned cube with six quads, listed as
    /// `+Z (top), +X (right), +Y (front), -X (left), -Y (back), -Z (bottom)`.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let vertices = vec![
            Point3::new(h, h, h),    // A
            Point3::new(-h, h, h),   // B
            Point3::new(-h, -h, h),  // C
            Point3::new(h, -h, h),   // D
            Point3::new(h, -h, -h),  // E
            Point3::new(h, h, -h),   // F
            Point3::new(-h, h, -h),  // G
            Point3::new(-h, -h, -h), // H
        ];
        let faces = vec![
            vec![0, 1, 2, 3], // ABCD: top
            vec![0, 3, 4, 5], // ADEF: right
            vec![0, 5, 6, 1], // AFGB: front
            vec![1, 6, 7, 2], // BGHC: left
            vec![7, 4, 3, 2], // HEDC: back
            vec![4, 7, 6, 5], // EHGF: bottom
        ];
        Self { vertices, faces }
    }

    /// Latitude/longitude sphere made of triangles
    pub fn uv_sphere(radius: f32, slices: usize, stacks: usize) -> Self {
        let (vertices, cols, rows) = sphere_grid(radius, slices, stacks);
        let mut faces = Vec::with_capacity((rows - 1) * (cols - 1) * 2);
        for i in 0..rows - 1 {
            for j in 0..cols - 1 {
                let a = i * cols + j;
                let b = a + 1;
                let c = a + cols + 1;
                let d = a + cols;
                faces.push(vec![a, b, c]);
                faces.push(vec![c, d, a]);
            }
        }
        Self { vertices, faces }
    }

    /// Sphere made of quads with a checkerboard color per face
    pub fn checkered_sphere(radius: f32, slices: usize, stacks: usize) -> (Self, Vec<Color>) {
        let (vertices, cols, rows) = sphere_grid(radius, slices, stacks);
        let mut faces = Vec::with_capacity((rows - 1) * (cols - 1));
        let mut colors = Vec::with_capacity(faces.capacity());
        for i in 0..rows - 1 {
            for j in 0..cols - 1 {
                let a = i * cols + j;
                faces.push(vec![a, a + 1, a + cols + 1, a + cols]);
                let c = ((i + j) % 2) as f32;
                colors.push(Color::rgba(c, c, c, 1.0 - c * 0.1));
            }
        }
        (Self { vertices, faces }, colors)
    }

    /// Height field over [-0.5, 0.5]² made of triangles.
    ///
    /// `heights` is row-major with `rows * cols` entries; rows run along y.
    pub fn surface(heights: &[f32], rows: usize, cols: usize) -> Result<Self> {
        if heights.len() != rows * cols {
            return Err(GeometryError::LengthMismatch {
                what: "surface heights",
                expected: rows * cols,
                actual: heights.len(),
            });
        }
        let xs = linspace(-0.5, 0.5, cols);
        let ys = linspace(-0.5, 0.5, rows);
        let vertices = (0..rows * cols)
            .map(|k| Point3::new(xs[k % cols], ys[k / cols], heights[k]))
            .collect();

        let mut faces = Vec::with_capacity(rows.saturating_sub(1) * cols.saturating_sub(1) * 2);
        for i in 0..rows.saturating_sub(1) {
            for j in 0..cols.saturating_sub(1) {
                let a = i * cols + j;
                faces.push(vec![a, a + 1, a + cols + 1]);
                faces.push(vec![a, a + cols + 1, a + cols]);
            }
        }
        Ok(Self { vertices, faces })
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
        }
    }
}

/// Check that every face has the same arity (at least 3) and stays in range
pub fn validate_faces(faces: &[Vec<usize>], vertex_count: usize) -> Result<()> {
    let Some(expected) = faces.first().map(Vec::len) else {
        return Ok(());
    };
    if expected < 3 {
        return Err(GeometryError::DegenerateFace(expected));
    }
    for (face, indices) in faces.iter().enumerate() {
        if indices.len() != expected {
            return Err(GeometryError::ArityMismatch {
                face,
                expected,
                found: indices.len(),
            });
        }
        if let Some(&index) = indices.iter().find(|&&i| i >= vertex_count) {
            return Err(GeometryError::IndexOutOfRange {
                face,
                index,
                vertex_count,
            });
        }
    }
    Ok(())
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub(crate) fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * i as f32 / (n - 1) as f32)
            .collect(),
    }
}

/// Vertex grid shared by the sphere builders, with the poles on the z axis
fn sphere_grid(radius: f32, slices: usize, stacks: usize) -> (Vec<Point3<f32>>, usize, usize) {
    let cols = slices.max(3) + 1;
    let rows = stacks.max(2) + 1;
    let mut vertices = Vec::with_capacity(cols * rows);
    for polar in linspace(0.0, PI, rows) {
        for azimuth in linspace(0.0, 2.0 * PI, cols) {
            vertices.push(Point3::new(
                polar.sin() * azimuth.sin() * radius,
                polar.sin() * azimuth.cos() * radius,
                polar.cos() * radius,
            ));
        }
    }
    (vertices, cols, rows)
}
