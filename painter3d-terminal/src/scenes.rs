/// Demo scenes: camera placement plus the renderers drawing them
use std::cell::RefCell;
use std::f32::consts::PI;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{bail, Context};
use nalgebra::{Point3, Vector3};
use painter3d_core::{
    lighting::{shade_mesh, Light},
    render::{BarRenderer, BarStyle, MarkerSize, MeshRenderer, MeshStyle, ScatterRenderer, ScatterStyle},
    Camera, Color, Colormap, CullMode, FaceColors, Mesh, ProjectionMode, Renderer,
};

use crate::renderer::TerminalSurface;

pub type SharedRenderer = Rc<RefCell<dyn Renderer>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Scene {
    /// Translucent white cube
    Cube,
    /// Lit sphere
    Sphere,
    /// Sphere with alternating quad colors
    Checkered,
    /// Bar chart of a smooth bump
    Bars,
    /// Random-looking point cloud inside a sphere
    Scatter,
    /// Height field colored with a colormap
    Surface,
    /// Translucent point volume inside a wireframe cube
    Volume,
    /// OBJ or STL file, colored by depth
    Mesh(PathBuf),
}

impl Scene {
    pub const NAMES: [&'static str; 8] = [
        "cube", "sphere", "checkered", "bars", "scatter", "surface", "volume", "mesh",
    ];

    /// Scene from its command line name and optional mesh file
    pub fn from_args(name: Option<&str>, file: Option<&str>) -> anyhow::Result<Self> {
        Ok(match name.unwrap_or("cube") {
            "cube" => Scene::Cube,
            "sphere" => Scene::Sphere,
            "checkered" => Scene::Checkered,
            "bars" => Scene::Bars,
            "scatter" => Scene::Scatter,
            "surface" => Scene::Surface,
            "volume" => Scene::Volume,
            "mesh" => Scene::Mesh(PathBuf::from(file.context("the mesh scene needs a .obj or .stl file")?)),
            other => bail!("unknown scene {other:?}, expected one of {}", Scene::NAMES.join(", ")),
        })
    }

    pub fn camera(&self) -> Camera {
        match self {
            Scene::Cube => Camera::new(ProjectionMode::Perspective, 65.0, 40.0, 1.0),
            Scene::Sphere => Camera::new(ProjectionMode::Perspective, -35.0, 60.0, 1.0),
            Scene::Checkered => Camera::new(ProjectionMode::Perspective, 145.0, 35.0, 1.0),
            Scene::Bars => Camera::new(ProjectionMode::Perspective, 65.0, -125.0, 1.0),
            Scene::Scatter => Camera::new(ProjectionMode::Orthographic, 30.0, 20.0, 1.5),
            Scene::Surface => Camera::new(ProjectionMode::Perspective, 45.0, 45.0, 1.25),
            Scene::Volume => Camera::new(ProjectionMode::Perspective, 45.0, 35.0, 1.0),
            Scene::Mesh(_) => Camera::new(ProjectionMode::Orthographic, 0.0, 0.0, 2.0),
        }
    }

    /// Create the scene's renderers on `surface`, rendered once with `camera`
    pub fn build(&self, surface: &Rc<RefCell<TerminalSurface>>, camera: &Camera) -> anyhow::Result<Vec<SharedRenderer>> {
        let transform = camera.transform();
        let renderers = match self {
            Scene::Cube => {
                let style = MeshStyle::new()
                    .fill(Color::rgba(1.0, 1.0, 1.0, 0.75))
                    .edge(Color::BLACK)
                    .line_width(1.0)
                    .cull(CullMode::All);
                vec![shared(MeshRenderer::new(surface, &transform, Rc::new(Mesh::cube(1.0)), style)?)]
            }
            Scene::Sphere => {
                let sphere = Mesh::uv_sphere(0.75, 32, 32);
                let light = Light::new().direction(Vector3::new(-1.0, 1.0, 1.0)).specular(Color::WHITE, 16.0);
                let colors = shade_mesh(&sphere, &light)?;
                let style = MeshStyle::new().fill(FaceColors::PerFace(colors)).line_width(0.0);
                vec![shared(MeshRenderer::new(surface, &transform, Rc::new(sphere), style)?)]
            }
            Scene::Checkered => {
                let (sphere, colors) = Mesh::checkered_sphere(0.75, 16, 16);
                let style = MeshStyle::new()
                    .fill(FaceColors::PerFace(colors))
                    .edge(Color::WHITE)
                    .cull(CullMode::All);
                vec![shared(MeshRenderer::new(surface, &transform, Rc::new(sphere), style)?)]
            }
            Scene::Bars => {
                let (rows, cols) = (12, 12);
                let heights = grid(rows, cols, |x, y| 0.25 * bump(x, y));
                let reds = Colormap::reds();
                let colors = heights.iter().map(|h| reds.map(h / 0.25)).collect();
                let style = BarStyle::new().fill(FaceColors::PerFace(colors));
                vec![shared(BarRenderer::new(surface, &transform, &heights, rows, cols, style)?)]
            }
            Scene::Scatter => {
                let points = cloud(400);
                let viridis = Colormap::viridis();
                let colors = points.iter().map(|p| viridis.map(p.z + 0.5)).collect();
                let style = ScatterStyle::new()
                    .fill(FaceColors::PerFace(colors))
                    .size(MarkerSize::Uniform(0.02));
                vec![shared(ScatterRenderer::new(surface, &transform, points, style)?)]
            }
            Scene::Surface => {
                let (rows, cols) = (40, 40);
                let heights = grid(rows, cols, |x, y| 0.3 * bump(x, y));
                let viridis = Colormap::viridis();
                let colors = heights.iter().map(|h| viridis.map(h / 0.3)).collect();
                let style = MeshStyle::new()
                    .fill(FaceColors::PerVertex(colors))
                    .line_width(0.0)
                    .cull(CullMode::All);
                let mesh = Mesh::surface(&heights, rows, cols)?;
                vec![shared(MeshRenderer::new(surface, &transform, Rc::new(mesh), style)?)]
            }
            Scene::Volume => {
                let (points, values) = volume(12);
                let magma = Colormap::magma();
                let colors = values.iter().map(|&v| magma.map(v).with_alpha(0.5 * v * v)).collect();
                let sizes = values.iter().map(|&v| 0.01 + 0.02 * v).collect();
                let style = ScatterStyle::new()
                    .fill(FaceColors::PerFace(colors))
                    .edge(Color::TRANSPARENT)
                    .size(MarkerSize::PerPoint(sizes));
                let frame = MeshStyle::new()
                    .fill(Color::TRANSPARENT)
                    .edge(Color::rgba(1.0, 1.0, 1.0, 0.5))
                    .line_width(1.0);
                vec![
                    shared(ScatterRenderer::new(surface, &transform, points, style)?),
                    shared(MeshRenderer::new(surface, &transform, Rc::new(Mesh::cube(1.0)), frame)?),
                ]
            }
            Scene::Mesh(path) => {
                let mesh = Mesh::load(path).with_context(|| format!("failed to load {}", path.display()))?;
                log::info!("{}: {} vertices, {} faces", path.display(), mesh.vertices.len(), mesh.face_count());
                let style = MeshStyle::new()
                    .fill(Colormap::magma())
                    .edge(Color::rgba(0.0, 0.0, 0.0, 0.25));
                vec![shared(MeshRenderer::new(surface, &transform, Rc::new(mesh), style)?)]
            }
        };
        Ok(renderers)
    }
}

fn shared<R: Renderer + 'static>(renderer: R) -> SharedRenderer {
    Rc::new(RefCell::new(renderer))
}

/// Row-major samples of `f` over [-0.5, 0.5]²
fn grid(rows: usize, cols: usize, f: impl Fn(f32, f32) -> f32) -> Vec<f32> {
    let at = |i: usize, n: usize| if n > 1 { i as f32 / (n - 1) as f32 - 0.5 } else { 0.0 };
    (0..rows * cols).map(|k| f(at(k % cols, cols), at(k / cols, rows))).collect()
}

/// Two overlapping Gaussian hills, in [0, 1]
fn bump(x: f32, y: f32) -> f32 {
    let hill = |cx: f32, cy: f32, s: f32| (-((x - cx).powi(2) + (y - cy).powi(2)) / (2.0 * s * s)).exp();
    (hill(-0.15, -0.1, 0.15) + 0.6 * hill(0.2, 0.2, 0.1)).min(1.0)
}

/// Deterministic points filling a ball of radius 0.5
fn cloud(count: usize) -> Vec<Point3<f32>> {
    let golden = PI * (3.0 - 5.0f32.sqrt());
    (0..count)
        .map(|i| {
            let t = (i as f32 + 0.5) / count as f32;
            let z = 1.0 - 2.0 * t;
            let ring = (1.0 - z * z).sqrt();
            let angle = golden * i as f32;
            let radius = 0.5 * ((i * 7919) % count) as f32 / count as f32;
            Point3::new(ring * angle.cos(), ring * angle.sin(), z) * radius
        })
        .collect()
}

/// Samples of `sin(xyz) / xyz` on an `n`³ lattice over [-8, 8]³, placed in
/// [-0.5, 0.5]³ with values normalized to [0, 1]
fn volume(n: usize) -> (Vec<Point3<f32>>, Vec<f32>) {
    let at = |i: usize| if n > 1 { 16.0 * i as f32 / (n - 1) as f32 - 8.0 } else { 0.0 };
    let (points, raw): (Vec<_>, Vec<_>) = (0..n * n * n)
        .map(|k| {
            let (x, y, z) = (at(k % n), at(k / n % n), at(k / (n * n)));
            let product = x * y * z;
            let value = if product.abs() < 1e-6 { 1.0 } else { product.sin() / product };
            (Point3::new(x, y, z) / 16.0, value)
        })
        .unzip();
    let (lo, hi) = raw.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = if hi > lo { hi - lo } else { 1.0 };
    let values = raw.iter().map(|v| (v - lo) / span).collect();
    (points, values)
}
