/// Face pipelines turning projected geometry into ordered polygon batches
///
/// Every renderer follows the same per-frame recipe: project the vertices,
/// compute one depth key per face, drop culled faces, sort farthest first and
/// emit flat-colored 2D polygons. The drawing surface then paints the batch in
/// list order, which gives painter's-algorithm hidden surface removal without
/// a depth buffer.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use nalgebra::{Matrix4, Point2, Point3};

use crate::color::Color;
use crate::projection::{facing, Facing};

pub mod bar;
pub mod mesh;
pub mod scatter;
pub mod surface;

pub use bar::{BarRenderer, BarStyle};
pub use mesh::{MeshRenderer, MeshStyle};
pub use scatter::{MarkerSize, ScatterRenderer, ScatterStyle};
pub use surface::MemorySurface;

/// Which faces survive backface culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// Keep faces whose front side is visible
    #[default]
    Front,
    /// Keep faces whose back side is visible
    Back,
    /// Keep everything (wireframes, transparent surfaces)
    All,
}

/// One flat-shaded 2D polygon with its styling
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point2<f32>>,
    pub fill: Color,
    pub edge: Color,
    pub line_width: f32,
}

/// Polygons ordered back to front, ready to be painted in list order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonBatch {
    pub polygons: Vec<Polygon>,
    pub antialiased: bool,
}

impl PolygonBatch {
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn clear(&mut self) {
        self.polygons.clear();
        self.antialiased = false;
    }
}

/// Handle of one renderer's slot on a drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub usize);

/// A 2D sink painting polygons in the order given, with no depth test.
///
/// Each renderer owns one layer; layers are painted in creation order.
pub trait DrawingSurface {
    /// Reserve a new, initially empty layer
    fn add_layer(&mut self) -> LayerId;

    /// Replace every polygon of `layer` with `batch`
    fn replace_polygons(&mut self, layer: LayerId, batch: &PolygonBatch);
}

/// A face pipeline that can be re-run for a new camera transform
pub trait Renderer {
    /// Re-project the geometry and rebuild the output batch in place
    fn update(&mut self, transform: &Matrix4<f32>);

    /// The batch produced by the last update
    fn batch(&self) -> &PolygonBatch;
}

/// Back reference from a renderer to its drawing surface
pub(crate) struct SurfaceLink {
    surface: Weak<RefCell<dyn DrawingSurface>>,
    layer: LayerId,
}

impl SurfaceLink {
    pub(crate) fn new<S: DrawingSurface + 'static>(surface: &Rc<RefCell<S>>) -> Self {
        let layer = surface.borrow_mut().add_layer();
        let surface: Rc<RefCell<dyn DrawingSurface>> = surface.clone();
        Self {
            surface: Rc::downgrade(&surface),
            layer,
        }
    }

    /// Hand the batch to the surface if it is still alive
    pub(crate) fn push(&self, batch: &PolygonBatch) {
        match self.surface.upgrade() {
            Some(surface) => surface.borrow_mut().replace_polygons(self.layer, batch),
            None => log::trace!("drawing surface for layer {:?} is gone", self.layer),
        }
    }
}

/// A projected face waiting to be sorted
#[derive(Debug, Clone)]
pub(crate) struct FaceRecord {
    /// Index into the renderer's face list
    pub index: usize,
    pub points: Vec<Point3<f32>>,
    pub depth: f32,
}

impl FaceRecord {
    pub(crate) fn outline(&self) -> Vec<Point2<f32>> {
        self.points.iter().map(|p| p.xy()).collect()
    }
}

/// Gather projected vertices per face and compute the mean-z depth key
pub(crate) fn project_faces(projected: &[Point3<f32>], faces: &[Vec<usize>]) -> Vec<FaceRecord> {
    faces
        .iter()
        .enumerate()
        .map(|(index, face)| {
            let points: Vec<Point3<f32>> = face.iter().map(|&i| projected[i]).collect();
            let depth = points.iter().map(|p| p.z).sum::<f32>() / points.len() as f32;
            FaceRecord {
                index,
                points,
                depth,
            }
        })
        .collect()
}

/// Drop the faces rejected by `mode`
pub(crate) fn cull(records: &mut Vec<FaceRecord>, mode: CullMode) {
    let keep = match mode {
        CullMode::All => return,
        CullMode::Front => Facing::Front,
        CullMode::Back => Facing::Back,
    };
    records.retain(|record| facing(&record.outline()) == keep);
}

/// Stable sort, farthest (largest NDC depth) first
pub(crate) fn sort_back_to_front(records: &mut [FaceRecord]) {
    records.sort_by(|a, b| b.depth.total_cmp(&a.depth));
}

/// Smallest and largest depth, `None` when empty
pub(crate) fn depth_range(depths: impl IntoIterator<Item = f32>) -> Option<(f32, f32)> {
    depths.into_iter().fold(None, |range, z| match range {
        None => Some((z, z)),
        Some((lo, hi)) => Some((lo.min(z), hi.max(z))),
    })
}

/// Map `z` into [0, 1] over `range`; a flat range maps to 0
pub(crate) fn normalize_depth(z: f32, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo {
        (z - lo) / (hi - lo)
    } else {
        0.0
    }
}
