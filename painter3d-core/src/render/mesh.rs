/// Renderer for arbitrary indexed meshes
use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::Matrix4;

use crate::color::{Color, Colormap, FaceColors, FaceFill};
use crate::error::Result;
use crate::geometry::{validate_faces, Mesh};
use crate::projection::transform_points;

use super::{
    cull, depth_range, normalize_depth, project_faces, sort_back_to_front, CullMode, DrawingSurface, Polygon,
    PolygonBatch, Renderer, SurfaceLink,
};

/// Styling of a [`MeshRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct MeshStyle {
    pub fill: FaceFill,
    pub edge: FaceColors,
    pub line_width: f32,
    pub cull: CullMode,
}

impl Default for MeshStyle {
    fn default() -> Self {
        Self {
            fill: FaceFill::from(Color::WHITE),
            edge: FaceColors::Flat(Color::BLACK),
            line_width: 0.5,
            cull: CullMode::Front,
        }
    }
}

impl MeshStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(mut self, fill: impl Into<FaceFill>) -> Self {
        self.fill = fill.into();
        self
    }

    pub fn edge(mut self, edge: impl Into<FaceColors>) -> Self {
        self.edge = edge.into();
        self
    }

    pub fn line_width(mut self, line_width: f32) -> Self {
        self.line_width = line_width.max(0.0);
        self
    }

    pub fn cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }
}

/// Fill colors after construction-time resolution
#[derive(Debug, Clone)]
enum ResolvedFill {
    PerFace(Vec<Color>),
    Colormap(Colormap),
}

/// Depth-sorted, culled and colored rendering of a [`Mesh`]
pub struct MeshRenderer {
    mesh: Rc<Mesh>,
    fill: ResolvedFill,
    edge: Vec<Color>,
    line_width: f32,
    cull: CullMode,
    link: SurfaceLink,
    batch: PolygonBatch,
}

impl MeshRenderer {
    /// Validate the mesh and style, then render once with `transform`.
    pub fn new<S: DrawingSurface + 'static>(
        surface: &Rc<RefCell<S>>,
        transform: &Matrix4<f32>,
        mesh: Rc<Mesh>,
        style: MeshStyle,
    ) -> Result<Self> {
        validate_faces(&mesh.faces, mesh.vertices.len())?;
        let vertex_count = mesh.vertices.len();
        let fill = match style.fill {
            FaceFill::Colors(colors) => ResolvedFill::PerFace(colors.resolve("fill colors", &mesh.faces, vertex_count)?),
            FaceFill::Colormap(colormap) => ResolvedFill::Colormap(colormap),
        };
        let edge = style.edge.resolve("edge colors", &mesh.faces, vertex_count)?;

        log::debug!(
            "mesh renderer: {} vertices, {} faces of arity {}, cull {:?}",
            vertex_count,
            mesh.face_count(),
            mesh.arity(),
            style.cull
        );

        let mut renderer = Self {
            mesh,
            fill,
            edge,
            line_width: style.line_width,
            cull: style.cull,
            link: SurfaceLink::new(surface),
            batch: PolygonBatch::default(),
        };
        renderer.update(transform);
        Ok(renderer)
    }

    pub fn mesh(&self) -> &Rc<Mesh> {
        &self.mesh
    }
}

impl Renderer for MeshRenderer {
    fn update(&mut self, transform: &Matrix4<f32>) {
        let projected = transform_points(&self.mesh.vertices, transform);
        let mut records = project_faces(&projected, &self.mesh.faces);

        // The colormap spans every face of the frame, culled or not.
        let range = depth_range(records.iter().map(|r| r.depth)).unwrap_or((0.0, 0.0));

        cull(&mut records, self.cull);
        sort_back_to_front(&mut records);

        self.batch.clear();
        self.batch.antialiased = self.line_width > 0.0;
        for record in &records {
            let fill = match &self.fill {
                ResolvedFill::PerFace(colors) => colors[record.index],
                // Nearest face maps to 1.
                ResolvedFill::Colormap(colormap) => colormap.map(1.0 - normalize_depth(record.depth, range)),
            };
            self.batch.polygons.push(Polygon {
                points: record.outline(),
                fill,
                edge: self.edge[record.index],
                line_width: self.line_width,
            });
        }
        log::trace!("mesh update: {} of {} faces kept", records.len(), self.mesh.face_count());

        self.link.push(&self.batch);
    }

    fn batch(&self) -> &PolygonBatch {
        &self.batch
    }
}
