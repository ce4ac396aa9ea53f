/// Renderer for 3D bar charts: one extruded box per grid cell
use std::cell::RefCell;
use std::rc::Rc;

use nalgebra::{Matrix4, Point3};

use crate::color::{Color, FaceColors};
use crate::error::{GeometryError, Result};
use crate::geometry::linspace;
use crate::projection::transform_points;

use super::{cull, project_faces, sort_back_to_front, CullMode, DrawingSurface, Polygon, PolygonBatch, Renderer, SurfaceLink};

/// Quads of one bar, wound counter-clockwise seen from outside, in the
/// order -Z, +X, -X, -Y, +Y, +Z. Vertices 0..4 are the bottom corners
/// (+x+y, +x-y, -x-y, -x+y) and 4..8 the same corners on top.
const BOX_FACES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [0, 4, 5, 1],
    [2, 6, 7, 3],
    [1, 5, 6, 2],
    [0, 3, 7, 4],
    [4, 7, 6, 5],
];

/// Styling of a [`BarRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct BarStyle {
    /// One color per bar (`Flat`, or a list in grid order)
    pub fill: FaceColors,
    pub edge: FaceColors,
    pub line_width: f32,
    pub cull: CullMode,
    /// Fill multiplier per box face, in [`BOX_FACES`] order.
    ///
    /// Every bar is axis-aligned and identically oriented, so a fixed table
    /// stands in for per-face lighting.
    pub shade: [f32; 6],
    /// Weight of the bar's own depth in each face's sort key.
    ///
    /// Tuned, not exact: it keeps the faces of one bar together as long as
    /// the scene's depth range stays well inside the weighting.
    pub group_depth_weight: f32,
    pub xlim: (f32, f32),
    pub ylim: (f32, f32),
    /// `zlim.0` is the floor every bar starts from
    pub zlim: (f32, f32),
}

impl Default for BarStyle {
    fn default() -> Self {
        Self {
            fill: FaceColors::Flat(Color::WHITE),
            edge: FaceColors::Flat(Color::BLACK),
            line_width: 0.0,
            cull: CullMode::All,
            shade: [1.0, 1.0, 0.75, 1.0, 0.5, 1.0],
            group_depth_weight: 10.0,
            xlim: (-0.5, 0.5),
            ylim: (-0.5, 0.5),
            zlim: (-0.5, 0.5),
        }
    }
}

impl BarStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(mut self, fill: impl Into<FaceColors>) -> Self {
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

    pub fn group_depth_weight(mut self, weight: f32) -> Self {
        self.group_depth_weight = weight;
        self
    }
}

/// Bars of height `heights[row * cols + col]` on a `rows x cols` grid.
///
/// Columns run along x and rows along y.
pub struct BarRenderer {
    vertices: Vec<Point3<f32>>,
    faces: Vec<Vec<usize>>,
    fills: Vec<Color>,
    edges: Vec<Color>,
    line_width: f32,
    cull: CullMode,
    group_depth_weight: f32,
    link: SurfaceLink,
    batch: PolygonBatch,
}

impl BarRenderer {
    pub fn new<S: DrawingSurface + 'static>(
        surface: &Rc<RefCell<S>>,
        transform: &Matrix4<f32>,
        heights: &[f32],
        rows: usize,
        cols: usize,
        style: BarStyle,
    ) -> Result<Self> {
        let bars = rows * cols;
        if heights.len() != bars {
            return Err(GeometryError::LengthMismatch {
                what: "bar heights",
                expected: bars,
                actual: heights.len(),
            });
        }
        let bar_fills = style.fill.per_item("bar fill colors", bars)?;
        let bar_edges = style.edge.per_item("bar edge colors", bars)?;

        let xs = linspace(style.xlim.0, style.xlim.1, cols);
        let ys = linspace(style.ylim.0, style.ylim.1, rows);
        let dx = 0.5 / cols.max(1) as f32;
        let dy = 0.5 / rows.max(1) as f32;
        let floor = style.zlim.0;

        let mut vertices = Vec::with_capacity(bars * 8);
        let mut faces = Vec::with_capacity(bars * 6);
        let mut fills = Vec::with_capacity(bars * 6);
        let mut edges = Vec::with_capacity(bars * 6);
        for (bar, &height) in heights.iter().enumerate() {
            let (x, y) = (xs[bar % cols], ys[bar / cols]);
            let base = vertices.len();
            for z in [floor, floor + height] {
                vertices.push(Point3::new(x + dx, y + dy, z));
                vertices.push(Point3::new(x + dx, y - dy, z));
                vertices.push(Point3::new(x - dx, y - dy, z));
                vertices.push(Point3::new(x - dx, y + dy, z));
            }
            for (quad, shade) in BOX_FACES.iter().zip(style.shade) {
                faces.push(quad.iter().map(|&i| base + i).collect());
                fills.push(bar_fills[bar].shaded(shade).with_alpha(1.0));
                edges.push(bar_edges[bar]);
            }
        }

        log::debug!("bar renderer: {rows}x{cols} bars, group depth weight {}", style.group_depth_weight);

        let mut renderer = Self {
            vertices,
            faces,
            fills,
            edges,
            line_width: style.line_width,
            cull: style.cull,
            group_depth_weight: style.group_depth_weight,
            link: SurfaceLink::new(surface),
            batch: PolygonBatch::default(),
        };
        renderer.update(transform);
        Ok(renderer)
    }
}

impl Renderer for BarRenderer {
    fn update(&mut self, transform: &Matrix4<f32>) {
        let projected = transform_points(&self.vertices, transform);
        let mut records = project_faces(&projected, &self.faces);

        // Key = own depth + K * depth of the bar's bottom face, so a bar's
        // faces sort together before ties between bars are broken.
        for group in records.chunks_mut(BOX_FACES.len()) {
            let bottom = group[0].depth;
            for record in group.iter_mut() {
                record.depth += self.group_depth_weight * bottom;
            }
        }

        cull(&mut records, self.cull);
        sort_back_to_front(&mut records);

        self.batch.clear();
        self.batch.antialiased = self.line_width > 0.0;
        self.batch.polygons.extend(records.iter().map(|record| Polygon {
            points: record.outline(),
            fill: self.fills[record.index],
            edge: self.edges[record.index],
            line_width: self.line_width,
        }));
        log::trace!("bar update: {} faces emitted", records.len());

        self.link.push(&self.batch);
    }

    fn batch(&self) -> &PolygonBatch {
        &self.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;
    use crate::projection::ProjectionMode;
    use crate::render::MemorySurface;
    use crate::transform::Transform;
    use approx::assert_relative_eq;

    fn surface() -> Rc<RefCell<MemorySurface>> {
        Rc::new(RefCell::new(MemorySurface::new()))
    }

    #[test]
    fn test_boxes_wind_outward() {
        let bars = BarRenderer::new(&surface(), &Matrix4::identity(), &[0.4], 1, 1, BarStyle::new()).unwrap();
        let center = bars.vertices.iter().fold(nalgebra::Vector3::zeros(), |acc, v| acc + v.coords) / 8.0;
        for face in &bars.faces {
            let p: Vec<Point3<f32>> = face.iter().map(|&i| bars.vertices[i]).collect();
            let normal = (p[1] - p[0]).cross(&(p[2] - p[0]));
            let middle = p.iter().fold(nalgebra::Vector3::zeros(), |acc, v| acc + v.coords) / 4.0;
            assert!(normal.dot(&(middle - center)) > 0.0);
        }
    }

    #[test]
    fn test_shade_table_applied_per_face() {
        let style = BarStyle::new().fill(Color::rgba(0.8, 0.4, 0.2, 0.3));
        let bars = BarRenderer::new(&surface(), &Matrix4::identity(), &[0.2, 0.3], 1, 2, style).unwrap();
        assert_eq!(bars.faces.len(), 12);
        assert_relative_eq!(bars.fills[2].r, 0.6);
        assert_relative_eq!(bars.fills[4].g, 0.2);
        assert!(bars.fills.iter().all(|c| c.a == 1.0));
    }

    #[test]
    fn test_grid_emits_six_faces_per_bar() {
        let camera = Camera::new(ProjectionMode::Perspective, 65.0, -125.0, 1.0);
        let heights = [0.1, 0.5, 0.3, 0.05, 0.4, 0.2, 0.25, 0.15, 0.35];
        let bars = BarRenderer::new(&surface(), &camera.transform(), &heights, 3, 3, BarStyle::new()).unwrap();

        let batch = bars.batch();
        assert_eq!(batch.len(), 54);
        assert!(!batch.antialiased);

        let culled = BarRenderer::new(
            &surface(),
            &camera.transform(),
            &heights,
            3,
            3,
            BarStyle::new().cull(CullMode::Front).line_width(1.0),
        )
        .unwrap();
        // A box never shows more than three faces at once.
        assert!(culled.batch().len() <= 27);
        assert!(culled.batch().antialiased);
    }

    #[test]
    fn test_rejects_bad_grid() {
        let result = BarRenderer::new(&surface(), &Matrix4::identity(), &[0.1, 0.2, 0.3], 2, 2, BarStyle::new());
        assert!(matches!(result, Err(GeometryError::LengthMismatch { expected: 4, actual: 3, .. })));

        let style = BarStyle::new().fill(FaceColors::PerFace(vec![Color::WHITE; 3]));
        let result = BarRenderer::new(&surface(), &Matrix4::identity(), &[0.1; 4], 2, 2, style);
        assert!(matches!(result, Err(GeometryError::ColorCount { .. })));
    }

    #[test]
    fn test_group_weight_orders_bars_by_distance() {
        // Two bars along x, seen from +x: the bar at -x is farther away.
        let mvp = Transform::ortho(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0)
            * Transform::translate(0.0, 0.0, -5.0)
            * Transform::yrotate(-90.0);
        let style = BarStyle::new().fill(FaceColors::PerFace(vec![Color::rgb(1.0, 0.0, 0.0), Color::rgb(0.0, 0.0, 1.0)]));
        let bars = BarRenderer::new(&surface(), &mvp, &[0.3, 0.3], 1, 2, style).unwrap();

        let polygons = &bars.batch().polygons;
        assert_eq!(polygons.len(), 12);
        assert!(polygons[..6].iter().all(|p| p.fill.g == 0.0 && p.fill.r > 0.0));
        assert!(polygons[6..].iter().all(|p| p.fill.b > 0.0));
    }
}
