/// Renderer for 3D point clouds drawn as depth-faded markers
use std::cell::RefCell;
use std::f32::consts::{PI, SQRT_2};
use std::rc::Rc;

use nalgebra::{Matrix4, Point2, Point3};

use crate::color::{Color, FaceColors};
use crate::error::{GeometryError, Result};
use crate::projection::transform_points;

use super::{depth_range, normalize_depth, DrawingSurface, Polygon, PolygonBatch, Renderer, SurfaceLink};

/// Marker radius in normalized device units
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerSize {
    Uniform(f32),
    PerPoint(Vec<f32>),
}

impl MarkerSize {
    fn resolve(&self, count: usize) -> Result<Vec<f32>> {
        match self {
            MarkerSize::Uniform(radius) => Ok(vec![*radius; count]),
            MarkerSize::PerPoint(radii) if radii.len() == count => Ok(radii.clone()),
            MarkerSize::PerPoint(radii) => Err(GeometryError::LengthMismatch {
                what: "marker sizes",
                expected: count,
                actual: radii.len(),
            }),
        }
    }
}

/// Styling of a [`ScatterRenderer`]
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterStyle {
    /// One color per point (`Flat`, or a list in point order)
    pub fill: FaceColors,
    pub edge: FaceColors,
    pub size: MarkerSize,
    pub line_width: f32,
    /// Color of the enlarged marker drawn under each point
    pub outline: Color,
    /// Number of sides of the marker polygons
    pub segments: usize,
}

impl Default for ScatterStyle {
    fn default() -> Self {
        Self {
            fill: FaceColors::Flat(Color::WHITE),
            edge: FaceColors::Flat(Color::BLACK),
            size: MarkerSize::Uniform(0.03),
            line_width: 0.5,
            outline: Color::rgba(0.0, 0.0, 0.0, 0.1),
            segments: 12,
        }
    }
}

impl ScatterStyle {
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

    pub fn size(mut self, size: MarkerSize) -> Self {
        self.size = size;
        self
    }

    pub fn line_width(mut self, line_width: f32) -> Self {
        self.line_width = line_width.max(0.0);
        self
    }
}

/// Point cloud renderer.
///
/// Each point becomes two markers painted back to front: an enlarged,
/// translucent outline and the point itself, whose colors are pulled toward
/// white the farther the point is.
pub struct ScatterRenderer {
    points: Vec<Point3<f32>>,
    fills: Vec<Color>,
    edges: Vec<Color>,
    radii: Vec<f32>,
    line_width: f32,
    outline: Color,
    unit_marker: Vec<Point2<f32>>,
    link: SurfaceLink,
    batch: PolygonBatch,
}

impl ScatterRenderer {
    pub fn new<S: DrawingSurface + 'static>(
        surface: &Rc<RefCell<S>>,
        transform: &Matrix4<f32>,
        points: Vec<Point3<f32>>,
        style: ScatterStyle,
    ) -> Result<Self> {
        let count = points.len();
        let fills = style.fill.per_item("point fill colors", count)?;
        let edges = style.edge.per_item("point edge colors", count)?;
        let radii = style.size.resolve(count)?;

        let segments = style.segments.max(3);
        let unit_marker = (0..segments)
            .map(|i| {
                let (s, c) = (2.0 * PI * i as f32 / segments as f32).sin_cos();
                Point2::new(c, s)
            })
            .collect();

        log::debug!("scatter renderer: {count} points, {segments}-sided markers");

        let mut renderer = Self {
            points,
            fills,
            edges,
            radii,
            line_width: style.line_width,
            outline: style.outline,
            unit_marker,
            link: SurfaceLink::new(surface),
            batch: PolygonBatch::default(),
        };
        renderer.update(transform);
        Ok(renderer)
    }

    fn marker(&self, center: Point2<f32>, radius: f32) -> Vec<Point2<f32>> {
        self.unit_marker
            .iter()
            .map(|p| center + p.coords * radius)
            .collect()
    }
}

impl Renderer for ScatterRenderer {
    fn update(&mut self, transform: &Matrix4<f32>) {
        let projected = transform_points(&self.points, transform);
        let mut order: Vec<usize> = (0..projected.len()).collect();
        order.sort_by(|&a, &b| projected[b].z.total_cmp(&projected[a].z));
        let range = depth_range(projected.iter().map(|p| p.z)).unwrap_or((0.0, 0.0));

        self.batch.clear();
        self.batch.antialiased = self.line_width > 0.0;
        let mut polygons = Vec::with_capacity(2 * order.len());
        for &i in &order {
            let center = projected[i].xy();
            // 0 for the nearest point, 1 for the farthest
            let fade = normalize_depth(projected[i].z, range);
            polygons.push(Polygon {
                points: self.marker(center, self.radii[i] * SQRT_2),
                fill: self.outline,
                edge: Color::TRANSPARENT,
                line_width: 0.0,
            });
            polygons.push(Polygon {
                points: self.marker(center, self.radii[i]),
                fill: self.fills[i].lightened(fade),
                edge: self.edges[i].lightened(fade),
                line_width: self.line_width,
            });
        }
        self.batch.polygons = polygons;
        log::trace!("scatter update: {} markers", self.batch.len());

        self.link.push(&self.batch);
    }

    fn batch(&self) -> &PolygonBatch {
        &self.batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::MemorySurface;
    use crate::transform::Transform;
    use approx::assert_relative_eq;

    fn render(points: Vec<Point3<f32>>, style: ScatterStyle) -> Result<ScatterRenderer> {
        let surface = Rc::new(RefCell::new(MemorySurface::new()));
        let mvp = Transform::ortho(-1.0, 1.0, -1.0, 1.0, 1.0, 10.0) * Transform::translate(0.0, 0.0, -5.0);
        ScatterRenderer::new(&surface, &mvp, points, style)
    }

    #[test]
    fn test_points_sorted_far_to_near_with_two_markers_each() {
        let points = vec![
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.5, 0.0, -1.0),
            Point3::new(-0.5, 0.0, 0.0),
        ];
        let colors = vec![Color::rgb(1.0, 0.0, 0.0), Color::rgb(0.0, 1.0, 0.0), Color::rgb(0.0, 0.0, 1.0)];
        let scatter = render(points, ScatterStyle::new().fill(FaceColors::PerVertex(colors))).unwrap();

        let polygons = &scatter.batch().polygons;
        assert_eq!(polygons.len(), 6);

        // Outline first, then the point itself.
        assert_eq!(polygons[0].fill, Color::rgba(0.0, 0.0, 0.0, 0.1));
        assert_eq!(polygons[0].line_width, 0.0);

        // Farthest point (green) is fully faded, nearest (red) untouched.
        assert_eq!(polygons[1].fill, Color::WHITE);
        assert_relative_eq!(polygons[3].fill.b, 1.0);
        assert_relative_eq!(polygons[3].fill.r, 0.5);
        assert_eq!(polygons[5].fill, Color::rgb(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_marker_geometry() {
        let style = ScatterStyle::new().size(MarkerSize::Uniform(0.1));
        let scatter = render(vec![Point3::new(0.25, -0.25, 0.0)], style).unwrap();
        let polygons = &scatter.batch().polygons;
        assert_eq!(polygons[1].points.len(), 12);
        for p in &polygons[1].points {
            assert_relative_eq!((p - Point2::new(0.25, -0.25)).norm(), 0.1, epsilon = 1e-5);
        }
        for p in &polygons[0].points {
            assert_relative_eq!((p - Point2::new(0.25, -0.25)).norm(), 0.1 * SQRT_2, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_single_point_is_not_faded() {
        let scatter = render(vec![Point3::origin()], ScatterStyle::new().fill(Color::rgb(0.2, 0.3, 0.4))).unwrap();
        assert_eq!(scatter.batch().polygons[1].fill, Color::rgb(0.2, 0.3, 0.4));
    }

    #[test]
    fn test_rejects_mismatched_inputs() {
        let points = vec![Point3::origin(); 2];
        assert!(render(points.clone(), ScatterStyle::new().size(MarkerSize::PerPoint(vec![0.1]))).is_err());
        assert!(render(points, ScatterStyle::new().edge(FaceColors::PerFace(vec![Color::BLACK; 3]))).is_err());
    }
}
