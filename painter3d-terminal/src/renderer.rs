/// Character-cell drawing surface for terminal rendering
use crossterm::{
    cursor,
    style::{self, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::Point2;
use painter3d_core::{Color, DrawingSurface, InteractionSurface, LayerId, Polygon, PolygonBatch};
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Height of a terminal cell relative to its width
pub const CELL_ASPECT: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Cell {
    color: Color,
    covered: bool,
}

const EMPTY: Cell = Cell {
    color: Color::BLACK,
    covered: false,
};

/// Drawing and interaction surface painting polygon layers into terminal
/// cells, in list order and without a depth buffer.
///
/// The visible region is the square `[-extent, extent]²` of normalized device
/// coordinates, centered in the grid. The last row is kept for the status
/// line.
pub struct TerminalSurface {
    width: usize,
    height: usize,
    layers: Vec<PolygonBatch>,
    cells: Vec<Cell>,
    extent: f32,
    status: String,
    dirty: bool,
}

impl TerminalSurface {
    pub fn new(width: usize, height: usize) -> Self {
        let rows = height.saturating_sub(1);
        Self {
            width,
            height: rows,
            layers: Vec::new(),
            cells: vec![EMPTY; width * rows],
            extent: 1.0,
            status: String::new(),
            dirty: true,
        }
    }

    /// Adapt to a new terminal size, keeping the layers
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height.saturating_sub(1);
        self.cells = vec![EMPTY; self.width * self.height];
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Cells per view unit vertically; horizontally it is `CELL_ASPECT` times more
    fn scale(&self) -> f32 {
        let vertical = self.height as f32 / 2.0;
        let horizontal = self.width as f32 / (2.0 * CELL_ASPECT);
        vertical.min(horizontal) / self.extent
    }

    /// Continuous cell coordinates of a view-space point
    fn to_cell(&self, p: &Point2<f32>) -> Point2<f32> {
        let scale = self.scale();
        Point2::new(
            self.width as f32 / 2.0 + p.x * scale * CELL_ASPECT,
            self.height as f32 / 2.0 - p.y * scale,
        )
    }

    /// View-space point at the center of cell (`column`, `row`)
    pub fn cell_to_view(&self, column: u16, row: u16) -> Point2<f32> {
        let scale = self.scale();
        Point2::new(
            (column as f32 + 0.5 - self.width as f32 / 2.0) / (scale * CELL_ASPECT),
            (self.height as f32 / 2.0 - (row as f32 + 0.5)) / scale,
        )
    }

    /// Rebuild the cell grid from every layer, back to front
    pub fn repaint(&mut self) {
        self.cells.fill(EMPTY);
        let layers = std::mem::take(&mut self.layers);
        for polygon in layers.iter().flat_map(|batch| batch.polygons.iter()) {
            self.paint_polygon(polygon);
        }
        self.layers = layers;
        self.dirty = false;
    }

    fn paint_polygon(&mut self, polygon: &Polygon) {
        let points: Vec<Point2<f32>> = polygon.points.iter().map(|p| self.to_cell(p)).collect();
        if points.len() >= 3 && polygon.fill.a > 0.0 {
            for i in 1..points.len() - 1 {
                self.fill_triangle(points[0], points[i], points[i + 1], polygon.fill);
            }
        }
        if polygon.line_width > 0.0 && polygon.edge.a > 0.0 {
            for (i, start) in points.iter().enumerate() {
                let end = points[(i + 1) % points.len()];
                self.draw_line(*start, end, polygon.edge);
            }
        }
    }

    fn fill_triangle(&mut self, v0: Point2<f32>, v1: Point2<f32>, v2: Point2<f32>, color: Color) {
        // Bounding box, clipped to the grid
        let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as usize;
        let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as isize).min(self.width as isize - 1);
        let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as usize;
        let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as isize).min(self.height as isize - 1);
        if max_x < 0 || max_y < 0 {
            return;
        }

        for y in min_y..=max_y as usize {
            for x in min_x..=max_x as usize {
                let p = Point2::new(x as f32 + 0.5, y as f32 + 0.5);
                if let Some((w0, w1, w2)) = barycentric(v0, v1, v2, p) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        self.blend(x, y, color);
                    }
                }
            }
        }
    }

    /// Bresenham line between two continuous cell positions
    fn draw_line(&mut self, from: Point2<f32>, to: Point2<f32>, color: Color) {
        let Some((from, to)) = clip_segment(from, to, self.width as f32, self.height as f32) else {
            return;
        };
        let (mut x, mut y) = (from.x.floor() as i64, from.y.floor() as i64);
        let (x1, y1) = (to.x.floor() as i64, to.y.floor() as i64);
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut error = dx + dy;
        loop {
            if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
                self.blend(x as usize, y as usize, color);
            }
            if x == x1 && y == y1 {
                break;
            }
            let doubled = 2 * error;
            if doubled >= dy {
                error += dy;
                x += sx;
            }
            if doubled <= dx {
                error += dx;
                y += sy;
            }
        }
    }

    /// Alpha-blend `color` over the cell
    fn blend(&mut self, x: usize, y: usize, color: Color) {
        let cell = &mut self.cells[y * self.width + x];
        let base = if cell.covered { cell.color } else { Color::BLACK };
        cell.color = base.lerp(color, color.a).with_alpha(1.0);
        cell.covered = true;
    }

    pub fn draw<W: Write>(&mut self, writer: &mut W) -> std::io::Result<()> {
        if self.dirty {
            self.repaint();
        }
        for y in 0..self.height {
            writer.queue(cursor::MoveTo(0, y as u16))?;
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                if cell.covered {
                    writer.queue(SetForegroundColor(terminal_color(cell.color)))?;
                    writer.queue(Print(ramp_char(cell.color)))?;
                } else {
                    writer.queue(Print(' '))?;
                }
            }
        }
        writer.queue(cursor::MoveTo(0, self.height as u16))?;
        writer.queue(ResetColor)?;
        let status: String = self.status.chars().take(self.width).collect();
        writer.queue(Print(format!("{status:<width$}", width = self.width)))?;
        Ok(())
    }

    #[cfg(test)]
    fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.width + x]
    }
}

impl DrawingSurface for TerminalSurface {
    fn add_layer(&mut self) -> LayerId {
        self.layers.push(PolygonBatch::default());
        LayerId(self.layers.len() - 1)
    }

    fn replace_polygons(&mut self, layer: LayerId, batch: &PolygonBatch) {
        match self.layers.get_mut(layer.0) {
            Some(slot) => {
                slot.clone_from(batch);
                self.dirty = true;
            }
            None => log::warn!("ignoring polygons for unknown layer {layer:?}"),
        }
    }
}

impl InteractionSurface for TerminalSurface {
    fn set_extent(&mut self, extent: f32) {
        self.extent = extent;
        self.dirty = true;
    }

    fn set_status(&mut self, status: &str) {
        self.status.clear();
        self.status.push_str(status);
    }

    fn request_redraw(&mut self) {
        self.dirty = true;
    }
}

fn terminal_color(color: Color) -> style::Color {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    style::Color::Rgb {
        r: channel(color.r),
        g: channel(color.g),
        b: channel(color.b),
    }
}

/// Ramp character for a color's brightness; covered cells never map to blank
fn ramp_char(color: Color) -> char {
    let last = LUMINOSITY_RAMP.len() - 1;
    let index = (color.luminance().clamp(0.0, 1.0) * last as f32).round() as usize;
    LUMINOSITY_RAMP[index.clamp(1, last)]
}

/// Liang-Barsky clip of a segment to `[0, width] x [0, height]`, in f64 so
/// that far off-grid endpoints keep their on-grid precision
fn clip_segment(from: Point2<f32>, to: Point2<f32>, width: f32, height: f32) -> Option<(Point2<f32>, Point2<f32>)> {
    let (x0, y0) = (from.x as f64, from.y as f64);
    let (dx, dy) = (to.x as f64 - x0, to.y as f64 - y0);
    if ![x0, y0, dx, dy].iter().all(|c| c.is_finite()) {
        return None;
    }
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, x0), (dx, width as f64 - x0), (-dy, y0), (dy, height as f64 - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }
    let at = |t: f64| Point2::new((x0 + dx * t) as f32, (y0 + dy * t) as f32);
    (t0 <= t1).then(|| (at(t0), at(t1)))
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: Point2<f32>, v1: Point2<f32>, v2: Point2<f32>, p: Point2<f32>) -> Option<(f32, f32, f32)> {
    let denom = (v1.y - v2.y) * (v0.x - v2.x) + (v2.x - v1.x) * (v0.y - v2.y);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.y - v2.y) * (p.x - v2.x) + (v2.x - v1.x) * (p.y - v2.y)) / denom;
    let w1 = ((v2.y - v0.y) * (p.x - v2.x) + (v0.x - v2.x) * (p.y - v2.y)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(half: f32, fill: Color) -> Polygon {
        Polygon {
            points: vec![
                Point2::new(-half, -half),
                Point2::new(half, -half),
                Point2::new(half, half),
                Point2::new(-half, half),
            ],
            fill,
            edge: Color::TRANSPARENT,
            line_width: 0.0,
        }
    }

    fn batch(polygons: Vec<Polygon>) -> PolygonBatch {
        PolygonBatch {
            polygons,
            antialiased: false,
        }
    }

    #[test]
    fn test_cell_mapping_round_trip() {
        let surface = TerminalSurface::new(80, 41);
        let p = surface.cell_to_view(40, 20);
        let cell = surface.to_cell(&p);
        assert_relative_eq!(cell.x, 40.5, epsilon = 1e-4);
        assert_relative_eq!(cell.y, 20.5, epsilon = 1e-4);

        // Top-left of the visible square
        let corner = surface.to_cell(&Point2::new(-1.0, 1.0));
        assert_relative_eq!(corner.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(corner.y, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn test_later_polygons_paint_over_earlier_ones() {
        let mut surface = TerminalSurface::new(40, 21);
        let layer = surface.add_layer();
        let red = Color::rgb(1.0, 0.0, 0.0);
        let blue = Color::rgb(0.0, 0.0, 1.0);
        surface.replace_polygons(layer, &batch(vec![square(1.0, red), square(0.25, blue)]));
        surface.repaint();

        assert_eq!(surface.cell(20, 10).color, blue);
        assert_eq!(surface.cell(2, 1).color, red);
        assert!(!surface.is_dirty());
    }

    #[test]
    fn test_fill_alpha_blends() {
        let mut surface = TerminalSurface::new(40, 21);
        let layer = surface.add_layer();
        surface.replace_polygons(
            layer,
            &batch(vec![square(1.0, Color::WHITE), square(1.0, Color::rgba(0.0, 0.0, 0.0, 0.5))]),
        );
        surface.repaint();
        let cell = surface.cell(20, 10);
        assert_relative_eq!(cell.color.r, 0.5);
        assert_eq!(cell.color.a, 1.0);
    }

    #[test]
    fn test_far_off_grid_edge_is_clipped() {
        let mut surface = TerminalSurface::new(20, 11);
        surface.draw_line(Point2::new(-1.0e9, 5.5), Point2::new(1.0e9, 5.5), Color::WHITE);
        assert!((0..20).all(|x| surface.cell(x, 5).covered));
        assert_eq!(surface.cells.iter().filter(|c| c.covered).count(), 20);

        assert_eq!(clip_segment(Point2::new(-5.0, -5.0), Point2::new(-1.0, 30.0), 20.0, 10.0), None);
        let (a, b) = clip_segment(Point2::new(10.0, -10.0), Point2::new(10.0, 30.0), 20.0, 10.0).unwrap();
        assert_relative_eq!(a.y, 0.0);
        assert_relative_eq!(b.y, 10.0);
    }

    #[test]
    fn test_edges_only_with_line_width() {
        let mut surface = TerminalSurface::new(40, 21);
        let layer = surface.add_layer();
        let mut outline = square(0.5, Color::TRANSPARENT);
        outline.edge = Color::WHITE;
        surface.replace_polygons(layer, &batch(vec![outline.clone()]));
        surface.repaint();
        assert!(!surface.cells.iter().any(|c| c.covered));

        outline.line_width = 1.0;
        surface.replace_polygons(layer, &batch(vec![outline]));
        surface.repaint();
        assert!(surface.cell(10, 5).covered);
        assert!(!surface.cell(20, 10).covered);
    }

    #[test]
    fn test_draw_writes_status_line() {
        let mut surface = TerminalSurface::new(20, 6);
        surface.set_status("Θ : 1.0, ɸ: 2.0");
        let mut out = Vec::new();
        surface.draw(&mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Θ : 1.0, ɸ: 2.0"));
    }

    #[test]
    fn test_ramp_never_blank_for_covered_cells() {
        assert_eq!(ramp_char(Color::BLACK), '.');
        assert_eq!(ramp_char(Color::WHITE), '@');
    }
}
