/// Vertex projection and screen-space orientation utilities
use nalgebra::{Matrix4, Point2, Point3, Vector3, Vector4};

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Orthographic,
    Perspective,
}

/// Smallest |w| accepted by the perspective divide.
///
/// Points crossing the eye plane are not clipped; their w is clamped to this
/// value (sign preserved) so the divide never faults.
pub const W_EPSILON: f32 = 1e-6;

/// Apply `matrix` to every point and divide by the resulting w.
///
/// Returns normalized device coordinates, one per input point.
pub fn transform_points(points: &[Point3<f32>], matrix: &Matrix4<f32>) -> Vec<Point3<f32>> {
    let mut clamped = 0usize;
    let projected = points
        .iter()
        .map(|p| {
            let clip = matrix * Vector4::new(p.x, p.y, p.z, 1.0);
            let mut w = clip.w;
            if w.abs() < W_EPSILON {
                clamped += 1;
                w = if w < 0.0 { -W_EPSILON } else { W_EPSILON };
            }
            Point3::new(clip.x / w, clip.y / w, clip.z / w)
        })
        .collect();

    if clamped > 0 {
        log::warn!("clamped w for {clamped} of {} projected points", points.len());
    }
    projected
}

/// Which side of a projected face is visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Front,
    Back,
}

/// Classify a projected polygon from the winding of its screen-space outline.
///
/// Uses the shoelace sum `Σ (x₂ - x₁)(y₂ + y₁)`, which is negative for a
/// counter-clockwise outline. Faces wound counter-clockwise when seen from
/// outside therefore come out as [`Facing::Front`].
pub fn facing(polygon: &[Point2<f32>]) -> Facing {
    let n = polygon.len();
    let mut sum = 0.0f32;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        sum += (b.x - a.x) * (b.y + a.y);
    }
    if sum < 0.0 {
        Facing::Front
    } else {
        Facing::Back
    }
}

/// Classify a batch of projected polygons, one result per polygon.
pub fn frontback(polygons: &[Vec<Point3<f32>>]) -> Vec<Facing> {
    polygons
        .iter()
        .map(|polygon| {
            let outline: Vec<Point2<f32>> = polygon.iter().map(|p| p.xy()).collect();
            facing(&outline)
        })
        .collect()
}

/// Rescale and re-center `points` in place so their bounding box is centered
/// on the origin with a largest extent of 1.
pub fn fit_unit_cube(points: &mut [Point3<f32>]) {
    let Some(first) = points.first().copied() else {
        return;
    };
    let (min, max) = points.iter().fold((first, first), |(min, max), p| {
        (min.inf(p), max.sup(p))
    });
    let extent = max - min;
    let scale = extent.x.max(extent.y).max(extent.z);
    if scale <= 0.0 {
        return;
    }
    let center = nalgebra::center(&min, &max);
    for p in points.iter_mut() {
        *p = Point3::from((*p - center) / scale);
    }
}

/// Normalize a vector, leaving zero vectors untouched
pub fn normalize(v: Vector3<f32>) -> Vector3<f32> {
    v / (1e-16 + v.norm())
}
