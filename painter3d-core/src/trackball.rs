/// Virtual trackball mapping 2D drags to 3D rotations
use nalgebra::{Matrix4, Point3, Unit, UnitQuaternion, Vector3};

/// Radius of the virtual sphere in interaction-area units
const TRACKBALL_SIZE: f32 = 0.8;

/// Number of drags between two renormalizations of the orientation
const RENORM_COUNT: u32 = 97;

/// Arcball-style rotation tracker.
///
/// Pointer positions live in the interaction area, conventionally
/// [-1, 1] x [-1, 1]. Each position is lifted onto a sphere of radius
/// [`TRACKBALL_SIZE`] near the center and onto a hyperbolic sheet further out,
/// which keeps the rotation stable near the silhouette.
#[derive(Debug, Clone)]
pub struct Trackball {
    rotation: UnitQuaternion<f32>,
    count: u32,
}

impl Trackball {
    /// Orientation seeded by a rotation of `theta` degrees about the vertical
    /// (z) axis followed by `phi` degrees about the horizontal (x) axis.
    pub fn new(theta: f32, phi: f32) -> Self {
        let vertical = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), theta.to_radians());
        let horizontal = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), phi.to_radians());
        Self {
            rotation: horizontal * vertical,
            count: 0,
        }
    }

    /// Current orientation as a quaternion
    pub fn rotation(&self) -> &UnitQuaternion<f32> {
        &self.rotation
    }

    /// Current orientation as a 4x4 rotation matrix
    pub fn model(&self) -> Matrix4<f32> {
        self.rotation.to_homogeneous()
    }

    /// Angle about the vertical axis, in degrees
    pub fn theta(&self) -> f32 {
        let m = self.rotation.to_rotation_matrix();
        (-m[(0, 1)]).atan2(m[(0, 0)]).to_degrees()
    }

    /// Angle about the horizontal axis, in degrees
    pub fn phi(&self) -> f32 {
        let m = self.rotation.to_rotation_matrix();
        (-m[(1, 2)]).atan2(m[(2, 2)]).to_degrees()
    }

    /// Rotate for a pointer that moved by (dx, dy) and is now at (x, y).
    ///
    /// The drag runs from (x - dx, y - dy) to (x, y); zero motion leaves the
    /// orientation untouched.
    pub fn drag_to(&mut self, x: f32, y: f32, dx: f32, dy: f32) {
        let Some(delta) = Self::drag_rotation(x - dx, y - dy, x, y) else {
            return;
        };
        self.rotation = delta * self.rotation;

        self.count += 1;
        if self.count > RENORM_COUNT {
            self.rotation.renormalize();
            self.count = 0;
        }
        log::trace!("trackball drag to ({x:.3}, {y:.3}), theta {:.1} phi {:.1}", self.theta(), self.phi());
    }

    /// Rotation taking the lifted `from` point onto the lifted `to` point
    fn drag_rotation(x0: f32, y0: f32, x1: f32, y1: f32) -> Option<UnitQuaternion<f32>> {
        if x0 == x1 && y0 == y1 {
            return None;
        }
        let last = lift(x0, y0);
        let new = lift(x1, y1);
        let axis = Unit::try_new(last.coords.cross(&new.coords), 1e-12)?;
        let t = ((new - last).norm() / (2.0 * TRACKBALL_SIZE)).clamp(-1.0, 1.0);
        Some(UnitQuaternion::from_axis_angle(&axis, 2.0 * t.asin()))
    }
}

impl Default for Trackball {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Lift a 2D point onto the trackball surface (Bell's sphere/hyperbola mix)
fn lift(x: f32, y: f32) -> Point3<f32> {
    let r = TRACKBALL_SIZE;
    let d = (x * x + y * y).sqrt();
    let z = if d < r * std::f32::consts::FRAC_1_SQRT_2 {
        (r * r - d * d).sqrt()
    } else {
        let t = r * std::f32::consts::FRAC_1_SQRT_2;
        t * t / d
    };
    Point3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Transform;
    use approx::assert_relative_eq;

    #[test]
    fn test_seed_angles_match_matrix_builders() {
        let trackball = Trackball::new(45.0, 35.0);
        let expected = Transform::xrotate(35.0) * Transform::zrotate(45.0);
        assert_relative_eq!(trackball.model(), expected, epsilon = 1e-6);
        assert_relative_eq!(trackball.theta(), 45.0, epsilon = 1e-3);
        assert_relative_eq!(trackball.phi(), 35.0, epsilon = 1e-3);
    }

    #[test]
    fn test_zero_motion_is_noop() {
        let mut trackball = Trackball::new(30.0, -20.0);
        let before = trackball.model();
        trackball.drag_to(0.3, -0.2, 0.0, 0.0);
        assert_eq!(trackball.model(), before);
    }

    #[test]
    fn test_drag_then_reverse_drag_restores_orientation() {
        let mut trackball = Trackball::new(65.0, 40.0);
        let before = trackball.model();

        let (x, y, dx, dy) = (0.1, -0.25, 0.2, 0.15);
        trackball.drag_to(x, y, dx, dy);
        assert!((trackball.model() - before).norm() > 1e-3);

        // Pointer goes back to where it came from.
        trackball.drag_to(x - dx, y - dy, -dx, -dy);
        assert_relative_eq!(trackball.model(), before, epsilon = 1e-5);
    }

    #[test]
    fn test_reverse_drag_outside_sphere() {
        let mut trackball = Trackball::default();
        let before = trackball.model();
        trackball.drag_to(0.9, 0.8, 0.1, 0.05);
        trackball.drag_to(0.8, 0.75, -0.1, -0.05);
        assert_relative_eq!(trackball.model(), before, epsilon = 1e-5);
    }

    #[test]
    fn test_horizontal_drag_spins_about_vertical_screen_axis() {
        let mut trackball = Trackball::default();
        trackball.drag_to(0.1, 0.0, 0.1, 0.0);
        let axis = trackball.rotation().axis().unwrap();
        assert_relative_eq!(axis.into_inner(), Vector3::y(), epsilon = 1e-5);
        // Dragging right carries the front of the object to the right.
        let front = trackball.rotation() * Point3::new(0.0, 0.0, 1.0);
        assert!(front.x > 0.0);
    }

    #[test]
    fn test_many_drags_stay_unit() {
        let mut trackball = Trackball::new(10.0, 10.0);
        for i in 0..250 {
            let x = (i as f32 * 0.01).sin() * 0.5;
            trackball.drag_to(x, 0.2, 0.01, -0.005);
        }
        assert_relative_eq!(trackball.rotation().quaternion().norm(), 1.0, epsilon = 1e-5);
    }
}
