/// 4x4 homogeneous matrix builders
///
/// All builders take their arguments in the usual OpenGL conventions and
/// return row-major `Matrix4<f32>` values, so `projection * view * model`
/// composes right to left.
use nalgebra::{Matrix4, Vector3};

/// Matrix builders for model, view and projection transforms
pub struct Transform;

impl Transform {
    /// Translation by (x, y, z)
    pub fn translate(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Non-uniform scaling along the three axes
    pub fn scale(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z))
    }

    /// Uniform scaling
    pub fn uniform_scale(s: f32) -> Matrix4<f32> {
        Self::scale(s, s, s)
    }

    /// Rotation about the X axis, in degrees
    pub fn xrotate(degrees: f32) -> Matrix4<f32> {
        let (s, c) = degrees.to_radians().sin_cos();
        Matrix4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, c, -s, 0.0,
            0.0, s, c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation about the Y axis, in degrees
    pub fn yrotate(degrees: f32) -> Matrix4<f32> {
        let (s, c) = degrees.to_radians().sin_cos();
        Matrix4::new(
            c, 0.0, s, 0.0,
            0.0, 1.0, 0.0, 0.0,
            -s, 0.0, c, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Rotation about the Z axis, in degrees
    pub fn zrotate(degrees: f32) -> Matrix4<f32> {
        let (s, c) = degrees.to_radians().sin_cos();
        Matrix4::new(
            c, -s, 0.0, 0.0,
            s, c, 0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Generic perspective frustum.
    ///
    /// The near plane (`z = -znear` in eye space) lands on NDC depth -1 and
    /// the far plane on +1.
    pub fn frustum(left: f32, right: f32, bottom: f32, top: f32, znear: f32, zfar: f32) -> Matrix4<f32> {
        let width = right - left;
        let height = top - bottom;
        let depth = zfar - znear;
        Matrix4::new(
            2.0 * znear / width, 0.0, (right + left) / width, 0.0,
            0.0, 2.0 * znear / height, (top + bottom) / height, 0.0,
            0.0, 0.0, -(zfar + znear) / depth, -2.0 * znear * zfar / depth,
            0.0, 0.0, -1.0, 0.0,
        )
    }

    /// Symmetric perspective projection with a vertical field of view in degrees
    pub fn perspective(fovy: f32, aspect: f32, znear: f32, zfar: f32) -> Matrix4<f32> {
        let h = (0.5 * fovy.to_radians()).tan() * znear;
        let w = h * aspect;
        Self::frustum(-w, w, -h, h, znear, zfar)
    }

    /// Orthographic projection
    pub fn ortho(left: f32, right: f32, bottom: f32, top: f32, znear: f32, zfar: f32) -> Matrix4<f32> {
        let width = right - left;
        let height = top - bottom;
        let depth = zfar - znear;
        Matrix4::new(
            2.0 / width, 0.0, 0.0, -(right + left) / width,
            0.0, 2.0 / height, 0.0, -(top + bottom) / height,
            0.0, 0.0, -2.0 / depth, -(zfar + znear) / depth,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Maps normalized device coordinates onto a `w x h` window with depth range `d`
    pub fn viewport(x: f32, y: f32, w: f32, h: f32, d: f32) -> Matrix4<f32> {
        Matrix4::new(
            w / 2.0, 0.0, 0.0, x + w / 2.0,
            0.0, h / 2.0, 0.0, y + h / 2.0,
            0.0, 0.0, d / 2.0, d / 2.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(
        model: &Matrix4<f32>,
        view: &Matrix4<f32>,
        projection: &Matrix4<f32>,
    ) -> Matrix4<f32> {
        projection * view * model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector4};

    fn apply(m: &Matrix4<f32>, x: f32, y: f32, z: f32) -> Point3<f32> {
        let v = m * Vector4::new(x, y, z, 1.0);
        Point3::new(v.x / v.w, v.y / v.w, v.z / v.w)
    }

    #[test]
    fn test_translate_and_scale() {
        let m = Transform::translate(1.0, 2.0, 3.0) * Transform::uniform_scale(2.0);
        assert_relative_eq!(apply(&m, 1.0, 1.0, 1.0), Point3::new(3.0, 4.0, 5.0));
    }

    #[test]
    fn test_rotations_are_right_handed() {
        let p = apply(&Transform::zrotate(90.0), 1.0, 0.0, 0.0);
        assert_relative_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-6);

        let p = apply(&Transform::xrotate(90.0), 0.0, 1.0, 0.0);
        assert_relative_eq!(p, Point3::new(0.0, 0.0, 1.0), epsilon = 1e-6);

        let p = apply(&Transform::yrotate(90.0), 0.0, 0.0, 1.0);
        assert_relative_eq!(p, Point3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_ortho_depth_extremes() {
        let m = Transform::ortho(-1.0, 1.0, -1.0, 1.0, 1.0, 100.0);
        assert_relative_eq!(apply(&m, 0.0, 0.0, -1.0).z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(apply(&m, 0.0, 0.0, -100.0).z, 1.0, epsilon = 1e-5);

        let center = apply(&m, 0.0, 0.0, -50.5);
        assert_relative_eq!(center.x, 0.0);
        assert_relative_eq!(center.y, 0.0);
    }

    #[test]
    fn test_perspective_depth_extremes() {
        let m = Transform::perspective(35.0, 1.0, 1.0, 100.0);
        assert_relative_eq!(apply(&m, 0.0, 0.0, -1.0).z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(apply(&m, 0.0, 0.0, -100.0).z, 1.0, epsilon = 1e-4);

        let center = apply(&m, 0.0, 0.0, -50.5);
        assert_relative_eq!(center.x, 0.0);
        assert_relative_eq!(center.y, 0.0);
    }

    #[test]
    fn test_off_center_frustum_is_centered_on_its_axis() {
        let m = Transform::frustum(0.0, 2.0, 1.0, 3.0, 1.0, 10.0);
        // The frustum axis passes through (1, 2) on the near plane.
        let p = apply(&m, 1.0, 2.0, -1.0);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_viewport_maps_ndc_corners() {
        let m = Transform::viewport(0.0, 0.0, 800.0, 600.0, 1.0);
        assert_relative_eq!(apply(&m, -1.0, -1.0, -1.0), Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(apply(&m, 1.0, 1.0, 1.0), Point3::new(800.0, 600.0, 1.0));
    }

    #[test]
    fn test_mvp_order() {
        let model = Transform::uniform_scale(2.0);
        let view = Transform::translate(0.0, 0.0, -3.0);
        let projection = Matrix4::identity();
        let mvp = Transform::mvp_matrix(&model, &view, &projection);
        assert_relative_eq!(apply(&mvp, 0.0, 0.0, 1.0), Point3::new(0.0, 0.0, -1.0));
    }
}
