/// Per-face ambient, diffuse and specular shading
use nalgebra::{Point3, Vector3};

use crate::color::Color;
use crate::error::Result;
use crate::geometry::{validate_faces, Mesh};
use crate::projection::normalize;

/// A point light with ambient, diffuse and specular terms.
///
/// `direction` is the light position relative to the scene origin; each face
/// is lit along the ray from that position to the face center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub direction: Vector3<f32>,
    pub ambient: Color,
    pub ambient_strength: f32,
    pub diffuse: Color,
    pub diffuse_strength: f32,
    pub specular: Color,
    /// Exponent of the specular term; 0 disables it
    pub shininess: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            direction: Vector3::new(1.0, 1.0, 1.0),
            ambient: Color::rgb(1.0, 0.0, 0.0),
            ambient_strength: 0.2,
            diffuse: Color::WHITE,
            diffuse_strength: 0.8,
            specular: Color::WHITE,
            shininess: 0.0,
        }
    }
}

impl Light {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn direction(mut self, direction: Vector3<f32>) -> Self {
        self.direction = direction;
        self
    }

    pub fn ambient(mut self, color: Color, strength: f32) -> Self {
        self.ambient = color;
        self.ambient_strength = strength;
        self
    }

    pub fn diffuse(mut self, color: Color, strength: f32) -> Self {
        self.diffuse = color;
        self.diffuse_strength = strength;
        self
    }

    pub fn specular(mut self, color: Color, shininess: f32) -> Self {
        self.specular = color;
        self.shininess = shininess;
        self
    }
}

/// Unit normal of the plane through the first three points, pointing to the
/// side from which they appear counter-clockwise
pub fn face_normal(points: &[Point3<f32>]) -> Vector3<f32> {
    match points {
        [a, b, c, ..] => normalize((b - a).cross(&(c - a))),
        _ => Vector3::zeros(),
    }
}

/// Diffuse factor in [0, 1] of a face lit from `direction`
pub fn diffuse(points: &[Point3<f32>], direction: &Vector3<f32>) -> f32 {
    if points.is_empty() {
        return 0.0;
    }
    let center = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / points.len() as f32;
    let ray = normalize(center - direction);
    (-face_normal(points).dot(&ray)).clamp(0.0, 1.0)
}

/// Color of one face under `light`
pub fn shade_polygon(points: &[Point3<f32>], light: &Light) -> Color {
    let diffuse = diffuse(points, &light.direction);
    let specular = if light.shininess > 0.0 {
        diffuse.powf(light.shininess)
    } else {
        0.0
    };
    let channel = |ambient: f32, lit: f32, shine: f32| {
        (ambient * light.ambient_strength + diffuse * lit * light.diffuse_strength + specular * shine).min(1.0)
    };
    Color::rgb(
        channel(light.ambient.r, light.diffuse.r, light.specular.r),
        channel(light.ambient.g, light.diffuse.g, light.specular.g),
        channel(light.ambient.b, light.diffuse.b, light.specular.b),
    )
}

pub fn shade_triangles(triangles: &[[Point3<f32>; 3]], light: &Light) -> Vec<Color> {
    triangles.iter().map(|t| shade_polygon(t, light)).collect()
}

/// One color per face of `mesh`, from the face's first three vertices
pub fn shade_mesh(mesh: &Mesh, light: &Light) -> Result<Vec<Color>> {
    validate_faces(&mesh.faces, mesh.vertices.len())?;
    let colors: Vec<Color> = mesh
        .faces
        .iter()
        .map(|face| {
            let points: Vec<Point3<f32>> = face.iter().take(3).map(|&i| mesh.vertices[i]).collect();
            shade_polygon(&points, light)
        })
        .collect();
    log::debug!("shaded {} faces", colors.len());
    Ok(colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use approx::assert_relative_eq;

    fn unit_square() -> Vec<Point3<f32>> {
        vec![
            Point3::new(-0.5, -0.5, 0.0),
            Point3::new(0.5, -0.5, 0.0),
            Point3::new(0.5, 0.5, 0.0),
            Point3::new(-0.5, 0.5, 0.0),
        ]
    }

    #[test]
    fn test_face_normal_follows_winding() {
        let square = unit_square();
        assert_relative_eq!(face_normal(&square), Vector3::z());
        let reversed: Vec<_> = square.iter().rev().copied().collect();
        assert_relative_eq!(face_normal(&reversed), -Vector3::z());
    }

    #[test]
    fn test_diffuse_facing_and_grazing() {
        let square = unit_square();
        let normal = face_normal(&square);
        assert_relative_eq!(diffuse(&square, &normal), 1.0);
        assert_relative_eq!(diffuse(&square, &(normal * 4.0)), 1.0);
        assert_relative_eq!(diffuse(&square, &Vector3::x()), 0.0, epsilon = 1e-6);
        assert_relative_eq!(diffuse(&square, &-normal), 0.0);
    }

    #[test]
    fn test_shading_terms() {
        let square = unit_square();
        let lit = Light::new().direction(Vector3::z());

        let color = shade_polygon(&square, &lit);
        assert_relative_eq!(color.r, 1.0);
        assert_relative_eq!(color.g, 0.8);
        assert_relative_eq!(color.b, 0.8);
        assert_eq!(color.a, 1.0);

        let dark = shade_polygon(&square, &lit.direction(-Vector3::z()));
        assert_relative_eq!(dark.r, 0.2);
        assert_relative_eq!(dark.g, 0.0);

        let shiny = Light::new()
            .direction(Vector3::z())
            .ambient(Color::BLACK, 0.0)
            .diffuse(Color::WHITE, 0.0)
            .specular(Color::rgb(0.5, 0.5, 0.5), 8.0);
        assert_relative_eq!(shade_polygon(&square, &shiny).r, 0.5);
    }

    #[test]
    fn test_shade_mesh_lights_cube_top() {
        let cube = Mesh::cube(2.0);
        let colors = shade_mesh(&cube, &Light::new().direction(Vector3::new(0.0, 0.0, 10.0))).unwrap();
        assert_eq!(colors.len(), 6);
        // Top is lit almost head-on, bottom faces away.
        assert_relative_eq!(colors[0].g, 0.8, epsilon = 1e-2);
        assert_relative_eq!(colors[5].g, 0.0);

        let triangles = [[Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)]];
        assert_eq!(shade_triangles(&triangles, &Light::new()).len(), 1);
    }

    #[test]
    fn test_shade_mesh_rejects_dangling_index() {
        let mesh = Mesh {
            vertices: unit_square(),
            faces: vec![vec![0, 1, 7]],
        };
        assert!(matches!(
            shade_mesh(&mesh, &Light::new()),
            Err(GeometryError::IndexOutOfRange { index: 7, .. })
        ));
    }
}
