/// STL file parser for binary and ASCII formats
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};
use nalgebra::Point3;

use crate::error::{GeometryError, Result};
use crate::geometry::Mesh;

type Facet = [Point3<f32>; 3];

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh> {
    if data.len() < 84 {
        return Err(GeometryError::parse("STL", "file too small to be a valid STL"));
    }

    let (_, facets) = binary_stl(data).map_err(|_| GeometryError::parse("STL", "unexpected end of file"))?;
    Ok(mesh_from_facets(facets))
}

fn binary_stl(input: &[u8]) -> IResult<&[u8], Vec<Facet>> {
    // 80-byte header, then the triangle count
    let (input, _) = take(80usize)(input)?;
    let (input, triangle_count) = le_u32(input)?;
    count(binary_facet, triangle_count as usize)(input)
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Facet> {
    let point = || tuple((le_f32, le_f32, le_f32));
    // Stored normals are ignored; winding defines the facing.
    let (input, _normal) = point()(input)?;
    let (input, (a, b, c)) = tuple((point(), point(), point()))(input)?;
    let (input, _attributes) = le_u16(input)?;
    Ok((input, [a, b, c].map(|(x, y, z)| Point3::new(x, y, z))))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh> {
    match ascii_stl(input) {
        Ok((_, facets)) => Ok(mesh_from_facets(facets)),
        Err(e) => Err(GeometryError::parse("STL", format!("{e:?}"))),
    }
}

fn ascii_stl(input: &str) -> IResult<&str, Vec<Facet>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, facets) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, facets))
}

fn parse_facet(input: &str) -> IResult<&str, Facet> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, [v1, v2, v3]))
}

fn parse_vertex(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, (x, y, z)) = parse_vector3(input)?;
    Ok((input, Point3::new(x, y, z)))
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// Three fresh vertices per triangle
fn mesh_from_facets(facets: Vec<Facet>) -> Mesh {
    let faces = (0..facets.len()).map(|t| vec![3 * t, 3 * t + 1, 3 * t + 2]).collect();
    let vertices = facets.into_iter().flatten().collect();
    Mesh { vertices, faces }
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh> {
    // Binary files may also start with "solid", so fall back on failure.
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            match parse_ascii_stl(text) {
                Ok(mesh) => return Ok(mesh),
                Err(e) => log::debug!("not an ASCII STL, trying binary: {e}"),
            }
        }
    }

    parse_binary_stl(data)
}

/// Read and parse an STL file
pub fn load_stl(path: impl AsRef<std::path::Path>) -> Result<Mesh> {
    let data = std::fs::read(path)?;
    let mesh = parse_stl(&data)?;
    log::debug!("stl: {} triangles", mesh.face_count());
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn binary(triangles: &[[f32; 9]]) -> Vec<u8> {
        let mut data = vec![0u8; 80];
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for triangle in triangles {
            data.extend_from_slice(&[0u8; 12]);
            for value in triangle {
                data.extend_from_slice(&value.to_le_bytes());
            }
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        // Set triangle count to 0
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let result = parse_binary_stl(&data);
        assert!(result.is_ok());
        let mesh = result.unwrap();
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn test_parse_binary_triangles() {
        let data = binary(&[
            [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0, 1.0, 1.0],
        ]);
        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.faces, vec![vec![0, 1, 2], vec![3, 4, 5]]);
        assert_relative_eq!(mesh.vertices[4], Point3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = binary(&[[0.0; 9]]);
        data.truncate(100);
        assert!(matches!(parse_binary_stl(&data), Err(GeometryError::Parse { .. })));
        assert!(parse_binary_stl(&[0u8; 10]).is_err());
    }

    #[test]
    fn test_parse_ascii_with_name() {
        let text = "solid tetra piece\n\
            facet normal 0 0 -1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 0 1 0\n\
                vertex 1 0 0\n\
              endloop\n\
            endfacet\n\
            endsolid tetra piece\n";
        let mesh = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_relative_eq!(mesh.vertices[1], Point3::new(0.0, 1.0, 0.0));
    }
}
