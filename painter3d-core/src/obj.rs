/// Wavefront OBJ parser (geometry only)
use nom::{
    bytes::complete::{is_not, tag},
    character::complete::{i64 as integer, space0, space1},
    combinator::{all_consuming, opt},
    multi::separated_list1,
    number::complete::float,
    sequence::{preceded, terminated, tuple},
    IResult,
};
use nalgebra::Point3;

use crate::error::{GeometryError, Result};
use crate::geometry::Mesh;

const FORMAT: &str = "OBJ";

/// Parse the `v` and `f` records of an OBJ document.
///
/// Face references may be `v`, `v/vt`, `v//vn` or `v/vt/vn`; only the vertex
/// index is kept and negative indices count back from the latest vertex.
/// When faces of different arity are mixed, every face is fan-triangulated.
pub fn parse_obj(input: &str) -> Result<Mesh> {
    let mut vertices = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();

    for (number, raw) in input.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let fail = |what: &str| GeometryError::parse(FORMAT, format!("line {}: {what}: {line:?}", number + 1));

        if let Ok((_, (x, y, z))) = vertex_record(line) {
            vertices.push(Point3::new(x, y, z));
        } else if let Ok((_, refs)) = face_record(line) {
            let face = refs
                .into_iter()
                .map(|r| resolve_index(r, vertices.len()))
                .collect::<Option<Vec<usize>>>()
                .ok_or_else(|| fail("bad vertex reference"))?;
            if face.len() < 3 {
                return Err(GeometryError::DegenerateFace(face.len()));
            }
            faces.push(face);
        } else if line.starts_with("v ") || line.starts_with("f ") {
            return Err(fail("malformed record"));
        } else {
            log::trace!("obj: skipping line {}", number + 1);
        }
    }

    let mixed = faces.windows(2).any(|pair| pair[0].len() != pair[1].len());
    if mixed {
        log::debug!("obj: mixed face arity, triangulating {} faces", faces.len());
        faces = faces.iter().flat_map(|face| fan(face)).collect();
    }
    log::debug!("obj: {} vertices, {} faces", vertices.len(), faces.len());
    Mesh::new(vertices, faces)
}

/// Read and parse an OBJ file
pub fn load_obj(path: impl AsRef<std::path::Path>) -> Result<Mesh> {
    let text = std::fs::read_to_string(path)?;
    parse_obj(&text)
}

fn vertex_record(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let coordinate = || preceded(space1, float);
    all_consuming(terminated(
        preceded(tag("v"), tuple((coordinate(), coordinate(), coordinate()))),
        // Optional w component
        tuple((opt(preceded(space1, float)), space0)),
    ))(input)
}

fn face_record(input: &str) -> IResult<&str, Vec<i64>> {
    all_consuming(terminated(
        preceded(tuple((tag("f"), space1)), separated_list1(space1, face_reference)),
        space0,
    ))(input)
}

/// `v[/vt][/vn]`, keeping only `v`
fn face_reference(input: &str) -> IResult<&str, i64> {
    terminated(integer, opt(preceded(tag("/"), is_not(" \t"))))(input)
}

/// 1-based or negative (relative) reference to a 0-based index
fn resolve_index(reference: i64, vertex_count: usize) -> Option<usize> {
    let count = i64::try_from(vertex_count).ok()?;
    let index = match reference {
        0 => return None,
        r if r > 0 => r - 1,
        r => count + r,
    };
    if (0..count).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

/// Triangles sharing the first vertex of `face`
fn fan(face: &[usize]) -> Vec<Vec<usize>> {
    face.windows(2)
        .skip(1)
        .map(|pair| vec![face[0], pair[0], pair[1]])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const QUAD: &str = "# a unit square\n\
        o square\n\
        v 0 0 0\n\
        v 1 0 0\n\
        v 1 1 0 1.0\n\
        v 0 1 0\n\
        vn 0 0 1\n\
        f 1//1 2//1 3//1 4//1\n";

    #[test]
    fn test_parse_quad() {
        let mesh = parse_obj(QUAD).unwrap();
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2, 3]]);
        assert_relative_eq!(mesh.vertices[2], Point3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_negative_and_textured_references() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf -3/1 -2/2/2 -1/3\n";
        let mesh = parse_obj(text).unwrap();
        assert_eq!(mesh.faces, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_mixed_arity_is_triangulated() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0.5 2 0\nf 1 2 3 4\nf 4 3 5\n";
        let mesh = parse_obj(text).unwrap();
        assert_eq!(mesh.arity(), 3);
        assert_eq!(mesh.faces, vec![vec![0, 1, 2], vec![0, 2, 3], vec![3, 2, 4]]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n"),
            Err(GeometryError::Parse { .. })
        ));
        assert!(matches!(parse_obj("v 0 0\n"), Err(GeometryError::Parse { .. })));
        assert!(matches!(
            parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\n"),
            Err(GeometryError::DegenerateFace(2))
        ));
        assert!(matches!(parse_obj("v 0 0 0\nf 0 1 1\n"), Err(GeometryError::Parse { .. })));
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(1, 3), Some(0));
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(-4, 3), None);
        assert_eq!(resolve_index(4, 3), None);
    }
}
