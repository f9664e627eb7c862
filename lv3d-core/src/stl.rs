/// STL file parser for binary and ASCII formats
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};
use tracing::debug;

use crate::error::MeshError;
use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
/// Normal, three vertices and the attribute byte count.
const FACET_LEN: usize = 50;

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, MeshError> {
    if data.len() < HEADER_LEN + 4 {
        return Err(MeshError::TooSmall(data.len()));
    }

    let body = &data[HEADER_LEN..];
    let (facets, declared) = le_u32::<_, nom::error::Error<&[u8]>>(body)
        .map_err(|_| MeshError::TooSmall(data.len()))?;
    let declared = declared as usize;
    let available = facets.len() / FACET_LEN;
    if available < declared {
        return Err(MeshError::Truncated {
            declared,
            available,
        });
    }

    let (_, triangles) =
        count(binary_facet, declared)(facets).map_err(|_| MeshError::Truncated {
            declared,
            available,
        })?;

    debug!(triangles = triangles.len(), "parsed binary STL");
    Ok(Mesh { triangles })
}

fn binary_vector3(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x, y, z]))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, normal) = binary_vector3(input)?;
    let (input, (a, b, c)) = tuple((binary_vector3, binary_vector3, binary_vector3))(input)?;
    // Attribute byte count, unused
    let (input, _) = le_u16(input)?;
    Ok((input, facet_triangle(normal, [a, b, c])))
}

/// Builds a triangle, recomputing the normal when the file stores a zero one.
fn facet_triangle(normal: [f32; 3], corners: [[f32; 3]; 3]) -> Triangle {
    let [a, b, c] = corners.map(|[x, y, z]| Vertex::new(x, y, z, normal[0], normal[1], normal[2]));
    let mut triangle = Triangle::new(a, b, c);
    if normal == [0.0; 3] {
        let n = triangle.calculate_normal();
        for v in &mut triangle.vertices {
            v.normal = n;
        }
    }
    triangle
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, MeshError> {
    match parse_ascii_stl_impl(input) {
        Ok((_, mesh)) => {
            debug!(triangles = mesh.len(), "parsed ASCII STL");
            Ok(mesh)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            Err(MeshError::MalformedAscii(snippet(e.input)))
        }
        Err(nom::Err::Incomplete(_)) => Err(MeshError::MalformedAscii(String::new())),
    }
}

fn snippet(input: &str) -> String {
    input.trim_start().chars().take(32).collect()
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    // Optional name
    let (input, _) = not_line_ending(input)?;
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    let (input, _) = not_line_ending(input)?;

    Ok((input, Mesh { triangles }))
}

fn parse_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, facet_triangle(normal, [v1, v2, v3])))
}

fn parse_vertex(input: &str) -> IResult<&str, [f32; 3]> {
    preceded(preceded(multispace0, tag("vertex")), parse_vector3)(input)
}

fn parse_vector3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, [x, y, z]))
}

/// Detect and parse STL file (binary or ASCII)
///
/// Binary files whose header happens to start with `solid` are common, so a
/// failed ASCII parse falls back to binary. The ASCII error is reported only
/// when the binary parse fails as well.
pub fn parse_stl(data: &[u8]) -> Result<Mesh, MeshError> {
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            let ascii_err = match parse_ascii_stl(text) {
                Ok(mesh) => return Ok(mesh),
                Err(e) => e,
            };
            return parse_binary_stl(data).map_err(|_| ascii_err);
        }
    }

    parse_binary_stl(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_binary(header: &[u8], mesh: &Mesh) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data[..header.len()].copy_from_slice(header);
        data.extend_from_slice(&(mesh.len() as u32).to_le_bytes());
        for triangle in &mesh.triangles {
            let n = triangle.vertices[0].normal;
            for value in [n.x, n.y, n.z] {
                data.extend_from_slice(&value.to_le_bytes());
            }
            for v in &triangle.vertices {
                for value in [v.position.x, v.position.y, v.position.z] {
                    data.extend_from_slice(&value.to_le_bytes());
                }
            }
            data.extend_from_slice(&0u16.to_le_bytes());
        }
        data
    }

    const ASCII_TRIANGLE: &str = "solid tri
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid tri
";

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 0);
    }

    #[test]
    fn test_binary_cube() {
        let cube = Mesh::cube(2.0);
        let data = write_binary(b"cube", &cube);
        assert_eq!(data.len(), 84 + 12 * FACET_LEN);
        assert_eq!(parse_stl(&data).unwrap(), cube);
    }

    #[test]
    fn test_too_small() {
        assert_eq!(parse_binary_stl(&[0u8; 20]), Err(MeshError::TooSmall(20)));
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = write_binary(b"", &Mesh::cube(1.0));
        data.truncate(84 + 5 * FACET_LEN + 7);
        assert_eq!(
            parse_binary_stl(&data),
            Err(MeshError::Truncated {
                declared: 12,
                available: 5
            })
        );
    }

    #[test]
    fn test_binary_header_starting_with_solid() {
        let cube = Mesh::cube(1.0);
        let data = write_binary(b"solid but actually binary", &cube);
        assert_eq!(parse_stl(&data).unwrap().len(), 12);
    }

    #[test]
    fn test_ascii_with_name() {
        let mesh = parse_stl(ASCII_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.len(), 1);
        let t = &mesh.triangles[0];
        assert_eq!(t.vertices[1].position.x, 1.0);
        assert_eq!(t.vertices[2].normal.z, 1.0);
    }

    #[test]
    fn test_zero_normal_is_recomputed() {
        let text = ASCII_TRIANGLE.replace("normal 0 0 1", "normal 0 0 0");
        let mesh = parse_ascii_stl(&text).unwrap();
        for v in &mesh.triangles[0].vertices {
            assert_eq!(v.normal.z, 1.0);
        }
    }

    #[test]
    fn test_malformed_ascii() {
        let text = ASCII_TRIANGLE.replace("vertex 1 0 0", "vertex 1 zero 0");
        match parse_ascii_stl(&text) {
            Err(MeshError::MalformedAscii(near)) => assert!(!near.is_empty()),
            other => panic!("expected MalformedAscii, got {other:?}"),
        }
    }
}
