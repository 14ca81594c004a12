/// Wavefront OBJ parser for triangulated meshes
///
/// Supports the subset produced by common exporters with "triangulate faces"
/// enabled: `v`, `vt`, `vn` and three-corner `f` statements in the forms
/// `p`, `p/t`, `p//n` and `p/t/n`. Every other directive (`o`, `g`, `s`,
/// `usemtl`, `mtllib`, ...) is skipped.
///
/// The position index of each face corner is the vertex index in the output
/// mesh. Texture coordinates and normals are copied into the row of that
/// position, so a position shared by corners with different normals keeps
/// the last one written.
use std::path::Path;

use nom::{
    bytes::complete::take_till1,
    character::complete::{char, i64 as integer, space0, space1},
    combinator::{all_consuming, opt},
    multi::many1,
    number::complete::float,
    sequence::{pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::ObjError;
use crate::geometry::MeshData;

/// One vertex reference of a face, with raw (1-based or negative) indices
#[derive(Debug, Clone, Copy, PartialEq)]
struct Corner {
    position: i64,
    tex_coord: Option<i64>,
    normal: Option<i64>,
}

#[derive(Debug, PartialEq)]
enum Statement<'a> {
    Position([f32; 3]),
    TexCoord([f32; 2]),
    Normal([f32; 3]),
    Face(Vec<Corner>),
    Ignored(&'a str),
}

/// A face waiting for pass 2, with the list sizes seen when it was read so
/// negative indices resolve against the right end
struct PendingFace {
    line: usize,
    corners: Vec<Corner>,
    positions_seen: usize,
    tex_coords_seen: usize,
    normals_seen: usize,
}

/// Load and parse an OBJ file from disk
pub fn load_obj(path: impl AsRef<Path>) -> Result<MeshData, ObjError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| ObjError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_obj(&source, &path.display().to_string())
}

/// Parse OBJ text; `name` identifies the source in errors and logs
pub fn parse_obj(source: &str, name: &str) -> Result<MeshData, ObjError> {
    let malformed = |line: usize, reason: String| ObjError::Malformed {
        file: name.to_string(),
        line,
        reason,
    };

    // Pass 1: collect vertex data, buffer faces
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut normals: Vec<[f32; 3]> = Vec::new();
    let mut faces: Vec<PendingFace> = Vec::new();

    for (line_index, raw) in source.lines().enumerate() {
        let line = line_index + 1;
        let content = raw.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        match statement(content).map_err(|reason| malformed(line, reason))? {
            Statement::Position(p) => positions.push(p),
            Statement::TexCoord(t) => tex_coords.push(t),
            Statement::Normal(n) => normals.push(n),
            Statement::Face(corners) => faces.push(PendingFace {
                line,
                corners,
                positions_seen: positions.len(),
                tex_coords_seen: tex_coords.len(),
                normals_seen: normals.len(),
            }),
            Statement::Ignored(keyword) => {
                log::trace!("{name}:{line}: ignoring `{keyword}` statement");
            }
        }
    }

    if faces.is_empty() {
        return Err(ObjError::NoFaces {
            file: name.to_string(),
        });
    }

    // Pass 2: resolve indices, position index is the master
    let vertex_count = positions.len();
    let mut out_tex_coords = vec![0.0f32; vertex_count * 2];
    let mut out_normals = vec![0.0f32; vertex_count * 3];
    let mut has_tex_coords = false;
    let mut has_normals = false;
    let mut indices = Vec::with_capacity(faces.len() * 3);

    for face in &faces {
        if face.corners.len() != 3 {
            return Err(malformed(
                face.line,
                format!(
                    "face has {} vertices, only triangles are supported",
                    face.corners.len()
                ),
            ));
        }

        for corner in &face.corners {
            let resolve = |kind: &'static str, index: i64, seen: usize, total: usize| {
                resolve_index(index, seen, total).ok_or_else(|| ObjError::IndexOutOfRange {
                    file: name.to_string(),
                    line: face.line,
                    kind,
                    index,
                    count: if index < 0 { seen } else { total },
                })
            };

            let p = resolve("position", corner.position, face.positions_seen, vertex_count)?;

            if let Some(t) = corner.tex_coord {
                let t = resolve("texture", t, face.tex_coords_seen, tex_coords.len())?;
                out_tex_coords[p * 2..p * 2 + 2].copy_from_slice(&tex_coords[t]);
                has_tex_coords = true;
            }
            if let Some(n) = corner.normal {
                let n = resolve("normal", n, face.normals_seen, normals.len())?;
                out_normals[p * 3..p * 3 + 3].copy_from_slice(&normals[n]);
                has_normals = true;
            }

            let index = u32::try_from(p).map_err(|_| {
                malformed(face.line, format!("vertex index {p} exceeds the u32 range"))
            })?;
            indices.push(index);
        }
    }

    if !has_tex_coords {
        out_tex_coords.clear();
    }
    if !has_normals {
        out_normals.clear();
    }

    let mesh = MeshData::new(
        positions.into_iter().flatten().collect(),
        out_normals,
        out_tex_coords,
        indices,
    )
    .map_err(|source| ObjError::Mesh {
        file: name.to_string(),
        source,
    })?;

    log::debug!(
        "loaded {name}: {} vertices, {} indices (normals: {has_normals}, texture coordinates: {has_tex_coords})",
        mesh.vertex_count(),
        mesh.index_count()
    );
    Ok(mesh)
}

/// Map a 1-based or negative (relative to `seen`) OBJ index to a 0-based one
fn resolve_index(index: i64, seen: usize, total: usize) -> Option<usize> {
    if index > 0 {
        let i = usize::try_from(index - 1).ok()?;
        (i < total).then_some(i)
    } else if index < 0 {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        seen.checked_sub(back)
    } else {
        None
    }
}

fn statement(line: &str) -> Result<Statement<'_>, String> {
    let (rest, keyword) = keyword(line).map_err(|_| format!("cannot read `{line}`"))?;
    match keyword {
        "v" => complete(vertex4, rest, "expected `v x y z [w]`")
            .and_then(finite)
            .map(Statement::Position),
        "vt" => complete(tex_coord, rest, "expected `vt u v [w]`")
            .and_then(finite)
            .map(Statement::TexCoord),
        "vn" => complete(vector3, rest, "expected `vn x y z`")
            .and_then(finite)
            .map(Statement::Normal),
        "f" => complete(
            face,
            rest,
            "expected `f` followed by `p`, `p/t`, `p//n` or `p/t/n` corners",
        )
        .map(Statement::Face),
        other => Ok(Statement::Ignored(other)),
    }
}

/// Run `parser` over the rest of the statement, which it must consume entirely
fn complete<'a, T>(
    parser: impl FnMut(&'a str) -> IResult<&'a str, T>,
    input: &'a str,
    expected: &str,
) -> Result<T, String> {
    all_consuming(terminated(parser, space0))(input)
        .map(|(_, value)| value)
        .map_err(|_| expected.to_string())
}

fn finite<const N: usize>(values: [f32; N]) -> Result<[f32; N], String> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(values)
    } else {
        Err(format!("non-finite number in {values:?}"))
    }
}

fn keyword(input: &str) -> IResult<&str, &str> {
    take_till1(|c: char| c.is_whitespace())(input)
}

fn number(input: &str) -> IResult<&str, f32> {
    preceded(space1, float)(input)
}

fn vector3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, (x, y, z)) = tuple((number, number, number))(input)?;
    Ok((input, [x, y, z]))
}

fn vertex4(input: &str) -> IResult<&str, [f32; 3]> {
    // optional homogeneous weight is accepted and dropped
    terminated(vector3, opt(number))(input)
}

fn tex_coord(input: &str) -> IResult<&str, [f32; 2]> {
    let (input, (u, v, _w)) = tuple((number, number, opt(number)))(input)?;
    Ok((input, [u, v]))
}

fn corner(input: &str) -> IResult<&str, Corner> {
    let (input, position) = integer(input)?;
    let (input, rest) = opt(preceded(
        char('/'),
        pair(opt(integer), opt(preceded(char('/'), integer))),
    ))(input)?;
    let (tex_coord, normal) = rest.unwrap_or((None, None));
    Ok((
        input,
        Corner {
            position,
            tex_coord,
            normal,
        },
    ))
}

fn face(input: &str) -> IResult<&str, Vec<Corner>> {
    many1(preceded(space1, corner))(input)
}
