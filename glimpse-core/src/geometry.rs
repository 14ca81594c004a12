/// Mesh buffers handed to the renderer
///
/// A [`MeshData`] is the flat, indexed representation of one drawable
/// surface: interleaving-free arrays of positions, optional normals, optional
/// texture coordinates and a triangle index list. It is validated once at
/// construction and immutable afterwards.
use crate::error::MeshError;
use crate::vector::{Vector2, Vector3};

/// Indexed triangle mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshData {
    positions: Vec<f32>,
    normals: Vec<f32>,
    tex_coords: Vec<f32>,
    indices: Vec<u32>,
}

impl MeshData {
    /// Build a mesh, checking buffer sizes and index bounds.
    ///
    /// `normals` and `tex_coords` may be empty; otherwise they must hold
    /// exactly 3 and 2 floats per vertex.
    pub fn new(
        positions: Vec<f32>,
        normals: Vec<f32>,
        tex_coords: Vec<f32>,
        indices: Vec<u32>,
    ) -> Result<Self, MeshError> {
        if positions.len() % 3 != 0 {
            return Err(MeshError::PositionLength(positions.len()));
        }
        let vertex_count = positions.len() / 3;

        if !normals.is_empty() && normals.len() != vertex_count * 3 {
            return Err(MeshError::NormalLength {
                found: normals.len(),
                expected: vertex_count * 3,
            });
        }
        if !tex_coords.is_empty() && tex_coords.len() != vertex_count * 2 {
            return Err(MeshError::TexCoordLength {
                found: tex_coords.len(),
                expected: vertex_count * 2,
            });
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }
        if let Some((at, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, &index)| index as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                at,
                vertex_count,
            });
        }

        Ok(Self {
            positions,
            normals,
            tex_coords,
            indices,
        })
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn tex_coords(&self) -> &[f32] {
        &self.tex_coords
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Number of indices, the element count of an indexed draw call
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn has_tex_coords(&self) -> bool {
        !self.tex_coords.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Position of vertex `i`; panics when out of range like slice indexing
    pub fn position(&self, i: usize) -> Vector3 {
        let p = &self.positions[i * 3..i * 3 + 3];
        Vector3::new(p[0], p[1], p[2])
    }

    pub fn normal(&self, i: usize) -> Option<Vector3> {
        self.normals
            .get(i * 3..i * 3 + 3)
            .map(|n| Vector3::new(n[0], n[1], n[2]))
    }

    pub fn tex_coord(&self, i: usize) -> Option<Vector2> {
        self.tex_coords
            .get(i * 2..i * 2 + 2)
            .map(|t| Vector2::new(t[0], t[1]))
    }

    /// Iterate over the triangles of the index buffer
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            let indices = [tri[0], tri[1], tri[2]];
            Triangle {
                indices,
                vertices: indices.map(|i| self.position(i as usize)),
            }
        })
    }

    /// Total area of all triangles
    pub fn surface_area(&self) -> f32 {
        self.triangles().map(|triangle| triangle.area()).sum()
    }

    /// Axis-aligned bounding box as `(min, max)`, `None` for a mesh without vertices
    pub fn bounds(&self) -> Option<(Vector3, Vector3)> {
        let mut points = (0..self.vertex_count()).map(|i| self.position(i));
        let first = points.next()?;
        Some(points.fold((first, first), |(min, max), p| {
            (
                Vector3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                Vector3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
            )
        }))
    }

    /// Unit quad in the XY plane spanning `[-1, 1]`, facing +Z
    pub fn quad() -> Self {
        Self::square(-1.0, 1.0)
    }

    /// Unit quad in the XY plane spanning `[0, 1]` with its origin at the
    /// bottom-left corner, used for glyph billboards
    pub fn text_quad() -> Self {
        Self::square(0.0, 1.0)
    }

    //  A ---- D
    //  |      |
    //  B ---- C
    fn square(min: f32, max: f32) -> Self {
        Self {
            positions: vec![
                min, max, 0.0, // A
                min, min, 0.0, // B
                max, min, 0.0, // C
                max, max, 0.0, // D
            ],
            normals: [0.0, 0.0, 1.0].repeat(4),
            // texture origin is the lower-left corner
            tex_coords: vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0],
            indices: vec![0, 1, 3, 3, 1, 2],
        }
    }

    /// Axis-aligned cube centered on the origin with flat per-face normals
    pub fn cube(size: f32) -> Self {
        let half = size / 2.0;
        // outward normal plus two edge axes with u x v == normal, so the
        // corners below wind counter-clockwise seen from outside
        let faces = [
            (Vector3::Z, Vector3::X, Vector3::Y),
            (-Vector3::Z, Vector3::Y, Vector3::X),
            (Vector3::Y, Vector3::Z, Vector3::X),
            (-Vector3::Y, Vector3::X, Vector3::Z),
            (Vector3::X, Vector3::Y, Vector3::Z),
            (-Vector3::X, Vector3::Z, Vector3::Y),
        ];

        let mut positions = Vec::with_capacity(6 * 4 * 3);
        let mut normals = Vec::with_capacity(6 * 4 * 3);
        let mut tex_coords = Vec::with_capacity(6 * 4 * 2);
        let mut indices = Vec::with_capacity(6 * 6);

        for (face, (normal, u, v)) in faces.into_iter().enumerate() {
            let center = normal * half;
            let corners = [
                (center - u * half - v * half, [0.0, 0.0]),
                (center + u * half - v * half, [1.0, 0.0]),
                (center + u * half + v * half, [1.0, 1.0]),
                (center - u * half + v * half, [0.0, 1.0]),
            ];
            for (corner, uv) in corners {
                positions.extend_from_slice(&corner.to_array());
                normals.extend_from_slice(&normal.to_array());
                tex_coords.extend_from_slice(&uv);
            }
            let base = face as u32 * 4;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            positions,
            normals,
            tex_coords,
            indices,
        }
    }
}

/// One triangle of a mesh: its vertex indices and positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub indices: [u32; 3],
    pub vertices: [Vector3; 3],
}

impl Triangle {
    /// Face normal from the counter-clockwise winding; NaN for degenerate triangles
    pub fn calculate_normal(&self) -> Vector3 {
        let [v0, v1, v2] = self.vertices;
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        edge1.cross(edge2).normalize()
    }

    pub fn area(&self) -> f32 {
        let [v0, v1, v2] = self.vertices;
        (v1 - v0).cross(v2 - v0).magnitude() / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn triangle() -> MeshData {
        MeshData::new(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            vec![0, 1, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = triangle();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(!mesh.has_normals());
        assert!(mesh.has_tex_coords());
        assert_eq!(mesh.position(1), Vector3::X);
        assert_eq!(mesh.normal(1), None);
        assert_eq!(mesh.tex_coord(2), Some(Vector2::new(0.0, 1.0)));
    }

    #[test]
    fn test_rejects_bad_buffers() {
        assert_eq!(
            MeshData::new(vec![0.0; 4], vec![], vec![], vec![]),
            Err(MeshError::PositionLength(4))
        );
        assert_eq!(
            MeshData::new(vec![0.0; 9], vec![0.0; 6], vec![], vec![0, 1, 2]),
            Err(MeshError::NormalLength { found: 6, expected: 9 })
        );
        assert_eq!(
            MeshData::new(vec![0.0; 9], vec![], vec![0.0; 5], vec![0, 1, 2]),
            Err(MeshError::TexCoordLength { found: 5, expected: 6 })
        );
        assert_eq!(
            MeshData::new(vec![0.0; 9], vec![], vec![], vec![0, 1]),
            Err(MeshError::IndexCount(2))
        );
        assert_eq!(
            MeshData::new(vec![0.0; 9], vec![], vec![], vec![0, 1, 3]),
            Err(MeshError::IndexOutOfRange {
                index: 3,
                at: 2,
                vertex_count: 3
            })
        );
    }

    #[test]
    fn test_triangle_normal() {
        let mesh = triangle();
        let tri = mesh.triangles().next().unwrap();
        assert_eq!(tri.indices, [0, 1, 2]);
        assert_abs_diff_eq!(tri.calculate_normal(), Vector3::Z);
        assert_abs_diff_eq!(tri.area(), 0.5);
    }

    #[test]
    fn test_quad_faces_forward() {
        for quad in [MeshData::quad(), MeshData::text_quad()] {
            assert_eq!(quad.vertex_count(), 4);
            assert_eq!(quad.triangle_count(), 2);
            for tri in quad.triangles() {
                assert_abs_diff_eq!(tri.calculate_normal(), Vector3::Z);
            }
        }
        let (min, max) = MeshData::text_quad().bounds().unwrap();
        assert_eq!(min, Vector3::ZERO);
        assert_eq!(max, Vector3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_cube_winding_matches_normals() {
        let cube = MeshData::cube(2.0);
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
        for tri in cube.triangles() {
            let face_normal = tri.calculate_normal();
            for &i in &tri.indices {
                assert_abs_diff_eq!(cube.normal(i as usize).unwrap(), face_normal);
            }
            // outward: the normal points away from the origin
            assert!(face_normal.dot(tri.vertices[0]) > 0.0);
        }
        let (min, max) = cube.bounds().unwrap();
        assert_eq!(min, Vector3::splat(-1.0));
        assert_eq!(max, Vector3::splat(1.0));
        assert_abs_diff_eq!(cube.surface_area(), 24.0, epsilon = 1e-5);
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = MeshData::default();
        assert!(mesh.is_empty());
        assert_eq!(mesh.bounds(), None);
        assert_eq!(mesh.triangles().count(), 0);
        assert_eq!(mesh.surface_area(), 0.0);
    }
}
