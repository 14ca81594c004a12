/// Procedural flat terrain
///
/// Generates a square grid in the XZ plane, `size` units on a side and
/// `slices` vertices per side, starting at the origin and extending towards
/// +X and +Z. Translate the model matrix to center it.
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::geometry::MeshData;

pub const DEFAULT_SIZE: f32 = 800.0;
pub const DEFAULT_SLICES: u32 = 128;
/// Upper bound on slices per side (16.7M vertices)
pub const MAX_SLICES: u32 = 4096;

/// Terrain dimensions as read from configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    pub size: f32,
    pub slices: u32,
}

impl TerrainParams {
    pub fn generate(&self) -> Result<MeshData, TerrainError> {
        generate(self.size, self.slices)
    }
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            slices: DEFAULT_SLICES,
        }
    }
}

/// Build a flat grid mesh with `slices * slices` vertices.
///
/// Vertex `(i, j)` (row `i` along Z, column `j` along X) sits at
/// `(j / (slices - 1) * size, 0, i / (slices - 1) * size)` with normal +Y and
/// texture coordinate `(j, i)`, so a repeating texture tiles once per cell.
pub fn generate(size: f32, slices: u32) -> Result<MeshData, TerrainError> {
    if slices < 2 {
        return Err(TerrainError::TooFewSlices(slices));
    }
    if !size.is_finite() || size <= 0.0 {
        return Err(TerrainError::InvalidSize(size));
    }
    if slices > MAX_SLICES {
        return Err(TerrainError::TooManySlices(slices));
    }

    let count = slices as usize * slices as usize;
    let cells = (slices - 1) as usize;
    let mut positions = buffer(count * 3, slices)?;
    let mut normals = buffer(count * 3, slices)?;
    let mut tex_coords = buffer(count * 2, slices)?;
    let mut indices = buffer(cells * cells * 6, slices)?;

    let step = size / (slices - 1) as f32;
    for i in 0..slices {
        for j in 0..slices {
            positions.extend_from_slice(&[j as f32 * step, 0.0, i as f32 * step]);
            normals.extend_from_slice(&[0.0, 1.0, 0.0]);
            tex_coords.extend_from_slice(&[j as f32, i as f32]);
        }
    }

    for i in 0..slices - 1 {
        for j in 0..slices - 1 {
            let top_left = i * slices + j;
            let top_right = top_left + 1;
            let bottom_left = (i + 1) * slices + j;
            let bottom_right = bottom_left + 1;
            indices.extend_from_slice(&[
                top_left,
                bottom_left,
                top_right,
                top_right,
                bottom_left,
                bottom_right,
            ]);
        }
    }

    log::debug!(
        "generated terrain: size {size}, {slices}x{slices} vertices, {} indices",
        indices.len()
    );

    Ok(MeshData::new(positions, normals, tex_coords, indices)?)
}

fn buffer<T>(len: usize, slices: u32) -> Result<Vec<T>, TerrainError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| TerrainError::OutOfMemory(slices))?;
    Ok(buffer)
}
